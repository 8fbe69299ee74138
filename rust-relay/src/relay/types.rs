//! Request and response types exchanged with the invoking platform.
//!
//! The platform hands the relay an event carrying the raw body and headers,
//! and expects back an object of the form:
//!
//! ```text
//! {"statusCode": 200, "headers": {"Content-Type": "application/json"}, "body": "{\"message\": \"success\"}"}
//! ```

use std::collections::{BTreeMap, HashMap};
use std::io;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::ser::Formatter;
use serde_json::{json, Value};
use tracing::info;

/// A single webhook delivery as received by the platform.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Request body exactly as received
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub body: String,
    /// Request headers
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub headers: HashMap<String, String>,
}

impl InboundEvent {
    pub fn new(body: impl Into<String>, headers: HashMap<String, String>) -> Self {
        Self {
            body: body.into(),
            headers,
        }
    }

    /// Look up a header by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

fn deserialize_null_default<'de, D, T>(de: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Option::unwrap_or_default)
}

/// Response handed back to the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON document `{"message": ...}`, serialized
    pub body: String,
}

impl ProxyResponse {
    /// Build a response whose body is `{"message": message}`.
    pub fn new(status_code: u16, message: impl Into<Value>) -> Self {
        let message = message.into();
        info!(status_code = status_code, message = %message, "relay_response");

        Self {
            status_code,
            headers: BTreeMap::from([(
                "Content-Type".to_string(),
                "application/json".to_string(),
            )]),
            body: dumps(&json!({ "message": message })),
        }
    }

    /// The `message` field of the body.
    pub fn message(&self) -> Option<Value> {
        serde_json::from_str::<Value>(&self.body)
            .ok()
            .and_then(|mut body| body.get_mut("message").map(Value::take))
    }
}

/// JSON layout of Python's `json.dumps` defaults: `", "` and `": "`
/// separators, non-ASCII escaped as `\uXXXX`.
struct DumpsFormatter;

impl Formatter for DumpsFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut units = [0u16; 2];
        for c in fragment.chars() {
            if c.is_ascii() {
                writer.write_all(&[c as u8])?;
            } else {
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}

fn dumps(value: &Value) -> String {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, DumpsFormatter);
    if value.serialize(&mut ser).is_err() {
        return value.to_string();
    }
    String::from_utf8(out).unwrap_or_else(|_| value.to_string())
}
