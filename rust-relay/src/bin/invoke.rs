//! tagrelay invoke - run the relay once on a platform-style event.
//!
//! Usage:
//!
//! ```text
//! tagrelay-invoke [EVENT_FILE]          # event JSON from file or stdin, prints the response
//! tagrelay-invoke --sign [BODY_FILE]    # prints the X-Hub-Signature-256 value for a body
//! ```
//!
//! Logs go to stderr so stdout holds only the result.

use std::io::{self, Read};

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tagrelay::web::sign;
use tagrelay::{Config, InboundEvent, Relay};

enum Mode {
    Invoke(Option<String>),
    Sign(Option<String>),
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Mode> {
    let mut sign = false;
    let mut path = None;

    for arg in args {
        match arg.as_str() {
            "--sign" => sign = true,
            "-" => path = None,
            flag if flag.starts_with("--") => bail!("unknown flag `{}`", flag),
            _ if path.is_some() => bail!("expected at most one input file"),
            _ => path = Some(arg),
        }
    }

    Ok(if sign { Mode::Sign(path) } else { Mode::Invoke(path) })
}

/// Read a file, or stdin when no path is given.
fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read `{}`", path))
        }
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true).with_writer(io::stderr))
        .init();

    match parse_args(std::env::args().skip(1))? {
        Mode::Sign(path) => {
            let secret = std::env::var("SIG_KEY").context("SIG_KEY is not set")?;
            let body = read_input(path.as_deref())?;
            let signature =
                sign(&secret, body.as_bytes()).context("Failed to compute signature")?;
            println!("{}", signature);
        }
        Mode::Invoke(path) => {
            let config = Config::from_env().context("Failed to load configuration")?;
            let relay = Relay::new(&config).context("Failed to create relay")?;

            let input = read_input(path.as_deref())?;
            let event: InboundEvent =
                serde_json::from_str(&input).context("Failed to parse event")?;

            info!(body_length = event.body.len(), "invoke_starting");

            let response = relay.handle(&event).await.context("Relay failed")?;
            println!("{}", serde_json::to_string(&response)?);
        }
    }

    Ok(())
}
