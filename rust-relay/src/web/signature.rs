//! GitHub webhook signature verification.
//!
//! GitHub signs each delivery with HMAC-SHA256 over the raw request body and
//! sends the result in the `X-Hub-Signature-256` header as `sha256=<hex>`.
//! Reference: https://docs.github.com/en/webhooks/using-webhooks/validating-webhook-deliveries

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Name of the header carrying the delivery signature.
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the `X-Hub-Signature-256` value for a body.
///
/// Returns `None` if the secret cannot be used as an HMAC key.
pub fn sign(secret: &str, body: &[u8]) -> Option<String> {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => {
            warn!("github_signature_invalid_key");
            return None;
        }
    };
    mac.update(body);

    Some(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Verify a GitHub webhook signature.
///
/// # Arguments
///
/// * `secret` - The shared webhook secret
/// * `body` - The request body exactly as received
/// * `signature` - The `X-Hub-Signature-256` header value, if any
///
/// # Returns
///
/// `true` only if the header matches the expected signature. Absent or
/// malformed input is a failed verification, never an error.
pub fn verify_signature(secret: &str, body: &[u8], signature: Option<&str>) -> bool {
    let signature = match signature {
        Some(s) if !s.is_empty() => s,
        _ => {
            warn!("github_signature_missing");
            return false;
        }
    };

    if secret.is_empty() {
        warn!("github_signature_no_secret");
        return false;
    }

    if !signature.starts_with(SIGNATURE_PREFIX) {
        warn!(
            signature_length = signature.len(),
            "github_signature_invalid_prefix"
        );
        return false;
    }

    let Some(expected_signature) = sign(secret, body) else {
        return false;
    };

    // Constant-time comparison to prevent timing attacks
    let valid = constant_time_compare(&expected_signature, signature);

    if !valid {
        warn!(
            expected_length = expected_signature.len(),
            actual_length = signature.len(),
            "github_signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn signed(secret: &str, body: &[u8]) -> String {
        sign(secret, body).unwrap()
    }

    #[test]
    fn test_sign_known_vector() {
        // Example delivery from GitHub's documentation
        let signature = signed("It's a Secret to Everybody", b"Hello, World!");
        assert_eq!(
            signature,
            "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17"
        );
    }

    #[test]
    fn test_verify_signature_valid() {
        let secret = "test-secret";
        let bodies: [&[u8]; 4] = [
            b"",
            b"{}",
            br#"{"zen":"Keep it logically awesome."}"#,
            "ünïcode".as_bytes(),
        ];

        for body in bodies {
            let signature = signed(secret, body);
            assert!(verify_signature(secret, body, Some(&signature)));
        }
    }

    #[test]
    fn test_verify_signature_tampered() {
        let secret = "test-secret";
        let body = br#"{"after":"abc123","ref":"refs/heads/main"}"#;
        let signature = signed(secret, body);

        // Flip the last hex digit
        let mut tampered = signature.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == '0' { '1' } else { '0' });
        assert!(!verify_signature(secret, body, Some(&tampered)));

        // Body changed after signing
        assert!(!verify_signature(secret, b"{\"after\":\"abc124\"}", Some(&signature)));

        // Signed with a different secret
        assert!(!verify_signature("other-secret", body, Some(&signature)));

        // Truncated and uppercased
        assert!(!verify_signature(secret, body, Some(&signature[..signature.len() - 2])));
        assert!(!verify_signature(secret, body, Some(&signature.to_uppercase())));
    }

    #[test]
    fn test_verify_signature_missing_fields() {
        let signature = signed("key", b"body");

        assert!(!verify_signature("key", b"body", None));
        assert!(!verify_signature("key", b"body", Some("")));
        assert!(!verify_signature("", b"body", Some(&signature)));
    }

    #[test]
    fn test_verify_signature_malformed() {
        let secret = "key";
        let body = b"body";
        let digest = signed(secret, body)
            .trim_start_matches(SIGNATURE_PREFIX)
            .to_string();

        assert!(!verify_signature(secret, body, Some(&digest)));
        assert!(!verify_signature(secret, body, Some(&format!("sha1={}", digest))));
        assert!(!verify_signature(secret, body, Some("sha256=not-hex")));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }

    /// Replace one hex digit of the digest with a different hex digit.
    fn tamper_digit(signature: &str, index: usize, shift: u32) -> String {
        let mut chars: Vec<char> = signature.chars().collect();
        let position = SIGNATURE_PREFIX.len() + index;
        let digit = chars[position].to_digit(16).unwrap();
        chars[position] = char::from_digit((digit + shift) % 16, 16).unwrap();
        chars.into_iter().collect()
    }

    proptest! {
        /// A body signed with a secret always verifies under that secret.
        #[test]
        fn signed_body_always_verifies(
            secret in "\\PC{1,64}",
            body in prop::collection::vec(any::<u8>(), 0..2048),
        ) {
            let signature = signed(&secret, &body);
            prop_assert!(verify_signature(&secret, &body, Some(&signature)));
        }

        /// Changing any digit of the digest makes verification fail.
        #[test]
        fn tampered_signature_never_verifies(
            secret in "\\PC{1,64}",
            body in prop::collection::vec(any::<u8>(), 0..2048),
            index in 0usize..64,
            shift in 1u32..16,
        ) {
            let tampered = tamper_digit(&signed(&secret, &body), index, shift);
            prop_assert!(!verify_signature(&secret, &body, Some(&tampered)));
        }

        /// Changing any byte of the body invalidates its signature.
        #[test]
        fn tampered_body_never_verifies(
            secret in "\\PC{1,64}",
            body in prop::collection::vec(any::<u8>(), 1..2048),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let signature = signed(&secret, &body);
            let mut tampered = body.clone();
            let position = index.index(tampered.len());
            tampered[position] ^= flip;
            prop_assert!(!verify_signature(&secret, &tampered, Some(&signature)));
        }
    }
}
