//! HMAC-SHA256 webhook signature verification.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Verifies a hex-encoded HMAC-SHA256 signature over the raw request body.
///
/// The comparison is constant-time via [`Mac::verify_slice`], so the check
/// leaks no timing information about the expected digest.
///
/// # Errors
///
/// Returns [`WebhookError::SignatureInvalid`] if the signature is not valid
/// hex or does not match.
pub fn verify_signature(secret: &str, body: &[u8], signature_hex: &str) -> Result<(), WebhookError> {
    let provided = hex::decode(signature_hex.trim()).map_err(|_| WebhookError::SignatureInvalid)?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::SignatureInvalid)?;
    mac.update(body);
    mac.verify_slice(&provided)
        .map_err(|_| WebhookError::SignatureInvalid)
}

/// Computes the hex-encoded HMAC-SHA256 signature for a body.
///
/// Used by the seeder and tests to produce valid inbound requests.
#[must_use]
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_secret";

    #[test]
    fn test_valid_signature_verifies() {
        let body = br#"{"event_type":"payment.completed"}"#;
        let signature = sign_payload(SECRET, body);
        assert!(verify_signature(SECRET, body, &signature).is_ok());
    }

    #[test]
    fn test_tampered_body_rejected() {
        let signature = sign_payload(SECRET, b"original body");
        assert!(matches!(
            verify_signature(SECRET, b"tampered body", &signature),
            Err(WebhookError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let body = b"payload";
        let signature = sign_payload("a-different-secret", body);
        assert!(verify_signature(SECRET, body, &signature).is_err());
    }

    #[test]
    fn test_non_hex_signature_rejected() {
        assert!(matches!(
            verify_signature(SECRET, b"payload", "not hex at all"),
            Err(WebhookError::SignatureInvalid)
        ));
    }

    #[test]
    fn test_signature_with_whitespace_is_trimmed() {
        let body = b"payload";
        let signature = format!("  {}\n", sign_payload(SECRET, body));
        assert!(verify_signature(SECRET, body, &signature).is_ok());
    }
}
