use base64::engine::{general_purpose, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;
use tracing::debug;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// Signing utilities for outbound notification webhooks.
///
/// Each delivery carries a key id, a unix timestamp, a random nonce and an
/// HMAC-SHA256 signature over the request, so the receiving service can
/// verify origin and reject replays.
pub struct WebhookAuth;

impl WebhookAuth {
    /// Generate a random hex nonce for a delivery
    pub fn generate_nonce() -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Current unix timestamp for the delivery headers
    pub fn get_timestamp() -> i64 {
        Utc::now().timestamp()
    }

    /// Generate the signature for a webhook delivery.
    ///
    /// The string to sign is the method, the signed-header string, the
    /// target URI and the body, newline-joined; the signature is the
    /// base64-encoded HMAC-SHA256 digest.
    pub fn generate_signature(
        secret_id: &str,
        secret_key: &str,
        method: &str,
        uri: &str,
        timestamp: i64,
        nonce: &str,
        body: &str,
    ) -> String {
        let header_string = format!(
            "X-Notify-Key={}&X-Notify-Nonce={}&X-Notify-Timestamp={}",
            secret_id, nonce, timestamp
        );

        let content = format!("{}\n{}\n{}\n{}", method, header_string, uri, body);

        debug!("String to sign: {}", content);

        let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(content.as_bytes());

        general_purpose::STANDARD.encode(mac.finalize().into_bytes())
    }
}
