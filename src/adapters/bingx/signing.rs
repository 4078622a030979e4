//! BingX request signing
//!
//! Private endpoints take a `signature` parameter: hex(HMAC-SHA256(secret, query)),
//! where `query` is the `key=value&...` string with keys in ASCII order and
//! percent-encoded values. The same encoded string goes on the wire.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::adapters::errors::{ExchangeError, ExchangeResult};

type HmacSha256 = Hmac<Sha256>;

/// Build the canonical query string (keys sorted, values percent-encoded)
pub fn build_query(params: &[(&str, String)]) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex HMAC-SHA256 signature of `query`
pub fn sign_query(secret: &str, query: &str) -> ExchangeResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ExchangeError::AuthenticationFailed(format!("invalid secret: {}", e)))?;
    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
