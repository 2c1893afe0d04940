//! HMAC-SHA256 request signing.
//!
//! Two canonical forms are supported, one per API generation:
//! - query style: `k=v` pairs sorted by key and joined with `&`
//! - header style: `timestamp + api_key + recv_window + body`

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConfigError;

type HmacSha256 = Hmac<Sha256>;

/// Keyed once at startup, then signs any number of messages.
#[derive(Clone)]
pub struct Signer {
    mac: HmacSha256,
}

impl Signer {
    pub fn new(secret: &str) -> Result<Self, ConfigError> {
        if secret.trim().is_empty() {
            return Err(ConfigError::Missing("exchange.api_secret"));
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| ConfigError::invalid("exchange.api_secret", e.to_string()))?;
        Ok(Self { mac })
    }

    /// Lower-case hex HMAC of `message`.
    pub fn sign(&self, message: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

pub fn canonical_query(params: &BTreeMap<&str, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn canonical_header(timestamp: i64, api_key: &str, recv_window_ms: u64, body: &str) -> String {
    format!("{timestamp}{api_key}{recv_window_ms}{body}")
}
