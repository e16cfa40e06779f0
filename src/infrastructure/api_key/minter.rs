//! API key minting
//!
//! Produces opaque bearer tokens from the operating system's secure random
//! source.

use std::fmt::Debug;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::rngs::OsRng;
use rand::RngCore;

use crate::domain::api_key::KEY_PREFIX;
use crate::domain::DomainError;

/// Number of random bytes behind every key
const KEY_BYTES: usize = 32;

/// Length of the encoded random portion (32 bytes, unpadded base64)
pub const KEY_BODY_LEN: usize = 43;

/// Source of secure random bytes
pub trait EntropySource: Send + Sync + Debug {
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand::Error>;
}

/// Operating system CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, dest: &mut [u8]) -> Result<(), rand::Error> {
        OsRng.try_fill_bytes(dest)
    }
}

/// Mints `sk_live_` bearer tokens
#[derive(Debug, Clone)]
pub struct KeyMinter {
    source: Arc<dyn EntropySource>,
}

impl KeyMinter {
    pub fn new() -> Self {
        Self {
            source: Arc::new(OsEntropy),
        }
    }

    /// Use a specific entropy source
    pub fn with_source(source: Arc<dyn EntropySource>) -> Self {
        Self { source }
    }

    /// Mint a new key.
    ///
    /// Fails with `EntropyUnavailable` when the random source cannot be read.
    pub fn generate(&self) -> Result<String, DomainError> {
        let mut random_bytes = [0u8; KEY_BYTES];

        self.source.fill(&mut random_bytes).map_err(|e| {
            DomainError::entropy_unavailable(format!("Secure random source failed: {}", e))
        })?;

        Ok(format!("{}{}", KEY_PREFIX, URL_SAFE_NO_PAD.encode(random_bytes)))
    }

    /// Whether a token has the shape of a minted key
    pub fn is_well_formed(token: &str) -> bool {
        match token.strip_prefix(KEY_PREFIX) {
            Some(body) => {
                body.len() == KEY_BODY_LEN
                    && body
                        .bytes()
                        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
            }
            None => false,
        }
    }
}

impl Default for KeyMinter {
    fn default() -> Self {
        Self::new()
    }
}
