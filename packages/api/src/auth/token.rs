//! # Bearer tokens — AES-256-GCM sealed claims
//!
//! A token is `hex(nonce ‖ ciphertext)` where the ciphertext seals a small JSON
//! [`Claims`] document under a server-held 32-byte key. Authenticated
//! encryption means a token cannot be forged or altered without the key, and
//! the expiry travels inside the sealed payload.
//!
//! The key comes from `auth.token_key` (64 hex chars). When that is empty a
//! random key is generated at startup; see [`TokenKey::generate`].

use std::fmt;
use std::time::Duration;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const NONCE_LEN: usize = 12;

#[derive(Debug, Error, PartialEq)]
pub enum TokenError {
    #[error("Token is not valid hex or is too short")]
    Malformed,
    #[error("Token failed authentication")]
    Invalid,
    #[error("Token has expired")]
    Expired,
    #[error("Invalid token key: {0}")]
    Key(String),
}

#[derive(Clone)]
pub struct TokenKey([u8; 32]);

impl TokenKey {
    pub fn from_hex(hex_key: &str) -> Result<Self, TokenError> {
        let bytes = hex::decode(hex_key.trim()).map_err(|e| TokenError::Key(e.to_string()))?;
        if bytes.len() != 32 {
            return Err(TokenError::Key(format!(
                "must be 64 hex chars (32 bytes), got {} bytes",
                bytes.len()
            )));
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes);
        Ok(Self(key))
    }

    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self(key)
    }
}

impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenKey(..)")
    }
}

/// Payload sealed inside a token. Times are unix seconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies tokens for one key.
#[derive(Clone, Debug)]
pub struct Tokens {
    key: TokenKey,
    ttl: Duration,
}

impl Tokens {
    pub fn new(key: TokenKey, ttl: Duration) -> Self {
        Self { key, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.key.0))
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            iat: now,
            exp: now.saturating_add(self.ttl.as_secs().try_into().unwrap_or(i64::MAX)),
        };
        self.seal(&claims)
    }

    fn seal(&self, claims: &Claims) -> Result<String, TokenError> {
        let plaintext = serde_json::to_vec(claims).map_err(|e| TokenError::Key(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher()
            .encrypt(nonce, plaintext.as_slice())
            .map_err(|_| TokenError::Invalid)?;

        let mut sealed = nonce_bytes.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let bytes = hex::decode(token.trim()).map_err(|_| TokenError::Malformed)?;
        if bytes.len() <= NONCE_LEN {
            return Err(TokenError::Malformed);
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plaintext = self
            .cipher()
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| TokenError::Invalid)?;
        let claims: Claims = serde_json::from_slice(&plaintext).map_err(|_| TokenError::Invalid)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }
}
