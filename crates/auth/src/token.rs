//! Token codec: issues and verifies signed, stateless identity tokens.
//!
//! Tokens are compact HS256 JWS strings (`header.payload.signature`). The
//! payload is [`TokenClaims`]; tampering with any segment breaks the MAC.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use messagely_core::Username;

use crate::TokenClaims;

/// Signing material for the token codec.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
}

impl TokenConfig {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn secret(&self) -> &[u8] {
        &self.secret
    }
}

impl core::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Missing, malformed, or signature-mismatched token.
    #[error("invalid token: {reason}")]
    InvalidToken { reason: String },

    #[error("token encoding failed: {0}")]
    Encode(String),
}

impl TokenError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidToken {
            reason: reason.into(),
        }
    }

    pub fn is_invalid_token(&self) -> bool {
        matches!(self, Self::InvalidToken { .. })
    }
}

/// Creates and verifies identity tokens against one shared secret.
///
/// Pure: no IO, no clock reads.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    pub fn new(config: &TokenConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Tokens are issued without expiry; see `TokenClaims`.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            encoding: EncodingKey::from_secret(config.secret()),
            decoding: DecodingKey::from_secret(config.secret()),
            validation,
        }
    }

    /// Sign a token for `username`.
    pub fn issue(&self, username: &Username) -> Result<String, TokenError> {
        let claims = TokenClaims::new(username.as_str());
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encode(e.to_string()))
    }

    /// Verify a possibly-absent token and return the username it carries.
    pub fn verify(&self, token: Option<&str>) -> Result<Username, TokenError> {
        match token {
            Some(token) => self.verify_str(token),
            None => Err(TokenError::invalid("no token presented")),
        }
    }

    pub fn verify_str(&self, token: &str) -> Result<Username, TokenError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(TokenError::invalid("empty token"));
        }

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| TokenError::invalid(e.to_string()))?;

        Username::parse(data.claims.username).map_err(|e| TokenError::invalid(e.to_string()))
    }
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}
