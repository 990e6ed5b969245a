use crate::{HashingCost, TokenConfig};

/// Explicit configuration for the authentication layer.
///
/// Built once at startup and handed to the token codec and issuance flow;
/// nothing in this crate reads process-wide settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub token: TokenConfig,
    pub hashing: HashingCost,
}

impl AuthConfig {
    pub fn new(secret: impl Into<Vec<u8>>, hashing: HashingCost) -> Self {
        Self {
            token: TokenConfig::new(secret),
            hashing,
        }
    }
}
