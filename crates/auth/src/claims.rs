use serde::{Deserialize, Serialize};

/// Identity token claims.
///
/// The token carries exactly one claim: the username it was issued for. There
/// is no `exp`/`iat`, so a token stays valid until the signing secret rotates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub username: String,
}

impl TokenClaims {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
        }
    }
}
