//! `messagely-auth` — authentication and per-resource authorization.
//!
//! This crate is intentionally decoupled from HTTP and storage: the HTTP layer
//! feeds it raw tokens and route parameters, and storage is reached only
//! through the traits in [`store`].

pub mod claims;
pub mod config;
pub mod credential;
pub mod guard;
pub mod issuance;
pub mod password;
pub mod principal;
pub mod resolve;
pub mod store;
pub mod token;

pub use claims::TokenClaims;
pub use config::AuthConfig;
pub use credential::{Credential, NewCredential};
pub use guard::{Decision, Guard, GuardChain, GuardContext, Rejection, RouteParams};
pub use issuance::{CredentialIssuer, IssuanceError, IssuedToken, Registration};
pub use password::{HashingCost, PasswordError, PasswordHasher};
pub use principal::RequestIdentity;
pub use resolve::resolve_identity;
pub use store::{CredentialStore, MessageAccessor, StoreError};
pub use token::{TokenCodec, TokenConfig, TokenError};
