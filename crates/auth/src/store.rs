//! Storage seams consumed by the auth layer.
//!
//! Implementations live in `messagely-infra`; this crate only depends on the
//! contracts below.

use async_trait::async_trait;
use thiserror::Error;

use messagely_core::{Message, MessageId, Username};

use crate::{Credential, NewCredential};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The unique key already exists.
    #[error("duplicate identifier")]
    Duplicate,

    #[error("not found")]
    NotFound,

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Credential records keyed by username.
///
/// `insert` must be atomic with respect to the uniqueness check: of any number
/// of concurrent inserts for one username, exactly one succeeds.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_username(&self, username: &Username)
    -> Result<Option<Credential>, StoreError>;

    async fn insert(&self, credential: NewCredential) -> Result<Credential, StoreError>;

    /// Record "now" as the credential's last successful authentication.
    async fn touch_last_login(&self, username: &Username) -> Result<(), StoreError>;
}

/// Read access to messages for relationship checks.
#[async_trait]
pub trait MessageAccessor: Send + Sync {
    async fn fetch_by_id(&self, id: MessageId) -> Result<Message, StoreError>;
}
