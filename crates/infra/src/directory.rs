//! Read/write contracts for the user directory and message board.
//!
//! These sit next to the auth-facing `CredentialStore`/`MessageAccessor`
//! traits; a backend implements all four and is used through [`Store`].

use async_trait::async_trait;

use messagely_auth::{CredentialStore, MessageAccessor, StoreError};
use messagely_core::{
    Message, MessageDetail, MessageId, MessageSummary, ReadReceipt, UserDetail, UserProfile,
    Username,
};

/// A message about to be posted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub from_username: Username,
    pub to_username: Username,
    pub body: String,
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Basic info on every user.
    async fn all(&self) -> Result<Vec<UserProfile>, StoreError>;

    /// Full profile; `StoreError::NotFound` when the user does not exist.
    async fn get(&self, username: &Username) -> Result<UserDetail, StoreError>;

    /// Messages sent by `username`, each with the recipient expanded.
    async fn messages_from(&self, username: &Username)
    -> Result<Vec<MessageSummary>, StoreError>;

    /// Messages received by `username`, each with the sender expanded.
    async fn messages_to(&self, username: &Username) -> Result<Vec<MessageSummary>, StoreError>;
}

#[async_trait]
pub trait MessageBoard: Send + Sync {
    /// Post a message; `StoreError::NotFound` when either party is unknown.
    async fn create(&self, message: NewMessage) -> Result<Message, StoreError>;

    async fn detail(&self, id: MessageId) -> Result<MessageDetail, StoreError>;

    /// Mark a message read. Marking twice keeps the first timestamp.
    async fn mark_read(&self, id: MessageId) -> Result<ReadReceipt, StoreError>;
}

/// Everything the API needs from one backend.
pub trait Store: CredentialStore + MessageAccessor + UserDirectory + MessageBoard {}

impl<T> Store for T where T: CredentialStore + MessageAccessor + UserDirectory + MessageBoard {}
