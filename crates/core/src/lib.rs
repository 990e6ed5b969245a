//! `messagely-core` — domain building blocks shared by every layer.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod message;
pub mod user;

pub use error::{DomainError, DomainResult};
pub use id::{MessageId, Username};
pub use message::{Message, MessageDetail, MessageSummary, ReadReceipt};
pub use user::{Profile, UserDetail, UserProfile};
