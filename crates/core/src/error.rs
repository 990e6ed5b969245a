//! Errors raised while building domain values from untrusted input.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid username: {0}")]
    InvalidUsername(&'static str),

    #[error("invalid message id: {0}")]
    InvalidMessageId(String),
}
