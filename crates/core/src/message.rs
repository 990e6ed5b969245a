//! Message records.
//!
//! Messages are the only resource guarded by relationship checks: the sender
//! and the recipient are the two identities allowed to see one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{MessageId, UserProfile, Username};

/// A stored message, as the authorization layer sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub from_username: Username,
    pub to_username: Username,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_sender(&self, username: &Username) -> bool {
        &self.from_username == username
    }

    pub fn is_recipient(&self, username: &Username) -> bool {
        &self.to_username == username
    }

    pub fn is_participant(&self, username: &Username) -> bool {
        self.is_sender(username) || self.is_recipient(username)
    }
}

/// A message with both parties expanded to their profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDetail {
    pub id: MessageId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub from_user: UserProfile,
    pub to_user: UserProfile,
}

/// A message as listed in a user's inbox or outbox.
///
/// Only the counterparty is expanded: `to_user` for sent messages,
/// `from_user` for received ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSummary {
    pub id: MessageId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_user: Option<UserProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_user: Option<UserProfile>,
}

/// Result of marking a message as read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadReceipt {
    pub id: MessageId,
    pub read_at: DateTime<Utc>,
}
