//! In-memory store for tests/dev.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use messagely_auth::{Credential, CredentialStore, MessageAccessor, NewCredential, StoreError};
use messagely_core::{
    Message, MessageDetail, MessageId, MessageSummary, ReadReceipt, UserDetail, UserProfile,
    Username,
};

use crate::directory::{MessageBoard, NewMessage, UserDirectory};

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<Username, Credential>,
    messages: BTreeMap<MessageId, Message>,
}

impl State {
    fn profile(&self, username: &Username) -> Result<UserProfile, StoreError> {
        self.users
            .get(username)
            .map(Credential::to_profile)
            .ok_or(StoreError::NotFound)
    }
}

/// Users and messages behind a single lock.
///
/// One lock covers both maps, so a uniqueness check and the insert that
/// follows it happen under the same write guard.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<Credential>, StoreError> {
        Ok(self.read()?.users.get(username).cloned())
    }

    async fn insert(&self, credential: NewCredential) -> Result<Credential, StoreError> {
        let mut state = self.write()?;
        if state.users.contains_key(&credential.username) {
            return Err(StoreError::Duplicate);
        }
        let stored = Credential::from_new(credential);
        state.users.insert(stored.username.clone(), stored.clone());
        Ok(stored)
    }

    async fn touch_last_login(&self, username: &Username) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let credential = state.users.get_mut(username).ok_or(StoreError::NotFound)?;
        credential.last_login_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl MessageAccessor for InMemoryStore {
    async fn fetch_by_id(&self, id: MessageId) -> Result<Message, StoreError> {
        self.read()?
            .messages
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl UserDirectory for InMemoryStore {
    async fn all(&self) -> Result<Vec<UserProfile>, StoreError> {
        Ok(self
            .read()?
            .users
            .values()
            .map(Credential::to_profile)
            .collect())
    }

    async fn get(&self, username: &Username) -> Result<UserDetail, StoreError> {
        self.read()?
            .users
            .get(username)
            .map(Credential::to_detail)
            .ok_or(StoreError::NotFound)
    }

    async fn messages_from(
        &self,
        username: &Username,
    ) -> Result<Vec<MessageSummary>, StoreError> {
        let state = self.read()?;
        state
            .messages
            .values()
            .filter(|m| m.is_sender(username))
            .map(|m| -> Result<MessageSummary, StoreError> {
                Ok(MessageSummary {
                    id: m.id,
                    body: m.body.clone(),
                    sent_at: m.sent_at,
                    read_at: m.read_at,
                    from_user: None,
                    to_user: Some(state.profile(&m.to_username)?),
                })
            })
            .collect()
    }

    async fn messages_to(&self, username: &Username) -> Result<Vec<MessageSummary>, StoreError> {
        let state = self.read()?;
        state
            .messages
            .values()
            .filter(|m| m.is_recipient(username))
            .map(|m| -> Result<MessageSummary, StoreError> {
                Ok(MessageSummary {
                    id: m.id,
                    body: m.body.clone(),
                    sent_at: m.sent_at,
                    read_at: m.read_at,
                    from_user: Some(state.profile(&m.from_username)?),
                    to_user: None,
                })
            })
            .collect()
    }
}

#[async_trait]
impl MessageBoard for InMemoryStore {
    async fn create(&self, message: NewMessage) -> Result<Message, StoreError> {
        let mut state = self.write()?;
        if !state.users.contains_key(&message.from_username)
            || !state.users.contains_key(&message.to_username)
        {
            return Err(StoreError::NotFound);
        }

        let stored = Message {
            id: MessageId::new(),
            from_username: message.from_username,
            to_username: message.to_username,
            body: message.body,
            sent_at: Utc::now(),
            read_at: None,
        };
        state.messages.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn detail(&self, id: MessageId) -> Result<MessageDetail, StoreError> {
        let state = self.read()?;
        let m = state.messages.get(&id).ok_or(StoreError::NotFound)?;
        Ok(MessageDetail {
            id: m.id,
            body: m.body.clone(),
            sent_at: m.sent_at,
            read_at: m.read_at,
            from_user: state.profile(&m.from_username)?,
            to_user: state.profile(&m.to_username)?,
        })
    }

    async fn mark_read(&self, id: MessageId) -> Result<ReadReceipt, StoreError> {
        let mut state = self.write()?;
        let m = state.messages.get_mut(&id).ok_or(StoreError::NotFound)?;
        let read_at = *m.read_at.get_or_insert_with(Utc::now);
        Ok(ReadReceipt { id, read_at })
    }
}
