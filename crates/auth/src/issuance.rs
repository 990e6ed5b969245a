//! Credential issuance: register and login, both ending in a fresh token.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use messagely_core::{Profile, Username};

use crate::{
    AuthConfig, CredentialStore, NewCredential, PasswordError, PasswordHasher, StoreError,
    TokenCodec, TokenError,
};

/// Registration input, as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub profile: Profile,
}

/// A token minted for an authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub username: Username,
    pub token: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssuanceError {
    #[error("Missing required inputs")]
    MissingInputs,

    #[error("{0}")]
    InvalidUsername(String),

    #[error("Username already in use")]
    DuplicateIdentifier,

    /// Same wording for unknown users and wrong passwords.
    #[error("Invalid username/password")]
    InvalidCredentials,

    #[error("{0}")]
    Password(#[from] PasswordError),

    #[error("{0}")]
    Token(#[from] TokenError),

    #[error("{0}")]
    Store(StoreError),
}

/// Authenticates or creates credentials and mints tokens for them.
#[derive(Clone)]
pub struct CredentialIssuer {
    store: Arc<dyn CredentialStore>,
    codec: TokenCodec,
    hasher: PasswordHasher,
}

impl CredentialIssuer {
    pub fn new(store: Arc<dyn CredentialStore>, codec: TokenCodec, hasher: PasswordHasher) -> Self {
        Self {
            store,
            codec,
            hasher,
        }
    }

    pub fn from_config(
        store: Arc<dyn CredentialStore>,
        config: &AuthConfig,
    ) -> Result<Self, PasswordError> {
        Ok(Self::new(
            store,
            TokenCodec::new(&config.token),
            PasswordHasher::new(config.hashing)?,
        ))
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Create a credential and log it in.
    ///
    /// The store's uniqueness constraint is authoritative: the lookup below
    /// only saves a hash computation in the common case.
    pub async fn register(&self, registration: Registration) -> Result<IssuedToken, IssuanceError> {
        let Registration {
            username,
            password,
            profile,
        } = registration;

        if is_blank(&username)
            || password.is_empty()
            || is_blank(&profile.first_name)
            || is_blank(&profile.last_name)
            || is_blank(&profile.phone)
        {
            return Err(IssuanceError::MissingInputs);
        }

        let username =
            Username::parse(username).map_err(|e| IssuanceError::InvalidUsername(e.to_string()))?;

        if self
            .store
            .find_by_username(&username)
            .await
            .map_err(IssuanceError::Store)?
            .is_some()
        {
            return Err(IssuanceError::DuplicateIdentifier);
        }

        let password_hash = self.hash(password).await?;

        let credential = self
            .store
            .insert(NewCredential {
                username,
                password_hash,
                profile,
                joined_at: Utc::now(),
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => IssuanceError::DuplicateIdentifier,
                other => IssuanceError::Store(other),
            })?;

        tracing::info!(username = %credential.username, "user registered");
        self.finish_login(credential.username).await
    }

    /// Check a username/password pair and log it in.
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedToken, IssuanceError> {
        if username.is_empty() || password.is_empty() {
            return Err(IssuanceError::MissingInputs);
        }

        let Ok(username) = Username::parse(username) else {
            return Err(IssuanceError::InvalidCredentials);
        };

        let Some(credential) = self
            .store
            .find_by_username(&username)
            .await
            .map_err(IssuanceError::Store)?
        else {
            tracing::info!(username = %username, "login failed");
            return Err(IssuanceError::InvalidCredentials);
        };

        if !self.verify(credential.password_hash, password.to_string()).await? {
            tracing::info!(username = %username, "login failed");
            return Err(IssuanceError::InvalidCredentials);
        }

        self.finish_login(credential.username).await
    }

    async fn finish_login(&self, username: Username) -> Result<IssuedToken, IssuanceError> {
        self.store
            .touch_last_login(&username)
            .await
            .map_err(IssuanceError::Store)?;

        let token = self.codec.issue(&username)?;
        tracing::info!(username = %username, "token issued");
        Ok(IssuedToken { username, token })
    }

    // Argon2 is deliberately slow; keep it off the async workers.
    async fn hash(&self, password: String) -> Result<String, PasswordError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))?
    }

    async fn verify(&self, digest: String, password: String) -> Result<bool, PasswordError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&digest, &password))
            .await
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::{Credential, HashingCost, TokenConfig};

    #[derive(Default)]
    struct MemCredentials {
        inner: Mutex<HashMap<Username, Credential>>,
    }

    impl MemCredentials {
        fn get(&self, username: &str) -> Option<Credential> {
            let username = Username::parse(username).ok()?;
            self.inner.lock().unwrap().get(&username).cloned()
        }
    }

    #[async_trait]
    impl CredentialStore for MemCredentials {
        async fn find_by_username(
            &self,
            username: &Username,
        ) -> Result<Option<Credential>, StoreError> {
            Ok(self.inner.lock().unwrap().get(username).cloned())
        }

        async fn insert(&self, credential: NewCredential) -> Result<Credential, StoreError> {
            let mut map = self.inner.lock().unwrap();
            if map.contains_key(&credential.username) {
                return Err(StoreError::Duplicate);
            }
            let stored = Credential::from_new(credential);
            map.insert(stored.username.clone(), stored.clone());
            Ok(stored)
        }

        async fn touch_last_login(&self, username: &Username) -> Result<(), StoreError> {
            let mut map = self.inner.lock().unwrap();
            let credential = map.get_mut(username).ok_or(StoreError::NotFound)?;
            credential.last_login_at = Some(Utc::now());
            Ok(())
        }
    }

    fn issuer() -> (CredentialIssuer, Arc<MemCredentials>) {
        let store = Arc::new(MemCredentials::default());
        let config = AuthConfig {
            token: TokenConfig::new("test-secret"),
            hashing: HashingCost::new(8, 1, 1),
        };
        let issuer = CredentialIssuer::from_config(store.clone(), &config).unwrap();
        (issuer, store)
    }

    fn registration(username: &str, password: &str) -> Registration {
        Registration {
            username: username.to_string(),
            password: password.to_string(),
            profile: Profile {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                phone: "+15550000000".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn register_issues_a_verifiable_token_and_touches_login() {
        let (issuer, store) = issuer();

        let issued = issuer.register(registration("alice", "pw")).await.unwrap();

        assert_eq!(issued.username.as_str(), "alice");
        assert_eq!(issuer.codec().verify(Some(&issued.token)).unwrap(), issued.username);

        let stored = store.get("alice").unwrap();
        assert!(stored.last_login_at.is_some());
        assert_ne!(stored.password_hash, "pw");
    }

    #[tokio::test]
    async fn duplicate_registration_keeps_the_first_digest() {
        let (issuer, store) = issuer();

        issuer.register(registration("alice", "pw")).await.unwrap();
        let digest = store.get("alice").unwrap().password_hash;

        let err = issuer.register(registration("alice", "pw2")).await.unwrap_err();
        assert_eq!(err, IssuanceError::DuplicateIdentifier);
        assert_eq!(store.get("alice").unwrap().password_hash, digest);

        issuer.login("alice", "pw").await.unwrap();
        assert_eq!(
            issuer.login("alice", "pw2").await.unwrap_err(),
            IssuanceError::InvalidCredentials
        );
    }

    #[tokio::test]
    async fn register_requires_every_field() {
        let (issuer, _store) = issuer();

        let mut missing_phone = registration("alice", "pw");
        missing_phone.profile.phone = "  ".to_string();

        for reg in [registration("", "pw"), registration("alice", ""), missing_phone] {
            assert_eq!(issuer.register(reg).await.unwrap_err(), IssuanceError::MissingInputs);
        }
    }

    #[tokio::test]
    async fn register_rejects_malformed_username() {
        let (issuer, _store) = issuer();
        assert!(matches!(
            issuer.register(registration("al ice", "pw")).await,
            Err(IssuanceError::InvalidUsername(_))
        ));
    }

    #[tokio::test]
    async fn login_with_correct_password_updates_timestamp() {
        let (issuer, store) = issuer();
        issuer.register(registration("alice", "pw")).await.unwrap();
        let first = store.get("alice").unwrap().last_login_at.unwrap();

        let issued = issuer.login("alice", "pw").await.unwrap();

        assert_eq!(issuer.codec().verify(Some(&issued.token)).unwrap().as_str(), "alice");
        assert!(store.get("alice").unwrap().last_login_at.unwrap() >= first);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let (issuer, _store) = issuer();
        issuer.register(registration("alice", "pw")).await.unwrap();

        let wrong_password = issuer.login("alice", "wrongpw").await.unwrap_err();
        let unknown_user = issuer.login("nobody", "anything").await.unwrap_err();
        let malformed_user = issuer.login("no body", "anything").await.unwrap_err();

        assert_eq!(wrong_password, IssuanceError::InvalidCredentials);
        assert_eq!(wrong_password, unknown_user);
        assert_eq!(wrong_password, malformed_user);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn login_requires_inputs() {
        let (issuer, _store) = issuer();
        assert_eq!(issuer.login("", "pw").await.unwrap_err(), IssuanceError::MissingInputs);
        assert_eq!(issuer.login("alice", "").await.unwrap_err(), IssuanceError::MissingInputs);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_registrations_admit_exactly_one() {
        let (issuer, _store) = issuer();

        let attempts: Vec<_> = (0..8)
            .map(|i| {
                let issuer = issuer.clone();
                tokio::spawn(async move {
                    issuer.register(registration("alice", &format!("pw{i}"))).await
                })
            })
            .collect();

        let mut ok = 0;
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(_) => ok += 1,
                Err(e) => assert_eq!(e, IssuanceError::DuplicateIdentifier),
            }
        }
        assert_eq!(ok, 1);
    }
}
