use std::sync::Arc;

use messagely_auth::{AuthConfig, CredentialIssuer, MessageAccessor, PasswordError, TokenCodec};
use messagely_infra::{InMemoryStore, MessageBoard, Store, UserDirectory};

use crate::config::AppConfig;

/// Shared handles for every handler. One backend sits behind all of them.
#[derive(Clone)]
pub struct AppServices {
    pub issuer: CredentialIssuer,
    pub users: Arc<dyn UserDirectory>,
    pub board: Arc<dyn MessageBoard>,
    pub messages: Arc<dyn MessageAccessor>,
}

impl AppServices {
    pub fn new<S: Store + 'static>(store: Arc<S>, auth: &AuthConfig) -> Result<Self, PasswordError> {
        let issuer = CredentialIssuer::from_config(store.clone(), auth)?;
        Ok(Self {
            issuer,
            users: store.clone(),
            board: store.clone(),
            messages: store,
        })
    }

    pub fn codec(&self) -> &TokenCodec {
        self.issuer.codec()
    }
}

/// Pick the backend from configuration: Postgres when `DATABASE_URL` is set
/// (and the `postgres` feature is built), otherwise in-memory.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    if let Some(url) = config.database_url.as_deref() {
        return connect_database(url, &config.auth).await;
    }

    tracing::info!("using in-memory store");
    Ok(AppServices::new(Arc::new(InMemoryStore::new()), &config.auth)?)
}

#[cfg(feature = "postgres")]
async fn connect_database(url: &str, auth: &AuthConfig) -> anyhow::Result<AppServices> {
    let store = messagely_infra::PostgresStore::connect(url).await?;
    store.migrate().await?;
    tracing::info!("using postgres store");
    Ok(AppServices::new(Arc::new(store), auth)?)
}

#[cfg(not(feature = "postgres"))]
async fn connect_database(_url: &str, auth: &AuthConfig) -> anyhow::Result<AppServices> {
    tracing::warn!("DATABASE_URL is set but postgres support is not compiled in; using in-memory store");
    Ok(AppServices::new(Arc::new(InMemoryStore::new()), auth)?)
}
