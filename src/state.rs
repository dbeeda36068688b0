use std::sync::Arc;

use crate::clients::jikan::JikanClient;
use crate::config::Config;
use crate::constants::locks::ENTRY_LOCK_STRIPES;
use crate::db::Store;
use crate::services::{
    AuthService, CatalogService, EntryService, FavoriteService, KeyedLocks, Mailer,
    SeaOrmAuthService, SeaOrmEntryService, SeaOrmFavoriteService, build_mailer,
};

/// Everything a request handler or CLI command needs, built once at startup.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub catalog: Arc<CatalogService>,

    pub entry_service: Arc<dyn EntryService>,

    pub favorite_service: Arc<dyn FavoriteService>,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let mailer = build_mailer(&config.email, &config.server.public_url)?;
        Self::with_mailer(config, mailer).await
    }

    /// Same as [`Self::new`] with a caller-provided mailer.
    pub async fn with_mailer(config: Config, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let jikan = JikanClient::from_config(&config.jikan)?;
        let catalog = Arc::new(CatalogService::new(jikan));

        // Entries and favorites share stripes so a toggle and an upsert on
        // the same key never interleave.
        let locks = KeyedLocks::new(ENTRY_LOCK_STRIPES);

        let entry_service = Arc::new(SeaOrmEntryService::new(
            store.clone(),
            catalog.clone(),
            locks.clone(),
        )) as Arc<dyn EntryService + Send + Sync + 'static>;

        let favorite_service = Arc::new(SeaOrmFavoriteService::new(
            store.clone(),
            catalog.clone(),
            locks,
        )) as Arc<dyn FavoriteService + Send + Sync + 'static>;

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            mailer,
            config.security.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(config),
            store,
            catalog,
            entry_service,
            favorite_service,
            auth_service,
        })
    }
}
