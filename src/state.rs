use std::sync::Arc;

use crate::config::Config;
use crate::db::{UserStore, open_store};
use crate::services::{
    AdminService, LoginService, PlaintextVerifier, StoreAdminService, StoreLoginService,
    ensure_default_admin,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Arc<dyn UserStore>,

    pub login_service: Arc<dyn LoginService>,

    pub admin_service: Arc<dyn AdminService>,
}

impl SharedState {
    /// Opens the configured store and seeds the main admin if it is empty.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = open_store(&config.storage).await?;
        Self::with_store(config, store).await
    }

    pub async fn with_store(config: Config, store: Arc<dyn UserStore>) -> anyhow::Result<Self> {
        ensure_default_admin(store.as_ref(), &config.bootstrap.admin_password).await?;

        let verifier = Arc::new(PlaintextVerifier);

        let login_service = Arc::new(StoreLoginService::with_verifier(
            store.clone(),
            verifier.clone(),
        )) as Arc<dyn LoginService + Send + Sync + 'static>;

        let admin_service = Arc::new(StoreAdminService::with_verifier(store.clone(), verifier))
            as Arc<dyn AdminService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(config),
            store,
            login_service,
            admin_service,
        })
    }
}
