use crate::auth::repo::{PgUserStore, UserStore};
use crate::catalog::repo::{CatalogStore, PgCatalogStore};
use crate::config::AppConfig;
use crate::mail::{self, Mailer};
use crate::db;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: Arc<dyn UserStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let pool = db::connect(&config).await?;
        db::migrate(&pool).await;

        let mailer = mail::from_config(&config.mail)?;

        Ok(Self::from_parts(
            config,
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgCatalogStore::new(pool)),
            mailer,
        ))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        users: Arc<dyn UserStore>,
        catalog: Arc<dyn CatalogStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config,
            users,
            catalog,
            mailer,
        }
    }
}
