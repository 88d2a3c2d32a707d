use std::sync::Arc;

use crate::config::Config;
use crate::db::{create_pool, DbPool};

/// Shared handle passed to every stage of the pipeline. The service itself is
/// stateless per request; the context only carries configuration and the
/// connection pool.
#[derive(Clone)]
pub struct PushContext {
    pub config: Arc<Config>,
    pub db_pool: Arc<DbPool>,
}

impl PushContext {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = create_pool(&config.database).await?;

        Ok(PushContext {
            config: Arc::new(config),
            db_pool,
        })
    }
}
