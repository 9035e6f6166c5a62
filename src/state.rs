use std::sync::Arc;

use anyhow::Context;
use sqlx::PgPool;

use crate::auth::{jwt::TokenService, repo::PgUserStore, repo::UserStore};
use crate::config::AppConfig;
use crate::tasks::repo::{PgTaskStore, TaskStore};

/// Shared, read-only handles built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    pub fn new(config: &AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let tokens = TokenService::new(&config.jwt).context("build token service")?;
        let timeout = config.db.statement_timeout();

        Ok(Self::from_parts(
            Arc::new(PgUserStore::new(db.clone(), timeout)),
            Arc::new(PgTaskStore::new(db, timeout)),
            Arc::new(tokens),
        ))
    }

    pub fn from_parts(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self { users, tasks, tokens }
    }
}
