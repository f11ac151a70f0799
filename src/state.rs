use std::sync::Arc;

use sqlx::SqlitePool;

use crate::identity::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub identity: Arc<dyn IdentityProvider>,
}
