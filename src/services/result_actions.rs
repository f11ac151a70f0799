use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::db::repository;
use crate::models::{ActionState, ResultPayload};

/// Server actions that persist a result. Failures are reported only as a flag.
#[async_trait]
pub trait ResultActions: Send + Sync {
    async fn create(&self, payload: ResultPayload) -> ActionState;
    async fn update(&self, payload: ResultPayload) -> ActionState;
}

pub struct SqliteResultActions {
    db: SqlitePool,
}

impl SqliteResultActions {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ResultActions for SqliteResultActions {
    async fn create(&self, payload: ResultPayload) -> ActionState {
        match repository::insert_result(&self.db, &payload).await {
            Ok(id) => {
                info!("created result {} for student {}", id, payload.student_id);
                ActionState::succeeded()
            }
            Err(e) => {
                error!("create result failed: {}", e);
                ActionState::failed()
            }
        }
    }

    async fn update(&self, payload: ResultPayload) -> ActionState {
        let Some(id) = payload.id else {
            warn!("update result called without an id");
            return ActionState::failed();
        };

        match repository::update_result(&self.db, id, &payload).await {
            Ok(true) => {
                info!("updated result {}", id);
                ActionState::succeeded()
            }
            Ok(false) => {
                warn!("update result {}: no such row", id);
                ActionState::failed()
            }
            Err(e) => {
                error!("update result {} failed: {}", id, e);
                ActionState::failed()
            }
        }
    }
}
