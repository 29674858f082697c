use sqlx::PgPool;
use std::sync::Arc;

use crate::services::{auth::AuthKeys, push::PushClient, queue::JobQueue};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub queue: Arc<JobQueue>,
    pub push: Arc<PushClient>,
    pub auth: Arc<AuthKeys>,
}

impl AppState {
    pub fn new(db: PgPool, queue: JobQueue, push: PushClient, auth: AuthKeys) -> Self {
        Self {
            db,
            queue: Arc::new(queue),
            push: Arc::new(push),
            auth: Arc::new(auth),
        }
    }
}
