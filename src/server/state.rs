//! Shared handler state.

use crate::database::Database;
use std::sync::Arc;
use tokio::sync::Mutex;

/// State cloned into every handler.
///
/// `write_lock` serializes every request that changes the data directory
/// (`/run`, `/upload`, `/reset`). Read-only routes skip it.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub write_lock: Arc<Mutex<()>>,
    pub upload_limit_bytes: usize,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        let upload_limit_bytes = db.config().upload_limit_bytes();
        Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
            upload_limit_bytes,
        }
    }
}
