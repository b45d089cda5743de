//! Shared application state

use crate::lookup::BookLookup;
use literatus_core::ranking::ComparisonSession;
use literatus_core::ShelfStore;
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Shared application context passed to all handlers.
///
/// `AppContext` implements Clone, which gives us `FromRef<AppContext>` for
/// free via Axum's blanket implementation, so custom extractors (the auth
/// extractor) can access state.
#[derive(Clone)]
pub struct AppContext {
    pub db: Pool<Sqlite>,
    pub store: ShelfStore,
    /// At most one in-flight comparison interview per user. Starting a new
    /// classification replaces (and discards) a pending one.
    pub sessions: Arc<RwLock<HashMap<Uuid, ComparisonSession>>>,
    pub lookup: Arc<BookLookup>,
}

impl AppContext {
    pub fn new(db: Pool<Sqlite>, lookup: BookLookup) -> Self {
        Self {
            store: ShelfStore::new(db.clone()),
            db,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            lookup: Arc::new(lookup),
        }
    }
}
