//! # Literatus Core Library (literatus-core)
//!
//! Ranking engine for the Literatus book shelf:
//! - Tier model with fixed rating bands
//! - Ordered tier store (dense 1-based positions, SQLite-backed)
//! - Pairwise comparison sessions (binary-insertion interview)
//! - Insertion/reposition resolver
//! - Rating projector (position -> bounded score)
//!
//! The HTTP layer lives in `literatus-web`; this crate has no web
//! dependencies and exposes everything through explicit `Result` values.

pub mod db;
pub mod error;
pub mod ranking;
pub mod tier;

pub use db::shelf::{Book, ShelfStore};
pub use error::{Error, Result};
pub use tier::Tier;
