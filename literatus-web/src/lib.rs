//! # Literatus Web Service (literatus-web)
//!
//! HTTP front end for the Literatus ranking engine: user accounts with
//! cookie sessions, the book classification interview endpoints, the
//! profile/ratings view, and the external book-metadata search.
//!
//! All ranking semantics live in `literatus-core`; this crate is routing,
//! auth, and JSON shapes.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod lookup;
pub mod state;

pub use error::{Error, Result};
pub use state::AppContext;
