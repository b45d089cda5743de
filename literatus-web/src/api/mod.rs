//! HTTP API for the Literatus service

pub mod handlers;
pub mod server;

pub use server::create_router;
