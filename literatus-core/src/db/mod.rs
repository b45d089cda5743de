//! Database layer for the shelf
//!
//! Schema initialization and the ordered tier store.

pub mod init;
pub mod shelf;
