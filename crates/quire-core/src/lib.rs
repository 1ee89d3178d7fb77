//! # quire-core
//!
//! Core types, traits, and configuration for quire, a command-line notebook
//! of tagged entries backed by PostgreSQL.
//!
//! This crate holds no I/O; `quire-db` implements the repository traits.

pub mod config;
pub mod defaults;
pub mod error;
pub mod models;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use config::DbConfig;
pub use error::{Error, Result};
pub use models::*;
pub use tags::{normalize_tags, parse_tag_list};
pub use traits::*;
