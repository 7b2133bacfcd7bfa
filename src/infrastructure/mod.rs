//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Database: SQLite plugin records
//! - Storage: in-memory plugin records
//! - Plugins: catalog and native library loading

pub mod config;
pub mod database;
pub mod plugins;
pub mod storage;
