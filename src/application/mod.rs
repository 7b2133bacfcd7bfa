//! Application layer
//!
//! This layer contains:
//! - Engine: plugin registry, ordering, capability resolution, invocation
//! - Errors: error types shared across layers

pub mod engine;
pub mod errors;
