//! Domain layer - plugin model with no infrastructure dependencies
//!
//! This layer contains:
//! - Entities: plugin records, descriptors and loaded modules
//! - Traits: storage and component-loading boundaries

pub mod entities;
pub mod traits;
