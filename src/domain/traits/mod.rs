//! Domain traits - Abstractions for infrastructure implementations

pub mod provider;
pub mod store;

pub use provider::{ComponentProvider, LoadedModule, PluginLocation};
pub use store::PluginStore;
