//! Plugin orchestration engine
//!
//! - Registry: loaded plugins, install/remove lifecycle
//! - Ordering: dependency-respecting order of plugins
//! - Resolver: plugins and metadata for one capability
//! - Invoker: concurrent, dependency-aware operation batches

pub mod invoker;
pub mod ordering;
pub mod registry;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use invoker::{BatchReport, Outcome, PluginOutcome, RunOptions};
pub use registry::{InitReport, InstallFailure, PluginRegistry, PluginWrapper};
pub use resolver::DisplayCell;
