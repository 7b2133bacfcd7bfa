//! Plugin installation and loading
//!
//! Registry packages resolve against a catalog compiled into the binary.
//! Local plugins are directories holding a `plugin.yaml` manifest and a
//! shared library exporting `sawmon_plugin_init`.

pub mod catalog;
pub mod loader;
pub mod manifest;
pub mod provider;

pub use catalog::Catalog;
pub use loader::NativeLoader;
pub use manifest::PluginManifest;
pub use provider::PluginProvider;
