//! Domain entities

pub mod module;
pub mod plugin;

pub use module::{
    Capability, DisplayColumn, DisplayFn, FieldDescriptor, Operation, OperationFuture, PluginModule, Setting,
    Teardown,
};
pub use plugin::{NewPluginRecord, PluginDescriptor, PluginRecord, CORE_PLUGIN};
