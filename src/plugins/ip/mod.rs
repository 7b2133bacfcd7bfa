//! `sawmon-ip`: resolves server hostnames to their addresses on refresh

use serde_json::{json, Value};
use tokio::net::lookup_host;

use crate::application::errors::OperationError;
use crate::domain::entities::{Capability, DisplayColumn, PluginModule, CORE_PLUGIN};
use crate::infrastructure::plugins::PluginManifest;

pub const NAME: &str = "sawmon-ip";

pub fn manifest() -> PluginManifest {
    PluginManifest::new(NAME, env!("CARGO_PKG_VERSION"))
        .with_description("Resolve server hostnames to IP addresses")
}

pub fn module() -> PluginModule {
    PluginModule::new().depends_on(CORE_PLUGIN).with_capability(
        "servers",
        Capability::new()
            .with_display(DisplayColumn::property("IP", "ip"))
            .with_operation("refresh", refresh),
    )
}

async fn refresh(server: Value) -> Result<Value, OperationError> {
    let hostname = server
        .get("hostname")
        .and_then(Value::as_str)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| OperationError::InvalidArgument("server has no hostname".to_string()))?;

    let addresses: Vec<String> = lookup_host((hostname, 0))
        .await
        .map_err(|e| OperationError::Probe(format!("Failed to resolve {}: {}", hostname, e)))?
        .map(|addr| addr.ip().to_string())
        .collect();

    let first = addresses
        .first()
        .cloned()
        .ok_or_else(|| OperationError::Probe(format!("{} has no addresses", hostname)))?;

    Ok(json!({ "ip": first, "addresses": addresses }))
}
