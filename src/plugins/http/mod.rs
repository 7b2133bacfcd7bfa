//! `sawmon-http`: pings websites over HTTPS and reports status and latency

use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use reqwest::Client;
use serde_json::{json, Value};

use crate::application::errors::OperationError;
use crate::domain::entities::{Capability, DisplayColumn, PluginModule, CORE_PLUGIN};
use crate::infrastructure::plugins::PluginManifest;

pub const NAME: &str = "sawmon-http";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub fn manifest() -> PluginManifest {
    PluginManifest::new(NAME, env!("CARGO_PKG_VERSION"))
        .with_description("Check website availability over HTTPS")
}

pub fn module() -> PluginModule {
    PluginModule::new().depends_on(CORE_PLUGIN).with_capability(
        "websites",
        Capability::new()
            .with_display(DisplayColumn::new("Status", |website| {
                website
                    .pointer("/pingStatus/httpStatus")
                    .and_then(Value::as_u64)
                    .map(|status| status.to_string())
            }))
            .with_operation("ping", ping),
    )
}

/// Client shared by every ping
static CLIENT: Lazy<Client> = Lazy::new(Client::new);

fn url_for(website: &Value) -> Result<String, OperationError> {
    let domain = website
        .get("domain")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .ok_or_else(|| OperationError::InvalidArgument("website has no domain".to_string()))?;

    if domain.starts_with("http://") || domain.starts_with("https://") {
        Ok(domain.to_string())
    } else {
        Ok(format!("https://{}", domain))
    }
}

async fn ping(website: Value) -> Result<Value, OperationError> {
    let url = url_for(&website)?;
    let started = Instant::now();

    let response = CLIENT
        .get(&url)
        .timeout(REQUEST_TIMEOUT)
        .send()
        .await
        .map_err(|e| OperationError::Probe(format!("Request to {} failed: {}", url, e)))?;

    let latency = started.elapsed();
    tracing::debug!("Pinged {} -> {} in {:?}", url, response.status(), latency);

    Ok(json!({
        "httpStatus": response.status().as_u16(),
        "latencyMs": latency.as_millis() as u64,
    }))
}
