//! Orchestrated invoker - runs one operation across every plugin implementing it

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant};

use futures::future::{join_all, BoxFuture, Shared};
use futures::FutureExt;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::registry::{PluginRegistry, PluginWrapper};
use crate::application::errors::PluginError;
use crate::domain::entities::Operation;

/// How one plugin's invocation settled
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum Outcome {
    Completed { output: Value },
    Failed { error: String },
    TimedOut { after_ms: u64 },
    Cancelled,
    /// Not invoked because a dependency did not complete
    DependencyFailed { dependency: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Completed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PluginOutcome {
    pub plugin: String,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Per-plugin outcomes of one batch, in dependency order
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub capability: String,
    pub operation: String,
    pub outcomes: Vec<PluginOutcome>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.outcome.is_success())
    }

    pub fn failures(&self) -> impl Iterator<Item = &PluginOutcome> {
        self.outcomes.iter().filter(|o| !o.outcome.is_success())
    }

    pub fn outcome(&self, plugin: &str) -> Option<&Outcome> {
        self.outcomes
            .iter()
            .find(|o| o.plugin == plugin)
            .map(|o| &o.outcome)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Per-batch knobs
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Deadline for each plugin's invocation, not the whole batch
    pub timeout: Option<Duration>,
    pub cancel: Option<CancellationToken>,
}

type Completion = Shared<BoxFuture<'static, Outcome>>;

impl PluginRegistry {
    /// Run `operation` of `capability` on every plugin that implements it.
    ///
    /// Uses the registry's configured operation timeout.
    pub async fn run(&self, capability: &str, operation: &str, argument: Value) -> Result<BatchReport, PluginError> {
        let options = RunOptions {
            timeout: self.operation_timeout,
            cancel: None,
        };
        self.run_with(capability, operation, argument, options).await
    }

    /// Run `operation` across plugins, each one starting only after its
    /// dependencies in this batch have settled.
    ///
    /// Plugin failures never fail the call: a plugin whose dependency did not
    /// complete is skipped, unrelated plugins still run, and every outcome is
    /// listed in the report.
    pub async fn run_with(
        &self,
        capability: &str,
        operation: &str,
        argument: Value,
        options: RunOptions,
    ) -> Result<BatchReport, PluginError> {
        let wrappers = self.get_plugin_wrappers(capability).await?;

        let mut completions: HashMap<String, Completion> = HashMap::new();
        let mut names: Vec<String> = Vec::new();

        for wrapper in wrappers {
            let Some(invoke) = wrapper
                .module()
                .capability(capability)
                .and_then(|c| c.operation(operation))
            else {
                continue;
            };

            let dependencies: Vec<(String, Completion)> = wrapper
                .module()
                .dependencies()
                .iter()
                .filter_map(|d| completions.get(d).map(|c| (d.clone(), c.clone())))
                .collect();

            let name = wrapper.name().to_string();
            let completion = invoke_after(wrapper, invoke, dependencies, argument.clone(), options.clone())
                .boxed()
                .shared();
            names.push(name.clone());
            completions.insert(name, completion);
        }

        if names.is_empty() {
            debug!("No plugin implements {}.{}", capability, operation);
        }

        let settled = join_all(names.iter().map(|n| completions[n].clone())).await;
        let report = BatchReport {
            capability: capability.to_string(),
            operation: operation.to_string(),
            outcomes: names
                .into_iter()
                .zip(settled)
                .map(|(plugin, outcome)| PluginOutcome { plugin, outcome })
                .collect(),
        };

        let failed = report.failures().count();
        if failed > 0 {
            warn!(
                "{} of {} plugins did not complete {}.{}; report unhandled failures to the plugin authors",
                failed,
                report.len(),
                capability,
                operation
            );
        }

        Ok(report)
    }
}

async fn invoke_after(
    wrapper: PluginWrapper,
    invoke: Operation,
    dependencies: Vec<(String, Completion)>,
    argument: Value,
    options: RunOptions,
) -> Outcome {
    let (names, waits): (Vec<String>, Vec<Completion>) = dependencies.into_iter().unzip();
    let settled = join_all(waits).await;
    if let Some((dependency, _)) = names.into_iter().zip(settled).find(|(_, o)| !o.is_success()) {
        debug!("Skipping {}: dependency {} did not complete", wrapper.name(), dependency);
        return Outcome::DependencyFailed { dependency };
    }

    if options.cancel.as_ref().is_some_and(|t| t.is_cancelled()) {
        return Outcome::Cancelled;
    }

    debug!("Invoking {}", wrapper.name());
    let started = Instant::now();
    let timeout = options.timeout;
    let invocation = AssertUnwindSafe(async move { invoke(argument).await }).catch_unwind();
    let bounded = async move {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, invocation).await.map_err(|_| limit),
            None => Ok(invocation.await),
        }
    };

    let result = match options.cancel {
        Some(token) => tokio::select! {
            _ = token.cancelled() => return Outcome::Cancelled,
            result = bounded => result,
        },
        None => bounded.await,
    };

    let outcome = match result {
        Ok(Ok(Ok(output))) => Outcome::Completed { output },
        Ok(Ok(Err(e))) => Outcome::Failed { error: e.to_string() },
        Ok(Err(_)) => Outcome::Failed {
            error: "operation panicked".to_string(),
        },
        Err(limit) => Outcome::TimedOut {
            after_ms: limit.as_millis() as u64,
        },
    };
    debug!(
        "{} settled in {}ms: success={}",
        wrapper.name(),
        started.elapsed().as_millis(),
        outcome.is_success()
    );
    outcome
}
