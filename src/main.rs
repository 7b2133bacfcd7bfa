use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use sawmon::application::engine::{PluginRegistry, RunOptions};
use sawmon::domain::entities::PluginDescriptor;
use sawmon::infrastructure::config::Config;
use sawmon::infrastructure::database::SqlitePluginStore;
use sawmon::infrastructure::plugins::{NativeLoader, PluginProvider};
use sawmon::plugins;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "sawmon")]
#[command(about = "Server and website monitor with pluggable checks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "sawmon.yaml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage installed plugins
    Plugins {
        #[command(subcommand)]
        action: PluginCommands,
    },
    /// Show the form fields of a resource type
    Fields { capability: String },
    /// Show settings declared by plugins
    Settings,
    /// Run an operation on every plugin that implements it
    Run {
        capability: String,
        operation: String,
        /// JSON argument passed to each plugin
        #[arg(long)]
        arg: Option<String>,
        /// Per-plugin deadline in seconds (0 disables it)
        #[arg(long)]
        timeout: Option<u64>,
    },
    /// Generate default config
    InitConfig,
    /// Show version
    Version,
}

#[derive(Subcommand)]
enum PluginCommands {
    /// List installed plugins
    List,
    /// List catalog packages that can be installed by name
    Available,
    /// Install a catalog package or a local plugin directory (`./path`)
    Add {
        name: String,
        /// Version requirement, e.g. `0.1`
        #[arg(long)]
        version: Option<String>,
    },
    /// Remove an installed plugin by id
    Remove { id: i64 },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("sawmon v{}", env!("CARGO_PKG_VERSION"));
            return;
        }
        Commands::InitConfig => {
            if let Err(e) = init_config() {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
            return;
        }
        _ => {}
    }

    let config = load_config(&cli.config);

    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    let result = tokio::runtime::Runtime::new()
        .map_err(Box::<dyn Error>::from)
        .and_then(|runtime| runtime.block_on(execute(cli.command, config)));

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(path: &str) -> Config {
    let loaded = if Path::new(path).exists() {
        Config::load(path).and_then(Config::with_env)
    } else {
        Config::load_env()
    };

    loaded.unwrap_or_else(|e| {
        eprintln!("Failed to load config: {}, using defaults", e);
        Config::default()
    })
}

async fn build_registry(config: &Config) -> Result<PluginRegistry, Box<dyn Error>> {
    let store = SqlitePluginStore::new(&config.database.path)?;
    let provider = PluginProvider::new(plugins::catalog(), NativeLoader::new(&config.plugins.directory));

    let registry = PluginRegistry::new(Arc::new(store), Arc::new(provider), plugins::core_module())
        .with_operation_timeout(config.plugins.operation_timeout());

    let report = registry.initialize().await?;
    for failure in &report.failed {
        tracing::warn!("Plugin {} not loaded: {}", failure.name, failure.error);
    }
    tracing::debug!("Plugin registry ready with {} plugins", registry.len().await);

    Ok(registry)
}

async fn execute(command: Commands, config: Config) -> CliResult {
    if let Commands::Plugins {
        action: PluginCommands::Available,
    } = command
    {
        for manifest in plugins::catalog().manifests() {
            println!(
                "{:<24} {:<10} {}",
                manifest.name,
                manifest.version,
                manifest.description.as_deref().unwrap_or_default()
            );
        }
        return Ok(());
    }

    let registry = build_registry(&config).await?;

    match command {
        Commands::Plugins { action } => match action {
            PluginCommands::List => {
                for record in registry.installed_plugins().await? {
                    println!(
                        "{:>4}  {:<24} {:<10} {}",
                        record.id.map(|id| id.to_string()).unwrap_or_default(),
                        record.name,
                        record.version,
                        record.installed_at.unwrap_or_default()
                    );
                }
            }
            PluginCommands::Add { name, version } => {
                let mut descriptor = PluginDescriptor::new(name);
                descriptor.version = version;
                let record = registry.add_plugin(descriptor).await?;
                println!("Installed {} v{}", record.name, record.version);
            }
            PluginCommands::Remove { id } => {
                let record = registry.remove_plugin(id).await?;
                println!("Removed {} v{}", record.name, record.version);
            }
            PluginCommands::Available => {}
        },
        Commands::Fields { capability } => print_json(&registry.fields(&capability).await?)?,
        Commands::Settings => print_json(&registry.settings().await?)?,
        Commands::Run {
            capability,
            operation,
            arg,
            timeout,
        } => {
            let argument = match arg {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Value::Object(Default::default()),
            };

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupted, cancelling pending plugins");
                    on_interrupt.cancel();
                }
            });

            let options = RunOptions {
                timeout: match timeout {
                    Some(0) => None,
                    Some(secs) => Some(Duration::from_secs(secs)),
                    None => config.plugins.operation_timeout(),
                },
                cancel: Some(cancel),
            };

            let report = registry.run_with(&capability, &operation, argument, options).await?;
            print_json(&report)?;
        }
        Commands::InitConfig | Commands::Version => {}
    }

    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_config() -> CliResult {
    let yaml = serde_yaml::to_string(&Config::default())?;
    println!("{}", yaml);
    println!("\nSave this to sawmon.yaml and adjust as needed.");
    Ok(())
}
