use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use repeater_console::{
    AgentEndpoints, ConfigPushDistributor, EnvironmentChecker, HttpAgentClient,
    InMemoryConfigStore, InMemoryModuleStore, InstallParams, JsonConfigSerializer,
    ModuleConfigManager, ModuleConfigParams, ModuleInfoParams, ModuleRegistry,
    ModuleStatusProber, RepeaterConsoleConfig, SaveConfigParams,
};

#[derive(Parser)]
#[command(name = "repeater-console")]
#[command(about = "Control plane for a fleet of repeater agent modules")]
#[command(
    long_about = "Tracks registered repeater agent instances, their liveness and activation \
                  state, distributes configuration payloads to them, and diagnoses mismatches \
                  between configured deployment targets and registered agents."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register an agent instance after verifying it is reachable
    Install {
        /// Application the agent belongs to
        #[arg(long)]
        app: String,
        /// Agent host IP
        #[arg(long)]
        ip: String,
        /// Agent port (defaults to the configured agent port)
        #[arg(long)]
        port: Option<String>,
        /// Deployment environment tag
        #[arg(long)]
        environment: Option<String>,
    },
    /// Remove a registered instance
    Remove {
        #[arg(long)]
        app: String,
        #[arg(long)]
        ip: String,
        /// Refuse removal unless this matches the stored port
        #[arg(long)]
        port: Option<String>,
    },
    /// Activate the remote module and mirror the state locally
    Active {
        #[arg(long)]
        app: String,
        #[arg(long)]
        ip: String,
    },
    /// Freeze the remote module and mirror the state locally
    Frozen {
        #[arg(long)]
        app: String,
        #[arg(long)]
        ip: String,
    },
    /// Reload the remote module and report latency + activation
    Reload {
        #[arg(long)]
        app: String,
        #[arg(long)]
        ip: String,
    },
    /// Probe one instance's liveness and activation state
    Status {
        #[arg(long)]
        app: String,
        #[arg(long)]
        ip: String,
    },
    /// List registered instances, filtered by any subset of fields
    List {
        #[arg(long)]
        app: Option<String>,
        #[arg(long)]
        ip: Option<String>,
        #[arg(long)]
        environment: Option<String>,
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, default_value = "10")]
        size: usize,
    },
    /// Save (or update) a config payload for an (app, environment) pair
    SaveConfig {
        #[arg(long)]
        app: String,
        #[arg(long)]
        environment: String,
        /// JSON payload, inline
        #[arg(long)]
        config: String,
    },
    /// Push the stored config to all matching live instances
    Push {
        #[arg(long)]
        app: String,
        #[arg(long)]
        environment: String,
    },
    /// Check every config's environment against registered modules
    Check,
    /// Check whether one (app, environment) pair has matching modules
    CheckMatch {
        #[arg(long)]
        app: String,
        #[arg(long)]
        environment: String,
    },
    /// Rewrite mismatched config environments to an available one
    Autofix,
    /// Write the effective configuration to a TOML file as a starting point
    InitConfig {
        #[arg(long, default_value = "repeater-console.toml")]
        path: String,
    },
    /// List stored config payloads
    ListConfigs {
        #[arg(long)]
        app: Option<String>,
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, default_value = "10")]
        size: usize,
    },
}

struct Console {
    registry: Arc<ModuleRegistry>,
    prober: ModuleStatusProber,
    checker: EnvironmentChecker,
    configs: ModuleConfigManager,
    distributor: ConfigPushDistributor,
}

impl Console {
    fn new(cfg: &RepeaterConsoleConfig) -> Result<Self> {
        let modules = Arc::new(InMemoryModuleStore::new());
        let config_store = Arc::new(InMemoryConfigStore::new());
        let agent = Arc::new(HttpAgentClient::new(Duration::from_secs(
            cfg.agent.http_timeout_seconds,
        ))?);
        let endpoints = AgentEndpoints::new(cfg.agent.endpoints.clone());

        let registry = Arc::new(
            ModuleRegistry::new(modules.clone(), agent.clone(), endpoints.clone())
                .with_default_port(cfg.agent.default_port.clone()),
        );
        let prober = ModuleStatusProber::new(modules.clone(), agent.clone(), endpoints.clone());
        let checker = EnvironmentChecker::new(modules, config_store.clone());
        let configs = ModuleConfigManager::new(config_store.clone());
        let distributor = ConfigPushDistributor::new(
            config_store,
            registry.clone(),
            agent,
            endpoints,
            Arc::new(JsonConfigSerializer),
        )
        .with_concurrency(cfg.push.concurrency);

        Ok(Self {
            registry,
            prober,
            checker,
            configs,
            distributor,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    repeater_console::init_telemetry()?;
    let cfg = repeater_console::config()?;
    let console = Console::new(cfg)?;

    match cli.command {
        Commands::Install {
            app,
            ip,
            port,
            environment,
        } => {
            let module = console
                .registry
                .install(InstallParams {
                    app_name: app,
                    ip,
                    port,
                    environment,
                })
                .await?;
            println!(
                "module registered: {}@{}:{} environment={} version={}",
                module.app_name, module.ip, module.port, module.environment, module.version
            );
        }
        Commands::Remove { app, ip, port } => {
            let module = console.registry.remove(&app, &ip, port.as_deref()).await?;
            println!("module removed: {}:{}", module.ip, module.port);
        }
        Commands::Active { app, ip } => {
            let module = console.registry.active(&app, &ip).await?;
            println!("module {}@{} is now {}", module.app_name, module.ip, module.status);
        }
        Commands::Frozen { app, ip } => {
            let module = console.registry.frozen(&app, &ip).await?;
            println!("module {}@{} is now {}", module.app_name, module.ip, module.status);
        }
        Commands::Reload { app, ip } => {
            let outcome = console.registry.reload(&app, &ip).await?;
            println!("{outcome}");
        }
        Commands::Status { app, ip } => {
            let detail = console.prober.probe(&app, &ip).await?;
            println!(
                "online={} active={} latency={} ({}ms) status={}",
                detail.online,
                detail.module_active,
                detail.latency_level(),
                detail.response_time_ms,
                detail.status_description()
            );
            if let Some(error) = detail.error {
                println!("error: {error}");
            }
        }
        Commands::List {
            app,
            ip,
            environment,
            page,
            size,
        } => {
            let result = console
                .registry
                .query(&ModuleInfoParams {
                    app_name: app,
                    ip,
                    port: None,
                    environment,
                    page,
                    size,
                })
                .await?;
            println!(
                "page {}/{} ({} total)",
                result.page_index, result.total_page, result.count
            );
            for module in result.data {
                println!(
                    "{}@{}:{} environment={} version={} status={} last-seen={}",
                    module.app_name,
                    module.ip,
                    module.port,
                    module.environment,
                    module.version,
                    module.status,
                    module.gmt_modified
                );
            }
        }
        Commands::SaveConfig {
            app,
            environment,
            config,
        } => {
            let saved = console
                .configs
                .save_or_update(SaveConfigParams {
                    app_name: app,
                    environment,
                    config,
                })
                .await?;
            println!("config saved: {}/{}", saved.app_name, saved.environment);
        }
        Commands::Push { app, environment } => {
            let outcome = console.distributor.push(&app, &environment).await?;
            if outcome.message().is_empty() {
                println!("pushed to {} instances", outcome.target_count);
            } else {
                println!("{}", outcome.message());
            }
        }
        Commands::Check => {
            let report = console.checker.check_environments().await?;
            println!(
                "{} of {} configs with issues",
                report.issue_count, report.total_configs
            );
            for detail in report.details {
                println!(
                    "{}/{} matched={} ({})",
                    detail.app_name, detail.environment, detail.matched, detail.suggestion
                );
            }
        }
        Commands::CheckMatch { app, environment } => {
            let report = console.checker.check_module_matches(&app, &environment).await?;
            println!(
                "has_matches={} count={} available=[{}]",
                report.has_matches,
                report.match_count,
                report.available_environments.join(", ")
            );
            for suggestion in report.suggestions {
                println!("- {suggestion}");
            }
        }
        Commands::Autofix => {
            let report = console.checker.auto_fix_environments().await?;
            println!("{}", report.summary());
        }
        Commands::InitConfig { path } => {
            cfg.save_to_file(&path)?;
            println!("configuration written to {path}");
        }
        Commands::ListConfigs { app, page, size } => {
            let result = console
                .configs
                .list(&ModuleConfigParams {
                    app_name: app,
                    environment: None,
                    page,
                    size,
                })
                .await?;
            for config in result.data {
                println!(
                    "{}/{} modified={}",
                    config.app_name, config.environment, config.gmt_modified
                );
            }
        }
    }

    repeater_console::shutdown_telemetry();
    Ok(())
}
