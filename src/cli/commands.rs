use crate::bootstrap;
use crate::config::RouterConfig;
use crate::dispatcher::Dispatcher;
use crate::echo::register_echo_handlers;
use crate::logging;
use crate::middleware::{MetricsMiddleware, TracingMiddleware};
use crate::router::RouteTable;
use crate::runtime_config::RuntimeConfig;
use crate::spec;
use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const METRICS_REPORT_INTERVAL: Duration = Duration::from_secs(60);

/// Command-line interface for the RAML router
#[derive(Parser)]
#[command(name = "ramlrouter", version)]
#[command(about = "Serve, inspect and check RAML-defined HTTP routes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the server with echo handlers for every route
    Serve {
        /// JSON or YAML file with `ramlString`, `ramlFile`, `port`, `bodyLimit`
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// RAML file, overrides the config file and `RAMLR_RAML_FILE`
        #[arg(short, long)]
        raml: Option<PathBuf>,

        /// Listener port, overrides the config file and `RAMLR_PORT`
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print the compiled route table
    Routes {
        /// Same config file `serve` accepts
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// RAML file, overrides the config file and `RAMLR_RAML_FILE`
        #[arg(short, long)]
        raml: Option<PathBuf>,
    },
    /// Load and compile the specification `serve` would use, failing on any startup error
    Check {
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long)]
        raml: Option<PathBuf>,
    },
}

/// Merge configuration sources: file, then environment, then flags.
pub fn resolve_config(
    config: Option<&PathBuf>,
    raml: Option<&PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<RouterConfig> {
    let mut cfg = match config {
        Some(path) => RouterConfig::from_file(path)?,
        None => RouterConfig::default(),
    }
    .apply_env();
    if let Some(raml) = raml {
        cfg.raml_file = raml.clone();
        cfg.raml_string = None;
    }
    if let Some(port) = port {
        cfg.port = port;
    }
    Ok(cfg)
}

/// Where the specification of `cfg` comes from, for messages.
fn describe_source(cfg: &RouterConfig) -> String {
    match cfg.inline_raml() {
        Some(_) => "ramlString".to_string(),
        None => cfg.raml_file.display().to_string(),
    }
}

fn compile_config(cfg: &RouterConfig) -> anyhow::Result<RouteTable> {
    let source = describe_source(cfg);
    let spec = spec::load(cfg).with_context(|| format!("loading {source}"))?;
    RouteTable::compile(&spec).with_context(|| format!("compiling {source}"))
}

/// # Errors
///
/// Returns an error if the specification cannot be loaded or compiled, logging cannot be
/// initialized, or the listener fails to bind.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve { config, raml, port } => {
            let _log_guard = logging::init_logging()?;
            let cfg = resolve_config(config.as_ref(), raml.as_ref(), port)?;
            let runtime = RuntimeConfig::from_env();
            runtime.apply();

            let table = bootstrap::prepare(&cfg)?;
            let mut dispatcher = Dispatcher::new()
                .with_body_limit(cfg.body_limit)
                .with_stack_size(runtime.stack_size);
            dispatcher.add_middleware(Arc::new(TracingMiddleware));
            let metrics = Arc::new(MetricsMiddleware::new());
            dispatcher.add_middleware(metrics.clone());
            // SAFETY: the may runtime is configured above and echo handlers are pure.
            unsafe { register_echo_handlers(&mut dispatcher, &table)? };

            let running = bootstrap::start_with_table(&cfg, table, Arc::new(dispatcher))?;
            metrics
                .clone()
                .spawn_reporter(METRICS_REPORT_INTERVAL)
                .context("failed to start metrics reporter")?;
            let joined = running
                .server
                .join()
                .map_err(|_| anyhow!("server coroutine terminated abnormally"));
            metrics.log_summary();
            joined
        }
        Commands::Routes { config, raml } => {
            let cfg = resolve_config(config.as_ref(), raml.as_ref(), None)?;
            let table = compile_config(&cfg)?;
            table.dump_routes();
            Ok(())
        }
        Commands::Check { config, raml } => {
            let cfg = resolve_config(config.as_ref(), raml.as_ref(), None)?;
            let table = compile_config(&cfg)?;
            println!("OK: {} ({} routes)", describe_source(&cfg), table.len());
            Ok(())
        }
    }
}
