//! Docaudit - Entry point
//!
//! Runs the document audit HTTP service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use docaudit_config::{ConfigLoader, DEFAULT_ENV_PREFIX};
use docaudit_engine::CommandEngine;
use docaudit_server::Server;
use tracing::info;

/// Default configuration file, read when present and `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "docaudit.toml";

/// Command-line arguments.
struct Args {
    /// Path to configuration file.
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let mut args = std::env::args().skip(1);
        let mut config = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    config = args.next().map(PathBuf::from);
                }
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("docaudit {}", docaudit_server::VERSION);
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {other}");
                    eprintln!("Use --help for usage information");
                    std::process::exit(1);
                }
            }
        }

        Self { config }
    }
}

fn print_help() {
    println!(
        r"Docaudit - Document Audit API

USAGE:
    docaudit [OPTIONS]

OPTIONS:
    -c, --config <PATH>    Path to configuration file (TOML or JSON)
    -h, --help             Print help information
    -v, --version          Print version information

Without --config, ./docaudit.toml is read if it exists. A .env file in the
working directory is loaded before environment overrides are applied.

ENVIRONMENT VARIABLES:
    DOCAUDIT__SERVER__HTTP_ADDR              Listen address (default: 0.0.0.0:8000)
    DOCAUDIT__SERVER__REQUEST_TIMEOUT_MS     Whole-request deadline (default: 600000)
    DOCAUDIT__UPLOAD__MAX_BODY_BYTES         Upload ceiling (default: 52428800)
    DOCAUDIT__UPLOAD__ACCEPTED_EXTENSIONS    Comma-separated list (default: .pdf,.txt)
    DOCAUDIT__STAGING__DIR                   Staging directory (default: OS temp dir)
    DOCAUDIT__ENGINE__PROGRAM                Analysis engine executable (default: python3)
    DOCAUDIT__ENGINE__ARGS                   Engine arguments (default: -m pipeline)
    DOCAUDIT__ENGINE__TIMEOUT_SECS           Engine deadline, 0 disables (default: 300)
    DOCAUDIT__LOGGING__LEVEL                 Log filter (default: info)
    DOCAUDIT__LOGGING__FORMAT                json or pretty (default: json)
    DOCAUDIT__METRICS__ENABLED               Serve Prometheus metrics (default: false)
    DOCAUDIT__METRICS__ADDR                  Metrics address (default: 0.0.0.0:9090)

EXAMPLES:
    docaudit --config /etc/docaudit/docaudit.toml
    DOCAUDIT__ENGINE__PROGRAM=/opt/audit/bin/engine docaudit
"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let loader = ConfigLoader::new().with_dotenv();
    let loader = match &args.config {
        Some(path) => loader.with_file(path)?,
        None => loader.with_optional_file(DEFAULT_CONFIG_FILE)?,
    };
    let config = loader
        .with_env_prefix(DEFAULT_ENV_PREFIX)
        .load()
        .context("failed to load configuration")?;

    docaudit_telemetry::init_logging(&config.logging.to_log_config())
        .context("failed to initialize logging")?;
    docaudit_telemetry::init_metrics(&config.metrics.to_metrics_config())
        .context("failed to initialize metrics")?;

    info!(version = docaudit_server::VERSION, "starting docaudit");
    info!(
        addr = %config.server.http_addr,
        engine = %config.engine.program,
        accepted = ?config.upload.accepted_extensions,
        "configuration loaded"
    );

    let engine = CommandEngine::new(config.engine.program.clone())
        .with_args(config.engine.args.clone());

    Server::from_config(&config, Arc::new(engine))
        .run()
        .await
        .context("server error")?;

    Ok(())
}
