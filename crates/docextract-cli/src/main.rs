//! docextract command-line interface.
//!
//! `docextract serve` runs the HTTP service; `docextract extract` runs a
//! single local file through the same pipeline and prints the response body.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use docextract::{ExtractionRequest, Operation, Orchestrator, RequestHints, ServerConfig};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "docextract=info,tower_http=info";

#[derive(Parser)]
#[command(name = "docextract", version, about = "Document metadata and text extraction service", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Host address to bind (overrides config and DOCEXTRACT_HOST)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to listen on (overrides config and DOCEXTRACT_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Configuration file (.toml, .yaml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Extract from a local file and print the JSON body to stdout
    Extract {
        /// Document to extract from
        path: PathBuf,

        /// Operation: metadata, text or fulldata
        #[arg(long, default_value = "fulldata", value_parser = parse_operation)]
        op: Operation,

        /// Declared content type, e.g. "text/plain; charset=ISO-8859-1"
        #[arg(long)]
        content_type: Option<String>,

        /// Configuration file (.toml, .yaml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

fn parse_operation(value: &str) -> std::result::Result<Operation, String> {
    Operation::from_str(value).map_err(|_| format!("unknown operation '{}' (expected metadata, text or fulldata)", value))
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.init(),
    }
}

fn load_config(path: Option<&Path>) -> Result<ServerConfig> {
    let mut config = match path {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ServerConfig::discover()
            .context("Failed to discover configuration")?
            .unwrap_or_default(),
    };
    config.apply_env_overrides();
    Ok(config)
}

async fn serve(host: Option<String>, port: Option<u16>, config: Option<PathBuf>) -> Result<()> {
    let mut config = load_config(config.as_deref())?;
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    docextract::api::serve(config).await.context("Server failed")
}

async fn extract(path: PathBuf, op: Operation, content_type: Option<String>, config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let orchestrator = Orchestrator::from_config(&config).context("Failed to build extraction pipeline")?;

    let content = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut hints = RequestHints::new().with_content_length(content.len().to_string());
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        hints = hints.with_file_name(name);
    }
    if let Some(content_type) = content_type {
        hints = hints.with_content_type(content_type);
    }

    tracing::debug!(path = %path.display(), operation = %op, bytes = content.len(), "Extracting document");

    match orchestrator.respond(ExtractionRequest::upload(op, content, hints)).await {
        Ok(response) => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&response.body)?;
            stdout.write_all(b"\n")?;
            stdout.flush()?;
            Ok(())
        }
        Err(failure) => bail!("{} (HTTP {})", failure, failure.kind.status_code()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Serve { host, port, config } => serve(host, port, config).await,
        Commands::Extract {
            path,
            op,
            content_type,
            config,
        } => extract(path, op, content_type, config).await,
    }
}
