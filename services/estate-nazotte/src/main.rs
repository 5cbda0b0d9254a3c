use clap::{Parser, Subcommand};
use estate_cache::EstateCache;
use estate_config::{SearchConfig, ServiceConfig};
use estate_core::{ErrorCode, EstateError, EstateResult};
use estate_observability::{init, log_startup, ObservabilityConfig};
use estate_search::{decode_polygon, EstateSearch};
use estate_storage_postgres::{PostgresConfig, PostgresStore};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;

#[derive(Debug, Parser)]
#[command(name = "estate-nazotte", about = "Polygon search and lookups over the estate table")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search estates inside a polygon read as `{"coordinates": [...]}` JSON.
    Search {
        /// Request body file, or `-` for stdin.
        #[arg(default_value = "-")]
        input: PathBuf,
        /// Override the configured result cap.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print estates by id; repeated ids are answered from the cache.
    Show {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Record a document request for an estate.
    RequestDoc { id: String, email: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = ServiceConfig::from_env("estate-nazotte");
    let obs_config = ObservabilityConfig {
        service_name: config.service_name.clone(),
        environment: config.environment.to_string(),
        region: config.region.clone(),
        log_level: config.log_level.clone(),
        metrics_addr: config.metrics_addr.clone(),
    };
    let handle = init(&obs_config);
    log_startup(&handle, &obs_config.environment);

    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(code = ?err.code, error = %err.message, "command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> EstateResult<()> {
    let store = PostgresStore::connect(&PostgresConfig::from_env())
        .await
        .map_err(|err| EstateError::new(ErrorCode::Unavailable, err.message))?;
    let search_config = SearchConfig::from_env();
    let search = EstateSearch::new(store, Arc::new(EstateCache::new()), search_config);

    match command {
        Command::Search { input, limit } => {
            let body = read_input(&input).await?;
            let polygon = decode_polygon(&body)?;
            let limit = limit.unwrap_or(search_config.nazotte_limit);
            let response = search.search_within_polygon(&polygon, limit).await?;
            print_json(&response)
        }
        Command::Show { ids } => {
            for id in &ids {
                let estate = search.estate_detail(id).await?;
                print_json(&estate)?;
            }
            Ok(())
        }
        Command::RequestDoc { id, email } => {
            let body = serde_json::json!({ "email": email }).to_string();
            search.request_document(&id, body.as_bytes()).await?;
            Ok(())
        }
    }
}

async fn read_input(input: &Path) -> EstateResult<Vec<u8>> {
    let result = if input.as_os_str() == "-" {
        let mut body = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut body)
            .await
            .map(|_| body)
    } else {
        tokio::fs::read(input).await
    };
    result.map_err(|err| {
        EstateError::new(
            ErrorCode::InvalidInput,
            format!("failed to read {}: {err}", input.display()),
        )
    })
}

fn print_json<T: Serialize>(value: &T) -> EstateResult<()> {
    let rendered = serde_json::to_string(value)
        .map_err(|err| EstateError::new(ErrorCode::Internal, err.to_string()))?;
    println!("{rendered}");
    Ok(())
}
