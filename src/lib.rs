pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod metadata;
pub mod provider;
pub mod schema;
pub mod stream;
pub mod table;
pub mod temporal;
pub mod tokenizer;

use std::{env, fs, path::Path, sync::OnceLock};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::{LevelFilter, debug, info};
use serde::Serialize;

use crate::{
    cli::{Cli, Commands, ConnectionArgs, HintArgs, OutputFormat},
    error::{ErrorCode, Outcome},
    metadata::FileMetadata,
    provider::{ObjectStoreAdapter, StorageProvider},
    schema::FormatHints,
    tokenizer::CsvTokenizer,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("dwh_sampler", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Starting async runtime")?;
    runtime.block_on(dispatch(cli.command))
}

async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::TestConnection(args) => handle_test_connection(&args).await,
        Commands::Folders(args) => handle_folders(&args).await,
        Commands::Files(args) => handle_files(&args).await,
        Commands::Read(args) => handle_read(&args).await,
        Commands::Sample(args) => handle_sample(&args).await,
        Commands::Infer(args) => handle_infer(&args).await,
    }
}

/// Prints `result` in the requested format. Structured formats always print
/// the envelope; failures still end the process with an error.
fn emit<T, E>(
    format: OutputFormat,
    result: Result<T, E>,
    render: impl FnOnce(&T) -> String,
) -> Result<()>
where
    T: Serialize,
    E: ErrorCode + std::error::Error + Send + Sync + 'static,
{
    let outcome = match format {
        OutputFormat::Table => {
            print!("{}", render(&result?));
            return Ok(());
        }
        OutputFormat::Json => {
            let outcome = Outcome::from(result);
            println!("{}", config::to_json_string(&outcome)?);
            outcome
        }
        OutputFormat::Yaml => {
            let outcome = Outcome::from(result);
            print!("{}", config::to_yaml_string(&outcome)?);
            outcome
        }
    };
    match outcome {
        Outcome::Success { .. } => Ok(()),
        Outcome::Failure { code, message } => Err(anyhow!("{code}: {message}")),
    }
}

fn load_connection(args: &ConnectionArgs) -> Result<credentials::ProviderCredentials> {
    let credentials = config::load_credentials(&args.credentials)?;
    debug!("Loaded credentials {credentials:?}");
    Ok(credentials)
}

fn resolve_hints(args: &HintArgs) -> Result<FormatHints> {
    match &args.hints_file {
        Some(path) => config::load_hints(path),
        None => Ok(args.to_hints()),
    }
}

fn tokenizer_for(args: &HintArgs) -> CsvTokenizer {
    match args.delimiter {
        Some(delimiter) => CsvTokenizer::new().with_delimiter(delimiter),
        None => CsvTokenizer::new(),
    }
}

fn save_metadata(metadata: &FileMetadata, destination: Option<&Path>) -> Result<()> {
    if let Some(path) = destination {
        metadata
            .save(path)
            .with_context(|| format!("Writing metadata to {path:?}"))?;
        info!("Metadata for {} column(s) written to {path:?}", metadata.columns.len());
    }
    Ok(())
}

async fn handle_test_connection(args: &ConnectionArgs) -> Result<()> {
    let credentials = load_connection(args)?;
    info!(
        "Testing connection to {}://{}",
        credentials.provider_name(),
        credentials.bucket()
    );
    let result = provider::test_connection(&credentials).await;
    emit(args.format, result, |_| "Connection OK\n".to_string())
}

async fn handle_folders(args: &ConnectionArgs) -> Result<()> {
    let credentials = load_connection(args)?;
    let result = provider::list_folders(&credentials).await;
    emit(args.format, result, |folders| table::render_folders(folders))
}

async fn handle_files(args: &cli::FilesArgs) -> Result<()> {
    let credentials = load_connection(&args.connection)?;
    let result = provider::list_files(&credentials, &args.prefix).await;
    emit(args.connection.format, result, |files| table::render_files(files))
}

async fn handle_read(args: &cli::ReadArgs) -> Result<()> {
    let credentials = load_connection(&args.connection)?;
    let result = provider::read_text(&credentials, &args.path, args.max_size).await;
    match (&args.output, result) {
        (Some(output), Ok(content)) => {
            fs::write(output, &content).with_context(|| format!("Writing content to {output:?}"))?;
            info!("Wrote {} byte(s) of '{}' to {output:?}", content.len(), args.path);
            Ok(())
        }
        (_, result) => emit(args.connection.format, result, |content| content.clone()),
    }
}

async fn handle_sample(args: &cli::SampleArgs) -> Result<()> {
    let credentials = load_connection(&args.connection)?;
    let hints = resolve_hints(&args.hints)?;
    let tokenizer = tokenizer_for(&args.hints);
    let result = match provider::connect(&credentials) {
        Ok(adapter) => {
            metadata::sample_file_metadata_with(&adapter, &tokenizer, &args.path, &hints).await
        }
        Err(err) => Err(err.into()),
    };
    if let Ok(metadata) = &result {
        save_metadata(metadata, args.meta.as_deref())?;
    }
    emit(args.connection.format, result, table::render_metadata)
}

async fn handle_infer(args: &cli::InferArgs) -> Result<()> {
    let hints = resolve_hints(&args.hints)?;
    let tokenizer = tokenizer_for(&args.hints);
    let file_name = args
        .input
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow!("Input {:?} does not name a file", args.input))?;
    let directory = match args.input.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let adapter = ObjectStoreAdapter::local(directory)
        .with_context(|| format!("Opening directory {directory:?}"))?;
    info!("Sampling '{}' from {}", file_name, adapter.label());
    let store: &dyn StorageProvider = &adapter;
    let result = metadata::sample_file_metadata_with(store, &tokenizer, file_name, &hints).await;
    if let Ok(metadata) = &result {
        save_metadata(metadata, args.meta.as_deref())?;
    }
    emit(args.format, result, table::render_metadata)
}
