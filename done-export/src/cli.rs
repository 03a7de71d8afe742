///
/// This module implements the CLI interface for done-export: command parsing,
/// argument validation and the async entrypoint used by `main` and the tests.
///
/// All pipeline logic (query, fetch, CSV encoding, publishing and the run
/// state machine) lives in the [`done-export-core`] crate. This module only
/// wires configuration and concrete stores into it and reports the result.
///
/// ## How To Use
/// - For command-line users: use the installed `done-export` binary with `--help`.
/// - For programmatic/integration use: call [`run`] with a constructed [`Cli`].
///
/// [`done-export-core`]: ../../done-export-core/
use crate::load_config::load_config;
use crate::local_store::LocalFolderStore;
use crate::sharepoint::SharePointClient;
use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use done_export_core::config::ExportConfig;
use done_export_core::contract::DocumentStore;
use done_export_core::export::{prepare, ExportOutcome, Exporter};
use std::path::PathBuf;

/// CLI for done-export: archive completed list items as CSV.
#[derive(Parser)]
#[clap(
    name = "done-export",
    version,
    about = "Export completed SharePoint list items older than a threshold to a dated CSV file"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run one export using the given config file
    Export {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,

        /// Write the CSV below this local directory instead of the document library
        #[clap(long)]
        out_dir: Option<PathBuf>,

        /// Print the CSV to stdout without writing any file
        #[clap(long, conflicts_with = "out_dir")]
        dry_run: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Export {
            config,
            out_dir,
            dry_run,
        } => {
            let config = load_config(config)?;
            let client = SharePointClient::new_from_env()
                .map_err(|e| anyhow::anyhow!("Failed to construct SharePoint client: {e}"))?;

            if dry_run {
                tracing::info!(command = "export", dry_run, "Preparing export without upload");
                return dry_run_export(&config, &client).await;
            }

            tracing::info!(command = "export", ?out_dir, "Starting export");
            match out_dir {
                Some(dir) => execute(config, client, LocalFolderStore::new(dir)).await,
                None => {
                    let store = client.clone();
                    execute(config, client, store).await
                }
            }
        }
    }
}

async fn dry_run_export(config: &ExportConfig, client: &SharePointClient) -> Result<()> {
    let prepared = prepare(config, client, Utc::now()).await.map_err(|e| {
        tracing::error!(command = "export", error = %e, "Dry run failed");
        anyhow::Error::msg(e.to_string())
    })?;
    if prepared.rows.is_empty() {
        println!("Nothing to export.");
    } else {
        tracing::info!(rows = prepared.rows.len(), file = %prepared.file_name, "Dry run prepared");
        println!("{}", prepared.csv);
    }
    Ok(())
}

async fn execute<S: DocumentStore>(
    config: ExportConfig,
    client: SharePointClient,
    store: S,
) -> Result<()> {
    let exporter = Exporter::new(config, client, store);
    let outcome = exporter.run().await;
    for line in exporter.log() {
        println!("{line}");
    }

    match outcome {
        ExportOutcome::Completed { rows, file } => {
            tracing::info!(command = "export", rows, location = %file.location, "Export complete");
            Ok(())
        }
        ExportOutcome::NoRows => {
            tracing::info!(command = "export", "No rows matched");
            Ok(())
        }
        ExportOutcome::Failed { message } => {
            tracing::error!(command = "export", error = %message, "Export failed");
            Err(anyhow::Error::msg(message))
        }
        ExportOutcome::AlreadyRunning => Err(anyhow::anyhow!("An export is already running")),
    }
}
