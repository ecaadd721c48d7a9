//! Archivo CLI: bulk uploader for the Archivo media API.
//!
//! Set ARCHIVO_API_URL (or API_URL) and ARCHIVO_API_TOKEN (or API_TOKEN).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use archivo_api_client::ApiClient;
use archivo_cli::{init_tracing, render_queue, spawn_cancel_watcher, ConsoleObserver};
use archivo_core::{DirectoryId, ModuleId, RepositoryId, Scope, SessionOptions};
use archivo_uploader::intake::local::{dropped_entry, pick_files, pick_folder};
use archivo_uploader::{IntakeSource, SchedulerError, UploadSession};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::warn;

#[derive(Parser)]
#[command(name = "archivo", about = "Archivo bulk uploader")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ScopeArgs {
    /// Repository ID
    #[arg(long = "repo")]
    repository: RepositoryId,
    /// Module ID
    #[arg(long)]
    module: ModuleId,
    /// Directory ID to upload into (default: repository root)
    #[arg(long)]
    directory: Option<DirectoryId>,
}

impl ScopeArgs {
    fn scope(&self) -> Scope {
        Scope::new(self.repository, Some(self.module), self.directory)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files and folders into a module
    Upload {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Upload everything flat into the target directory
        #[arg(long)]
        no_preserve_folders: bool,
        /// Refuse to queue files if existing assets could not be listed
        #[arg(long)]
        block_on_stale_index: bool,
        /// Files chosen as with a multi-file picker
        #[arg(long, num_args = 1..)]
        files: Vec<PathBuf>,
        /// Folders chosen as with a folder picker
        #[arg(long, num_args = 1..)]
        folder: Vec<PathBuf>,
        /// Print the final queue as JSON
        #[arg(long)]
        json: bool,
        /// Files and folders, treated like a drag-and-drop
        paths: Vec<PathBuf>,
    },
    /// List the duplicate keys of assets already stored at a scope
    Index {
        #[command(flatten)]
        scope: ScopeArgs,
    },
    /// Show a module's type, allowed formats and picker filter
    Module {
        /// Module ID
        id: ModuleId,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

async fn build_sources(
    paths: Vec<PathBuf>,
    files: Vec<PathBuf>,
    folders: Vec<PathBuf>,
) -> anyhow::Result<Vec<IntakeSource>> {
    let mut sources = Vec::new();

    let mut dropped = Vec::with_capacity(paths.len());
    for path in &paths {
        match dropped_entry(path).await {
            Ok(entry) => dropped.push(entry),
            Err(err) => warn!(error = %err, "Ignoring dropped path"),
        }
    }
    if !dropped.is_empty() {
        sources.push(IntakeSource::Dropped(dropped));
    }

    if !files.is_empty() {
        let picked = pick_files(&files).await.context("Failed to read picked files")?;
        sources.push(IntakeSource::FilePicker(picked));
    }

    for folder in &folders {
        let picked = pick_folder(folder)
            .await
            .with_context(|| format!("Failed to read folder {}", folder.display()))?;
        sources.push(IntakeSource::FolderPicker(picked));
    }

    Ok(sources)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let client = ApiClient::from_env().context(
        "Failed to create API client. Set ARCHIVO_API_URL (or API_URL) and ARCHIVO_API_TOKEN",
    )?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Upload {
            scope,
            no_preserve_folders,
            block_on_stale_index,
            files,
            folder,
            json,
            paths,
        } => {
            let module = client
                .get_module(scope.module)
                .await
                .with_context(|| format!("Failed to load module {}", scope.module))?;

            let env_options = SessionOptions::from_env();
            let options = SessionOptions {
                preserve_folders: env_options.preserve_folders && !no_preserve_folders,
                block_on_stale_index: env_options.block_on_stale_index || block_on_stale_index,
            };

            let mut session =
                UploadSession::new(Arc::new(client), scope.scope(), Some(module), options);
            if let Err(err) = session.refresh_index().await {
                eprintln!("Warning: {}", err);
            }

            let sources = build_sources(paths, files, folder).await?;
            let report = session.add(sources).await?;
            for message in report.messages() {
                eprintln!("{}\n", message);
            }

            let watcher = spawn_cancel_watcher(session.control());
            let result = session.start_batch(&ConsoleObserver::new()).await;
            watcher.abort();

            let batch = match result {
                Ok(batch) => batch,
                Err(SchedulerError::NothingPending) => {
                    eprintln!("No pending files");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };

            if json {
                print_json(&serde_json::json!({
                    "report": batch,
                    "items": session.queue().items(),
                }))?;
            } else {
                println!("{}", render_queue(session.queue()));
            }

            if batch.failed > 0 || batch.cancelled > 0 {
                std::process::exit(1);
            }
        }
        Commands::Index { scope } => {
            let module = client
                .get_module(scope.module)
                .await
                .with_context(|| format!("Failed to load module {}", scope.module))?;
            let mut session = UploadSession::new(
                Arc::new(client),
                scope.scope(),
                Some(module),
                SessionOptions::default(),
            );
            session
                .refresh_index()
                .await
                .context("Failed to list existing assets")?;

            let index = session.index();
            print_json(&serde_json::json!({
                "scope": session.scope(),
                "resource": session.module_type().resource(),
                "count": index.len(),
                "keys": index.keys(),
            }))?;
        }
        Commands::Module { id } => {
            let module = client
                .get_module(id)
                .await
                .with_context(|| format!("Failed to load module {}", id))?;
            print_json(&serde_json::json!({
                "module": module,
                "resource": module.module_type.resource(),
                "accept": module.accept_filter(),
            }))?;
        }
    }

    Ok(())
}
