#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for inspecting a remote IMAP repository

use clap::{Parser, Subcommand};
use imap_repository::{Folder, FolderHandle, Repository, RepositoryConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imap-repo")]
#[command(about = "Inspect a remote IMAP repository")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the discovered folders
    Folders,

    /// Create a folder
    Mkdir {
        /// Folder name (created literally, no reference prefix)
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let config = RepositoryConfig::from_env()?;
    let repo = Repository::new("cli", config)?;

    match &args.command {
        Command::Folders => cmd_folders(&repo, &args).await?,
        Command::Mkdir { name } => cmd_mkdir(&repo, name).await?,
    }

    repo.hold_or_drop_connections().await;
    Ok(())
}

async fn cmd_folders(repo: &Repository, args: &Args) -> anyhow::Result<()> {
    let folders = repo.folders().await?;
    let display: Vec<&Folder> = folders.iter().map(AsRef::as_ref).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&display)?);
    } else {
        for folder in &folders {
            if folder.visible_name() == folder.name() {
                println!("{folder}");
            } else {
                println!("{} (remote: {})", folder.visible_name(), folder.name());
            }
        }
        println!("\n{} folder(s)", folders.len());
    }

    Ok(())
}

async fn cmd_mkdir(repo: &Repository, name: &str) -> anyhow::Result<()> {
    repo.make_folder(name).await?;
    println!("Created folder {name}");
    Ok(())
}
