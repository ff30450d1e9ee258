//! CampLanka CLI - campground wishlists, trip plans and trip chat
//!
//! Works against a local document store file, acting as one configured user.

mod cli;
mod commands;
mod config;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::chat::run_chat;
use crate::commands::common::Workspace;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::favorite::run_favorite;
use crate::commands::plans::run_plans;
use crate::commands::wishlist::run_wishlist;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("camplanka_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let user = cli.user.as_deref();

    match cli.command {
        Commands::Wishlist { command } => {
            let workspace = Workspace::open(cli.data, user)?;
            run_wishlist(command, &workspace).await?;
        }
        Commands::Favorite {
            campground_id,
            name,
            location,
            rating,
        } => {
            let workspace = Workspace::open(cli.data, user)?;
            run_favorite(&campground_id, &name, location, rating, &workspace).await?;
        }
        Commands::Plans { command } => {
            let workspace = Workspace::open(cli.data, user)?;
            run_plans(command, &workspace).await?;
        }
        Commands::Chat { command } => {
            let workspace = Workspace::open(cli.data, user)?;
            run_chat(command, &workspace).await?;
        }
        Commands::Config { command } => run_config(command, user, cli.data)?,
        Commands::Completions { shell, output } => run_completions(shell, output.as_deref())?,
    }

    Ok(())
}
