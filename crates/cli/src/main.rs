//! Operator entrypoint for bookshelf.
//!
//! - `bookshelf-cli serve` runs the HTTP server
//! - `bookshelf-cli openapi [--pretty]` prints the merged OpenAPI document
//! - `bookshelf-cli config` prints the resolved settings as JSON

use std::path::PathBuf;

use anyhow::Context;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bookshelf-cli", version, about = "Bookshelf books API")]
struct Cli {
    /// Directory holding `base.toml` and per-environment overlays.
    #[arg(long, global = true, env = "BOOKSHELF_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    /// Environment overlay to apply (local, staging, production).
    #[arg(long, global = true, env = "BOOKSHELF_ENV", default_value = "local")]
    env: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server until interrupted
    Serve,
    /// Print the OpenAPI document
    Openapi {
        #[arg(long)]
        pretty: bool,
    },
    /// Print the resolved configuration
    Config,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<Settings> {
        let config_dir = match &self.config_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()
                .map(|cwd| cwd.join("config"))
                .with_context(|| "unable to resolve current directory")?,
        };

        Settings::load_from(&config_dir, &self.env)
            .with_context(|| format!("failed to load settings from {}", config_dir.display()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let settings = cli.settings()?;

    match cli.command {
        Command::Serve => {
            bookshelf_telemetry::init(&settings.telemetry)?;
            tracing::info!(
                env = ?settings.environment,
                backend = ?settings.database.backend,
                "starting bookshelf from CLI"
            );
            bookshelf_app::run(settings).await
        }
        Command::Openapi { pretty } => {
            let doc = bookshelf_app::openapi_document(&settings)?;
            let json = if pretty {
                doc.to_pretty_json()
            } else {
                doc.to_json()
            }
            .with_context(|| "failed to render OpenAPI document")?;
            println!("{json}");
            Ok(())
        }
        Command::Config => {
            let json = serde_json::to_string_pretty(&settings)
                .with_context(|| "failed to render settings")?;
            println!("{json}");
            Ok(())
        }
    }
}
