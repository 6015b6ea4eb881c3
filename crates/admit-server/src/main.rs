//! admit-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, upserts the configured programs and then either
//! serves the JSON API or runs a single command.
//!
//! ```text
//! admit-server import --program PM --date 01.08.2025 roster.csv
//! admit-server calculate --date 2025-08-01
//! admit-server
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use admit_core::date::parse_date;
use admit_server::{ServerConfig, commands};
use admit_store_sqlite::SqliteStore;
use anyhow::Context as _;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Admission simulation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Load a program's CSV roster for one date.
  Import {
    #[arg(long)]
    program: String,
    /// `YYYY-MM-DD` or `DD.MM.YYYY`.
    #[arg(long, value_parser = parse_date)]
    date:    NaiveDate,
    file:    PathBuf,
  },
  /// Compute the passing scores for a date (or fetch stored ones) and print
  /// them as JSON.
  Calculate {
    #[arg(long, value_parser = parse_date)]
    date: NaiveDate,
  },
  /// Delete computed results for one date, or for every date.
  Clear {
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ADMIT").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  commands::sync_programs(&store, &server_cfg.programs)
    .await
    .context("failed to register configured programs")?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, &server_cfg).await,
    Command::Import { program, date, file } => {
      let summary = commands::import_file(&store, &program, date, &file)
        .await
        .with_context(|| format!("failed to import {file:?}"))?;
      println!("{}", serde_json::to_string_pretty(&summary)?);
      Ok(())
    }
    Command::Calculate { date } => {
      let result = commands::calculate(&store, date)
        .await
        .with_context(|| format!("failed to calculate passing scores for {date}"))?;
      println!("{}", serde_json::to_string_pretty(&result)?);
      Ok(())
    }
    Command::Clear { date } => {
      commands::clear(&store, date)
        .await
        .context("failed to clear results")?;
      Ok(())
    }
  }
}

async fn serve(store: SqliteStore, cfg: &ServerConfig) -> anyhow::Result<()> {
  let app = admit_server::router(Arc::new(store));
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
