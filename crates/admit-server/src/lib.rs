//! HTTP server assembly for the admission simulator.
//!
//! Wires the JSON API from `admit-api` onto a concrete router with request
//! tracing, and holds the runtime configuration shared by the binary's
//! subcommands.

pub mod commands;
pub mod error;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use admit_core::store::AdmissionStore;
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `ADMIT__*`
/// environment variables.
#[derive(Deserialize, Clone, Debug)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,
  /// Upserted into the store at startup.
  #[serde(default)]
  pub programs:   Vec<ProgramConfig>,
}

/// A program as written in the configuration file.
#[derive(Deserialize, Clone, Debug)]
pub struct ProgramConfig {
  pub code:     String,
  /// Defaults to the code.
  pub name:     Option<String>,
  pub capacity: u32,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 3000 }

fn default_store_path() -> PathBuf { PathBuf::from("admit.db") }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application [`Router`]: every API route at the root, traced.
pub fn router<S>(store: Arc<S>) -> Router
where
  S: AdmissionStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    .merge(admit_api::api_router(store))
    .layer(TraceLayer::new_for_http())
}
