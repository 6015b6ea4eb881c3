//! JSON REST API for the admission simulator.
//!
//! Exposes an axum [`Router`] backed by any
//! [`admit_core::store::AdmissionStore`]. TLS and transport concerns are the
//! caller's responsibility.
//!
//! Dates in query strings accept both `YYYY-MM-DD` and `DD.MM.YYYY`.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", admit_api::api_router(store.clone()))
//! ```

pub mod candidates;
pub mod error;
pub mod programs;
pub mod reports;
pub mod results;
pub mod roster;

mod params;

use std::sync::Arc;

use admit_core::store::AdmissionStore;
use axum::{
  Router,
  routing::{get, post},
};

pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: AdmissionStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Programs
    .route("/programs", get(programs::list::<S>).post(programs::upsert::<S>))
    // Rosters
    .route("/upload", post(roster::upload::<S>))
    .route("/lists", get(roster::list::<S>))
    // Computed results
    .route("/calculate", get(results::calculate::<S>))
    .route("/allocations", get(results::allocations::<S>))
    .route("/passing-scores", get(results::passing_scores::<S>))
    .route("/clear-results", post(results::clear_results::<S>))
    .route("/clear", post(results::clear_all::<S>))
    // Reports
    .route("/statistics", get(reports::statistics::<S>))
    .route("/overlaps", get(reports::overlaps::<S>))
    .route("/report", get(reports::report::<S>))
    // Candidates
    .route("/candidates", get(candidates::search::<S>))
    .route("/candidates/{id}", get(candidates::get_one::<S>))
    .with_state(store)
}
