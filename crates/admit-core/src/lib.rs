//! Core types, algorithms and trait definitions for the admission simulator.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! allocation engine and passing-score deriver are pure functions over a
//! [`simulation::SimulationSource`]; persistence backends implement
//! [`store::AdmissionStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod allocation;
pub mod candidate;
pub mod date;
pub mod error;
pub mod overlap;
pub mod passing_score;
pub mod preference;
pub mod program;
pub mod ranking;
pub mod report;
pub mod simulation;
pub mod store;

pub use error::{Error, Result};
