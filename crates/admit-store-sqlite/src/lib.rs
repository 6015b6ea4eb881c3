//! SQLite backend for the admission simulator.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every multi-statement write runs inside
//! a single SQLite transaction.

mod encode;
mod schema;
mod source;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
