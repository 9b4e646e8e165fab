//! Durable Store Module
//!
//! This module provides the SQLite persistence layer for the tracker:
//! - Connection pool bootstrap and schema migration
//! - The batch collection, with each batch's timeline embedded in its row

mod batches;
mod database;

#[cfg(test)]
mod tests;

pub use batches::{BatchStore, InsertOutcome};
pub use database::{connect, migrate};
