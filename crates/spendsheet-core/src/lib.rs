//! Core library for spendsheet: expense and budget records kept in a remote
//! spreadsheet endpoint, mirrored to a local cache, and summarized for display.
//!
//! - `api`: remote sheet client and row mapping
//! - `cache`: local JSON cache
//! - `store`: in-memory record store and its sync policy
//! - `aggregate`: totals, per-period and per-category sums, budget comparison
//! - `dashboard`: page controllers tying the above together

pub mod aggregate;
pub mod api;
pub mod cache;
pub mod config;
pub mod dashboard;
pub mod models;
pub mod store;
pub mod utils;

#[cfg(test)]
mod test_utils;

pub use config::Config;
