//! Local caching module for offline data access.
//!
//! This module provides the `CacheManager`, the durable mirror of the last
//! known record lists. It is read when the remote sheet cannot be reached
//! and written on every mutation.
//!
//! Cached keys:
//! - `expenses`
//! - `budgets`

pub mod manager;

pub use manager::CacheManager;
