//! Utility functions for display formatting.

pub mod format;

pub use format::{format_amount, format_percent, truncate_string};
