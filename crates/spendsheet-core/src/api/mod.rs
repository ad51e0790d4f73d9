//! Remote store adapter for the spreadsheet-backed endpoint.
//!
//! `RemoteStore` is the seam the synchronization layer talks to;
//! `SheetClient` is its HTTP implementation. Row mapping between sheet
//! cells and typed records lives in `rows`.

pub mod client;
pub mod error;
pub mod rows;

use async_trait::async_trait;

pub use client::SheetClient;
pub use error::ApiError;
pub use rows::{rows_to_records, MappedRows, RawRow, RowError, SheetRow};

/// The two sheets behind the endpoint, one per subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sheet {
    Expenses,
    Budgets,
}

/// How a sheet's rows are encoded on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteEncoding {
    /// `{"data": rows}` as the request body
    Json,
    /// `action=saveData&sheet=<name>&data=<json rows>`
    Form,
}

impl Sheet {
    pub fn name(&self) -> &'static str {
        match self {
            Sheet::Expenses => "Expenses",
            Sheet::Budgets => "Budgets",
        }
    }

    /// Key of the local cache entry mirroring this sheet.
    pub fn cache_key(&self) -> &'static str {
        match self {
            Sheet::Expenses => "expenses",
            Sheet::Budgets => "budgets",
        }
    }

    /// Key of the cache entry holding rows that could not be mapped.
    pub fn unmapped_cache_key(&self) -> &'static str {
        match self {
            Sheet::Expenses => "expenses_unmapped",
            Sheet::Budgets => "budgets_unmapped",
        }
    }

    /// Value of the `sheet` discriminator. The expense sheet is the
    /// endpoint's default and is addressed without one.
    pub fn query_name(&self) -> Option<&'static str> {
        match self {
            Sheet::Expenses => None,
            Sheet::Budgets => Some("Budgets"),
        }
    }

    // The deployed endpoint parses each sheet's writes differently, so the
    // encodings are kept as they are.
    pub fn write_encoding(&self) -> WriteEncoding {
        match self {
            Sheet::Expenses => WriteEncoding::Json,
            Sheet::Budgets => WriteEncoding::Form,
        }
    }
}

impl std::fmt::Display for Sheet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name().to_lowercase())
    }
}

/// Read and write access to the remote copy of a sheet.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Every row of the sheet, header row first.
    async fn fetch_rows(&self, sheet: Sheet) -> Result<Vec<RawRow>, ApiError>;

    /// Replace the sheet with `rows`. `Ok` means the write was handed to the
    /// endpoint, not that it was applied.
    async fn persist_rows(&self, sheet: Sheet, rows: Vec<Vec<String>>) -> Result<(), ApiError>;
}
