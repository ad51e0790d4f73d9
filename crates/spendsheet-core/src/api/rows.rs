//! Positional row mapping between sheet rows and typed records.
//!
//! Expense row: `[id, description, amount, category, date, timestamp]`
//! Budget row:  `[id, category, amount, periodLabel, monthName, year, timestamp]`
//!
//! The sheet hands cells back as whatever type it inferred, so numbers may
//! arrive as JSON numbers or strings and dates as plain dates or full
//! timestamps.

use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate};
use rust_decimal::Decimal;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Budget, Category, Expense, MAX_AMOUNT};

use super::Sheet;

/// One row of cells as returned by the sheet endpoint.
pub type RawRow = Vec<Value>;

#[derive(Error, Debug, PartialEq)]
pub enum RowError {
    #[error("expected at least {expected} cells, found {found}")]
    TooShort { expected: usize, found: usize },

    #[error("cell {index}: {reason}")]
    BadCell { index: usize, reason: String },
}

/// A record that can be read from and written to a sheet row.
pub trait SheetRow: Sized {
    const SHEET: Sheet;

    fn from_row(row: &[Value]) -> Result<Self, RowError>;

    /// Cells written back to the sheet. `timestamp` marks the time of the write.
    fn to_row(&self, timestamp: &str) -> Vec<String>;
}

/// Result of mapping a sheet payload.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRows<R> {
    pub records: Vec<R>,
    /// Rows that could not be mapped, as cell text, in sheet order. They are
    /// written back unchanged so a save never erases them.
    pub unmapped: Vec<Vec<String>>,
}

/// Map a sheet payload to records. The first row is a header and is dropped.
pub fn rows_to_records<R: SheetRow>(data: Vec<RawRow>) -> MappedRows<R> {
    let mut records = Vec::with_capacity(data.len().saturating_sub(1));
    let mut unmapped = Vec::new();
    for (index, row) in data.iter().enumerate().skip(1) {
        match R::from_row(row) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(sheet = R::SHEET.name(), row = index, error = %e, "Keeping unmapped row as is");
                unmapped.push((0..row.len()).map(|i| cell_text(row, i)).collect());
            }
        }
    }
    debug!(
        sheet = R::SHEET.name(),
        count = records.len(),
        unmapped = unmapped.len(),
        "Mapped sheet rows"
    );
    MappedRows { records, unmapped }
}

fn require_len(row: &[Value], expected: usize) -> Result<(), RowError> {
    if row.len() < expected {
        return Err(RowError::TooShort {
            expected,
            found: row.len(),
        });
    }
    Ok(())
}

fn bad_cell(index: usize, reason: impl Into<String>) -> RowError {
    RowError::BadCell {
        index,
        reason: reason.into(),
    }
}

fn cell_text(row: &[Value], index: usize) -> String {
    match row.get(index) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn cell_i64(row: &[Value], index: usize) -> Result<i64, RowError> {
    let text = cell_text(row, index);
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }
    // Sheets sometimes render whole numbers as "2025.0"
    match trimmed.parse::<f64>() {
        Ok(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
        _ => Err(bad_cell(index, format!("not an integer: '{}'", trimmed))),
    }
}

fn cell_amount(row: &[Value], index: usize) -> Result<Decimal, RowError> {
    let text = cell_text(row, index);
    let trimmed = text.trim();
    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| bad_cell(index, format!("not a number: '{}'", trimmed)))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(bad_cell(index, "amount is negative"));
    }
    if amount > MAX_AMOUNT {
        return Err(bad_cell(index, "amount is too large"));
    }
    Ok(amount)
}

fn cell_category(row: &[Value], index: usize) -> Result<Category, RowError> {
    Category::from_str(&cell_text(row, index)).map_err(|e| bad_cell(index, e.to_string()))
}

fn cell_date(row: &[Value], index: usize) -> Result<NaiveDate, RowError> {
    let text = cell_text(row, index);
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    // Date cells come back as UTC timestamps of local midnight
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&Local).date_naive())
        .map_err(|_| bad_cell(index, format!("not a date: '{}'", trimmed)))
}

impl SheetRow for Expense {
    const SHEET: Sheet = Sheet::Expenses;

    fn from_row(row: &[Value]) -> Result<Self, RowError> {
        require_len(row, 5)?;
        // Month and year are recomputed from the date cell
        Ok(Expense::new(
            cell_i64(row, 0)?,
            cell_text(row, 1),
            cell_amount(row, 2)?,
            cell_category(row, 3)?,
            cell_date(row, 4)?,
        ))
    }

    fn to_row(&self, timestamp: &str) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.description.clone(),
            self.amount.to_string(),
            self.category.as_str().to_string(),
            self.date.format("%Y-%m-%d").to_string(),
            timestamp.to_string(),
        ]
    }
}

impl SheetRow for Budget {
    const SHEET: Sheet = Sheet::Budgets;

    fn from_row(row: &[Value]) -> Result<Self, RowError> {
        require_len(row, 6)?;
        let year = cell_i64(row, 5)?;
        let year = i32::try_from(year).map_err(|_| bad_cell(5, format!("year out of range: {}", year)))?;
        Ok(Budget {
            id: cell_i64(row, 0)?,
            category: cell_category(row, 1)?,
            amount: cell_amount(row, 2)?,
            month_year: cell_text(row, 3),
            month: cell_text(row, 4),
            year,
        })
    }

    fn to_row(&self, timestamp: &str) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.category.as_str().to_string(),
            self.amount.to_string(),
            self.month_year.clone(),
            self.month.clone(),
            self.year.to_string(),
            timestamp.to_string(),
        ]
    }
}
