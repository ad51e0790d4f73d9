//! Data models for expenses and budgets.
//!
//! - `Expense`, `Budget`: the two record types, one per subsystem
//! - `Category`: the closed category set shared by both
//! - `Period`, `PeriodSelector`: month + year grouping and filtering

pub mod budget;
pub mod category;
pub mod expense;
pub mod period;

use rust_decimal::Decimal;

pub use budget::{upsert_budget, Budget, Upsert};
pub use category::Category;
pub use expense::Expense;
pub use period::{Period, PeriodSelector};

/// Largest amount accepted from a form or a sheet cell (10^15).
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(2_764_472_320, 232_830, 0, false, 0);

/// Fields the aggregation engine and the record store need from a record.
pub trait Record {
    fn id(&self) -> i64;
    fn category(&self) -> Category;
    fn amount(&self) -> Decimal;
    /// "<Month> <Year>" label the record is grouped under.
    fn period_label(&self) -> String;
}

/// Id for a new record: the creation time in milliseconds, bumped past the
/// largest existing id when two records are created within the same tick.
pub fn next_id<R: Record>(records: &[R], now_millis: i64) -> i64 {
    let max_existing = records.iter().map(Record::id).max().unwrap_or(i64::MIN);
    if now_millis > max_existing {
        now_millis
    } else {
        max_existing + 1
    }
}
