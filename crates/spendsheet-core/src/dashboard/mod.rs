//! Page controllers.
//!
//! Each dashboard owns one record store plus the view state around it
//! (selected period, loading flag, advisory status message) and exposes the
//! actions and queries a front-end needs. Queries take `today` so the
//! current-month filter is evaluated at call time.

pub mod budgets;
pub mod expenses;

use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::models::MAX_AMOUNT;
use crate::store::SyncEvent;

pub use budgets::{BudgetDashboard, BudgetForm};
pub use expenses::{ExpenseDashboard, ExpenseForm};

/// Parse a form amount. Empty, unparsable, negative and oversized input
/// yield `None`.
pub(crate) fn parse_amount(input: &str) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let amount = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return None;
    }
    (amount <= MAX_AMOUNT).then_some(amount)
}

/// Non-empty trimmed text, or `None`.
pub(crate) fn required(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// The last advisory among `events`, if any of them failed.
pub(crate) fn latest_advisory(events: &[SyncEvent]) -> Option<String> {
    events.iter().rev().find_map(SyncEvent::advisory)
}
