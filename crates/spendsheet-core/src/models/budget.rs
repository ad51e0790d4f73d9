use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Category, Period, Record};

/// A spending ceiling for one category in one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub category: Category,
    pub amount: Decimal,
    /// Period key, e.g. "January 2025". `month` and `year` repeat it.
    #[serde(rename = "monthYear")]
    pub month_year: String,
    pub month: String,
    pub year: i32,
}

impl Budget {
    pub fn new(id: i64, category: Category, amount: Decimal, period: Period) -> Self {
        Self {
            id,
            category,
            amount,
            month_year: period.label(),
            month: period.month_name().to_string(),
            year: period.year,
        }
    }
}

impl Record for Budget {
    fn id(&self) -> i64 {
        self.id
    }

    fn category(&self) -> Category {
        self.category
    }

    fn amount(&self) -> Decimal {
        self.amount
    }

    fn period_label(&self) -> String {
        self.month_year.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted(i64),
    Updated(i64),
}

/// Insert a budget, or overwrite the amount of the existing budget for the
/// same category and period. Keeps at most one budget per (category, period).
pub fn upsert_budget(budgets: &mut Vec<Budget>, entry: Budget) -> Upsert {
    if let Some(existing) = budgets
        .iter_mut()
        .find(|b| b.category == entry.category && b.month_year == entry.month_year)
    {
        existing.amount = entry.amount;
        return Upsert::Updated(existing.id);
    }

    let id = entry.id;
    budgets.push(entry);
    Upsert::Inserted(id)
}
