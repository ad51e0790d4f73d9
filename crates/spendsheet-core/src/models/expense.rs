use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Category, Period, Record};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub description: String,
    pub amount: Decimal,
    pub category: Category,
    pub date: NaiveDate,
    /// Month name derived from `date` when the record was created.
    /// Stored rather than re-derived, so grouping follows what was recorded.
    pub month: String,
    pub year: i32,
}

impl Expense {
    pub fn new(
        id: i64,
        description: String,
        amount: Decimal,
        category: Category,
        date: NaiveDate,
    ) -> Self {
        let period = Period::from_date(date);
        Self {
            id,
            description,
            amount,
            category,
            date,
            month: period.month_name().to_string(),
            year: period.year,
        }
    }
}

impl Record for Expense {
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
        format!("{} {}", self.month, self.year)
    }
}
