use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::debug;

use crate::aggregate::{self, CategoryTotal, PeriodTotal};
use crate::api::RemoteStore;
use crate::cache::CacheManager;
use crate::models::{next_id, Category, Expense, PeriodSelector};
use crate::store::{LoadOutcome, SyncedStore};

use super::{latest_advisory, now_millis, parse_amount, required};

/// Raw input for a new expense, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseForm {
    pub description: String,
    pub amount: String,
    pub category: String,
    /// YYYY-MM-DD
    pub date: String,
}

impl ExpenseForm {
    /// Validated fields, or `None` if anything required is missing or invalid.
    fn parse(&self) -> Option<(String, Decimal, Category, NaiveDate)> {
        let description = required(&self.description)?.to_string();
        let amount = parse_amount(&self.amount)?;
        let category = required(&self.category)?.parse().ok()?;
        let date = NaiveDate::parse_from_str(required(&self.date)?, "%Y-%m-%d").ok()?;
        Some((description, amount, category, date))
    }
}

pub struct ExpenseDashboard {
    store: SyncedStore<Expense>,
    pub selected_period: PeriodSelector,
    pub is_loading: bool,
    pub status_message: Option<String>,
}

impl ExpenseDashboard {
    pub fn new(cache: Arc<CacheManager>, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        Self {
            store: SyncedStore::new(cache, remote),
            selected_period: PeriodSelector::All,
            is_loading: false,
            status_message: None,
        }
    }

    pub async fn load(&mut self) -> LoadOutcome {
        self.is_loading = true;
        let outcome = self.store.load().await;
        self.is_loading = false;
        self.status_message = outcome.advisory.clone();
        outcome
    }

    /// Add an expense from form input. Invalid input is ignored and
    /// returns `None`; otherwise the new record's id.
    pub fn add_expense(&mut self, form: &ExpenseForm) -> Option<i64> {
        let Some((description, amount, category, date)) = form.parse() else {
            debug!("Ignoring incomplete expense form");
            return None;
        };

        let id = next_id(self.store.records(), now_millis());
        let expense = Expense::new(id, description, amount, category, date);
        self.store.mutate(|records| records.push(expense));
        self.check_background_tasks();
        Some(id)
    }

    pub fn delete_expense(&mut self, id: i64) -> bool {
        let removed = self.store.remove_by_id(id);
        self.check_background_tasks();
        removed
    }

    pub fn set_period(&mut self, selector: PeriodSelector) {
        self.selected_period = selector;
    }

    /// Pick up outcomes of background saves and surface failures.
    pub fn check_background_tasks(&mut self) {
        let events = self.store.poll_events();
        if let Some(advisory) = latest_advisory(&events) {
            self.status_message = Some(advisory);
        }
    }

    /// Wait for pending remote saves, then surface their outcomes.
    pub async fn flush(&mut self) {
        self.store.flush().await;
        self.check_background_tasks();
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn expenses(&self) -> &[Expense] {
        self.store.records()
    }

    pub fn filtered_expenses(&self, today: NaiveDate) -> Vec<&Expense> {
        aggregate::filter_by_period(self.store.records(), &self.selected_period, today)
    }

    /// Filtered expenses for listing, newest date first.
    pub fn listed_expenses(&self, today: NaiveDate) -> Vec<&Expense> {
        let mut listed = self.filtered_expenses(today);
        listed.sort_by(|a, b| b.date.cmp(&a.date));
        listed
    }

    pub fn total(&self, today: NaiveDate) -> Decimal {
        aggregate::total(self.filtered_expenses(today))
    }

    pub fn monthly_totals(&self, today: NaiveDate) -> Vec<PeriodTotal> {
        aggregate::monthly_totals(self.filtered_expenses(today))
    }

    pub fn category_totals(&self, today: NaiveDate) -> Vec<CategoryTotal> {
        aggregate::category_totals(self.filtered_expenses(today))
    }

    /// Period labels present in the expenses, oldest first.
    pub fn period_options(&self) -> Vec<String> {
        aggregate::unique_periods(self.store.records())
    }
}

// ============================================================================
// Tests
// ============================================================================
