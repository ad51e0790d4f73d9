use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::aggregate::{self, BudgetComparison, BudgetUsage};
use crate::api::{RemoteStore, Sheet};
use crate::cache::CacheManager;
use crate::models::{
    next_id, upsert_budget, Budget, Category, Expense, Period, PeriodSelector, Upsert,
};
use crate::store::{LoadOutcome, SyncedStore};

use super::{latest_advisory, now_millis, parse_amount, required};

/// Raw input for a budget, as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BudgetForm {
    pub category: String,
    pub amount: String,
    pub month: String,
    pub year: String,
}

impl BudgetForm {
    /// Prefilled with the month and year of `today`.
    pub fn for_month(today: NaiveDate) -> Self {
        let period = Period::from_date(today);
        Self {
            month: period.month_name().to_string(),
            year: period.year.to_string(),
            ..Self::default()
        }
    }

    fn parse(&self) -> Option<(Category, Decimal, Period)> {
        let category = required(&self.category)?.parse().ok()?;
        let amount = parse_amount(&self.amount)?;
        let label = format!("{} {}", required(&self.month)?, required(&self.year)?);
        let period = Period::parse(&label)?;
        Some((category, amount, period))
    }
}

/// Budget page. Expenses are read from the local cache only and are never
/// written from here.
pub struct BudgetDashboard {
    store: SyncedStore<Budget>,
    cache: Arc<CacheManager>,
    expenses: Vec<Expense>,
    pub selected_period: PeriodSelector,
    pub is_loading: bool,
    pub status_message: Option<String>,
}

impl BudgetDashboard {
    pub fn new(cache: Arc<CacheManager>, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        Self {
            store: SyncedStore::new(Arc::clone(&cache), remote),
            cache,
            expenses: Vec::new(),
            selected_period: PeriodSelector::Current,
            is_loading: false,
            status_message: None,
        }
    }

    pub async fn load(&mut self) -> LoadOutcome {
        self.is_loading = true;
        self.expenses = self.cache.load_or_empty(Sheet::Expenses.cache_key());
        debug!(count = self.expenses.len(), "Loaded expenses from local cache");

        let outcome = self.store.load().await;
        self.is_loading = false;
        self.status_message = outcome.advisory.clone();
        outcome
    }

    /// Add a budget, or update the amount of the existing budget for the same
    /// category and period. Invalid input is ignored and returns `None`.
    pub fn add_budget(&mut self, form: &BudgetForm) -> Option<Upsert> {
        let Some((category, amount, period)) = form.parse() else {
            debug!("Ignoring incomplete budget form");
            return None;
        };

        let id = next_id(self.store.records(), now_millis());
        let entry = Budget::new(id, category, amount, period);
        let result = self.store.mutate(|records| upsert_budget(records, entry));
        info!(?result, category = category.as_str(), period = %period, "Budget saved");
        self.check_background_tasks();
        Some(result)
    }

    pub fn delete_budget(&mut self, id: i64) -> bool {
        let removed = self.store.remove_by_id(id);
        self.check_background_tasks();
        removed
    }

    pub fn set_period(&mut self, selector: PeriodSelector) {
        self.selected_period = selector;
    }

    pub fn check_background_tasks(&mut self) {
        let events = self.store.poll_events();
        if let Some(advisory) = latest_advisory(&events) {
            self.status_message = Some(advisory);
        }
    }

    pub async fn flush(&mut self) {
        self.store.flush().await;
        self.check_background_tasks();
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn budgets(&self) -> &[Budget] {
        self.store.records()
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn filtered_budgets(&self, today: NaiveDate) -> Vec<&Budget> {
        aggregate::filter_by_period(self.store.records(), &self.selected_period, today)
    }

    pub fn filtered_expenses(&self, today: NaiveDate) -> Vec<&Expense> {
        aggregate::filter_by_period(&self.expenses, &self.selected_period, today)
    }

    pub fn comparison(&self, today: NaiveDate) -> Vec<BudgetComparison> {
        aggregate::budget_comparison(self.filtered_budgets(today), self.filtered_expenses(today))
    }

    pub fn usage(&self, today: NaiveDate) -> Vec<BudgetUsage> {
        aggregate::budget_usage(self.filtered_budgets(today), self.filtered_expenses(today))
    }

    /// Period labels present in the budgets, oldest first.
    pub fn period_options(&self) -> Vec<String> {
        aggregate::unique_periods(self.store.records())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{budget, date, expense, remote_handle, temp_cache, FakeRemote};
    use rust_decimal_macros::dec;

    fn form(category: &str, amount: &str, month: &str, year: &str) -> BudgetForm {
        BudgetForm {
            category: category.into(),
            amount: amount.into(),
            month: month.into(),
            year: year.into(),
        }
    }

    #[tokio::test]
    async fn test_second_add_updates_amount() {
        let (_dir, cache) = temp_cache();
        let remote = Arc::new(FakeRemote::default());
        let mut dashboard = BudgetDashboard::new(cache.clone(), remote_handle(&remote));

        let first = dashboard.add_budget(&form("Food", "500000", "January", "2025")).unwrap();
        let second = dashboard.add_budget(&form("Food", "750000", "January", "2025")).unwrap();
        dashboard.flush().await;

        let Upsert::Inserted(id) = first else {
            panic!("expected insert, got {:?}", first);
        };
        assert_eq!(second, Upsert::Updated(id));
        assert_eq!(dashboard.budgets().len(), 1);
        assert_eq!(dashboard.budgets()[0].amount, dec!(750000));

        let cached = cache.load_or_empty::<Budget>("budgets");
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].amount, dec!(750000));

        let writes = remote.writes();
        let last = &writes.last().unwrap().1;
        assert_eq!(last.len(), 1);
        assert_eq!(last[0][2], "750000");
    }

    #[tokio::test]
    async fn test_invalid_budget_form_is_ignored() {
        let (_dir, cache) = temp_cache();
        let mut dashboard = BudgetDashboard::new(cache, None);

        assert!(dashboard.add_budget(&form("Food", "", "January", "2025")).is_none());
        assert!(dashboard.add_budget(&form("Food", "-10", "January", "2025")).is_none());
        assert!(dashboard.add_budget(&form("Food", "10", "Smarch", "2025")).is_none());
        assert!(dashboard.add_budget(&form("", "10", "January", "2025")).is_none());
        assert!(dashboard.budgets().is_empty());
    }

    #[test]
    fn test_form_prefills_month() {
        let form = BudgetForm::for_month(date(2025, 4, 9));
        assert_eq!(form.month, "April");
        assert_eq!(form.year, "2025");
        assert!(form.amount.is_empty());
    }

    #[tokio::test]
    async fn test_expenses_come_from_local_cache() {
        let (_dir, cache) = temp_cache();
        cache
            .save("expenses", &[expense(1, dec!(1200000), Category::Food, date(2025, 1, 10))])
            .unwrap();
        cache
            .save("budgets", &[budget(2, Category::Food, dec!(1000000), "January 2025")])
            .unwrap();

        let mut dashboard = BudgetDashboard::new(cache, None);
        dashboard.load().await;
        let today = date(2025, 1, 31);

        assert_eq!(dashboard.expenses().len(), 1);
        let comparison = dashboard.comparison(today);
        assert_eq!(comparison.len(), 1);
        assert_eq!(comparison[0].percent_used, dec!(120));
        assert_eq!(comparison[0].display_percent, dec!(100));
        assert!(comparison[0].over_budget);

        let usage = dashboard.usage(today);
        assert_eq!(usage[0].label(), "Over by 20%");
    }

    #[tokio::test]
    async fn test_default_period_is_current_month() {
        let (_dir, cache) = temp_cache();
        cache
            .save(
                "budgets",
                &[
                    budget(1, Category::Bills, dec!(100), "January 2025"),
                    budget(2, Category::Bills, dec!(200), "February 2025"),
                ],
            )
            .unwrap();
        let mut dashboard = BudgetDashboard::new(cache, None);
        dashboard.load().await;

        let in_february = dashboard.filtered_budgets(date(2025, 2, 14));
        assert_eq!(in_february.iter().map(|b| b.id).collect::<Vec<_>>(), vec![2]);

        dashboard.set_period(PeriodSelector::All);
        assert_eq!(dashboard.filtered_budgets(date(2025, 2, 14)).len(), 2);
        assert_eq!(dashboard.period_options(), vec!["January 2025", "February 2025"]);
    }

    #[tokio::test]
    async fn test_delete_budget() {
        let (_dir, cache) = temp_cache();
        cache
            .save("budgets", &[budget(1, Category::Bills, dec!(100), "January 2025")])
            .unwrap();
        let mut dashboard = BudgetDashboard::new(cache.clone(), None);
        dashboard.load().await;

        assert!(dashboard.delete_budget(1));
        assert!(cache.load_or_empty::<Budget>("budgets").is_empty());
    }
}
