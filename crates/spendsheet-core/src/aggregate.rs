//! Derived summaries over record lists.
//!
//! Everything here is a pure function of its inputs and is recomputed on
//! every query. Nothing is cached, so a change to the records or to the
//! wall-clock month is reflected the next time a view asks.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::period::sort_labels;
use crate::models::{Category, PeriodSelector, Record};

/// Usage above this percentage is flagged as a warning.
const WARNING_PERCENT: Decimal = Decimal::from_parts(80, 0, 0, false, 0);

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodTotal {
    pub period: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: Category,
    pub total: Decimal,
}

/// Budget against actual spend for one category.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetComparison {
    pub category: Category,
    pub budget: Decimal,
    pub actual: Decimal,
    /// `actual / budget * 100`, not clamped; zero when there is no budget.
    pub percent_used: Decimal,
    /// `percent_used` capped at 100, for bar fills.
    pub display_percent: Decimal,
    pub over_budget: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageLevel {
    Healthy,
    Warning,
    Over,
}

/// One budget record with the spend recorded against it.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetUsage {
    pub budget_id: i64,
    pub category: Category,
    pub budget: Decimal,
    pub spent: Decimal,
    /// Negative when overspent.
    pub remaining: Decimal,
    pub percent_used: Decimal,
    pub level: UsageLevel,
}

impl BudgetUsage {
    pub fn display_percent(&self) -> Decimal {
        self.percent_used.min(Decimal::ONE_HUNDRED)
    }

    /// "Over by 20%" past the budget, otherwise the whole percentage used.
    pub fn label(&self) -> String {
        if self.level == UsageLevel::Over {
            if self.budget.is_zero() {
                return "Over budget".to_string();
            }
            let over = whole_percent(self.percent_used.saturating_sub(Decimal::ONE_HUNDRED));
            return format!("Over by {}%", over);
        }
        format!("{}%", whole_percent(self.percent_used))
    }
}

fn whole_percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// `actual / budget * 100`, or zero when the budget is not positive.
/// Saturates at `Decimal::MAX` when the ratio is not representable.
pub fn percent_used(actual: Decimal, budget: Decimal) -> Decimal {
    if budget > Decimal::ZERO {
        actual
            .checked_div(budget)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::MAX)
    } else {
        Decimal::ZERO
    }
}

// Sums saturate instead of overflowing; cached records are not range-checked.
fn sum(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

fn usage_level(spent: Decimal, budget: Decimal) -> UsageLevel {
    let percent = percent_used(spent, budget);
    if percent > Decimal::ONE_HUNDRED || (budget.is_zero() && spent > Decimal::ZERO) {
        UsageLevel::Over
    } else if percent > WARNING_PERCENT {
        UsageLevel::Warning
    } else {
        UsageLevel::Healthy
    }
}

/// Records whose period label matches the selector, in their original order.
pub fn filter_by_period<'a, R: Record>(
    records: &'a [R],
    selector: &PeriodSelector,
    today: NaiveDate,
) -> Vec<&'a R> {
    match selector.resolve(today) {
        None => records.iter().collect(),
        Some(label) => records.iter().filter(|r| r.period_label() == label).collect(),
    }
}

pub fn total<'a, R: Record + 'a>(records: impl IntoIterator<Item = &'a R>) -> Decimal {
    sum(records.into_iter().map(Record::amount))
}

/// Sum per period label, one point per observed period, oldest first.
pub fn monthly_totals<'a, R: Record + 'a>(
    records: impl IntoIterator<Item = &'a R>,
) -> Vec<PeriodTotal> {
    let mut sums: HashMap<String, Decimal> = HashMap::new();
    for record in records {
        let entry = sums.entry(record.period_label()).or_insert(Decimal::ZERO);
        *entry = entry.saturating_add(record.amount());
    }

    let mut periods: Vec<String> = sums.keys().cloned().collect();
    sort_labels(&mut periods);

    periods
        .into_iter()
        .map(|period| {
            let total = sums.get(&period).copied().unwrap_or(Decimal::ZERO);
            PeriodTotal { period, total }
        })
        .collect()
}

/// Sum per category, one point for every category in the fixed order,
/// including categories with nothing recorded.
pub fn category_totals<'a, R: Record + 'a>(
    records: impl IntoIterator<Item = &'a R>,
) -> Vec<CategoryTotal> {
    let mut sums = [Decimal::ZERO; Category::ALL.len()];
    for record in records {
        let slot = &mut sums[record.category().index()];
        *slot = slot.saturating_add(record.amount());
    }

    Category::ALL
        .iter()
        .map(|&category| CategoryTotal {
            category,
            total: sums[category.index()],
        })
        .collect()
}

/// Budget vs. actual per category. Both inputs should already be filtered to
/// the same period. When several budgets match a category the one latest in
/// the list wins. Categories with neither budget nor spend are left out.
pub fn budget_comparison<'a, 'b, B, E>(
    budgets: impl IntoIterator<Item = &'a B>,
    expenses: impl IntoIterator<Item = &'b E>,
) -> Vec<BudgetComparison>
where
    B: Record + 'a,
    E: Record + 'b,
{
    let mut budget_by_category = [Decimal::ZERO; Category::ALL.len()];
    for budget in budgets {
        budget_by_category[budget.category().index()] = budget.amount();
    }
    let actuals = category_totals(expenses);

    actuals
        .into_iter()
        .map(|actual| {
            let budget = budget_by_category[actual.category.index()];
            let percent = percent_used(actual.total, budget);
            BudgetComparison {
                category: actual.category,
                budget,
                actual: actual.total,
                percent_used: percent,
                display_percent: percent.min(Decimal::ONE_HUNDRED),
                over_budget: budget > Decimal::ZERO && actual.total > budget,
            }
        })
        .filter(|c| !(c.budget.is_zero() && c.actual.is_zero()))
        .collect()
}

/// Usage of each budget record against the spend in its category. Both
/// inputs should already be filtered to the same period.
pub fn budget_usage<'a, 'b, B, E>(
    budgets: impl IntoIterator<Item = &'a B>,
    expenses: impl IntoIterator<Item = &'b E>,
) -> Vec<BudgetUsage>
where
    B: Record + 'a,
    E: Record + 'b,
{
    let spent_by_category = category_totals(expenses);

    budgets
        .into_iter()
        .map(|budget| {
            let amount = budget.amount();
            let spent = spent_by_category[budget.category().index()].total;
            BudgetUsage {
                budget_id: budget.id(),
                category: budget.category(),
                budget: amount,
                spent,
                remaining: amount.saturating_sub(spent),
                percent_used: percent_used(spent, amount),
                level: usage_level(spent, amount),
            }
        })
        .collect()
}

/// Distinct period labels across the records, oldest first.
pub fn unique_periods<'a, R: Record + 'a>(records: impl IntoIterator<Item = &'a R>) -> Vec<String> {
    let distinct: BTreeSet<String> = records.into_iter().map(Record::period_label).collect();
    let mut periods: Vec<String> = distinct.into_iter().collect();
    sort_labels(&mut periods);
    periods
}

// ============================================================================
// Tests
// ============================================================================
