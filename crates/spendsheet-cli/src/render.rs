//! Plain-text reports for the terminal.

use std::fmt::Write;

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use spendsheet_core::aggregate::{
    BudgetComparison, BudgetUsage, CategoryTotal, PeriodTotal, UsageLevel,
};
use spendsheet_core::dashboard::{BudgetDashboard, ExpenseDashboard};
use spendsheet_core::models::period::{month_options, year_options};
use spendsheet_core::models::Expense;
use spendsheet_core::utils::{format_amount, format_percent, truncate_string};

/// Width of the usage bars, in characters
const BAR_WIDTH: usize = 20;

/// Longest description shown in the expense list
const DESCRIPTION_WIDTH: usize = 28;

pub fn expense_report(dashboard: &ExpenseDashboard, today: NaiveDate) -> String {
    let period = dashboard.selected_period.display_label(today);
    let listed = dashboard.listed_expenses(today);

    let mut out = String::new();
    let _ = writeln!(out, "Expenses: {}", period);
    let _ = writeln!(out, "Total: {}\n", format_amount(dashboard.total(today)));
    out.push_str(&expense_table(&listed, &period));
    out.push('\n');
    out.push_str(&monthly_table(&dashboard.monthly_totals(today)));
    out.push('\n');
    out.push_str(&category_table(&dashboard.category_totals(today)));
    out
}

pub fn budget_report(dashboard: &BudgetDashboard, today: NaiveDate) -> String {
    let period = dashboard.selected_period.display_label(today);

    let mut out = String::new();
    let _ = writeln!(out, "Budgets: {}\n", period);
    out.push_str(&usage_table(&dashboard.usage(today), &period));
    out.push('\n');
    out.push_str(&comparison_table(&dashboard.comparison(today)));
    out
}

pub fn period_report(
    expense_periods: &[String],
    budget_periods: &[String],
    today: NaiveDate,
) -> String {
    let mut out = String::new();
    out.push_str("Expense periods:\n");
    push_list(&mut out, expense_periods);
    out.push_str("Budget periods:\n");
    push_list(&mut out, budget_periods);

    let years: Vec<String> = year_options(today).iter().map(i32::to_string).collect();
    let _ = writeln!(out, "\nNew budgets may use months {}", month_options().join(", "));
    let _ = writeln!(out, "and years {}", years.join(", "));
    out
}

fn push_list(out: &mut String, items: &[String]) {
    if items.is_empty() {
        out.push_str("  (none)\n");
    }
    for item in items {
        let _ = writeln!(out, "  {}", item);
    }
}

pub fn expense_table(expenses: &[&Expense], period: &str) -> String {
    if expenses.is_empty() {
        return format!("No expenses recorded for {}\n", period);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<15} {:<10} {:<28} {:<15} {:>16}",
        "ID", "Date", "Description", "Category", "Amount"
    );
    for expense in expenses {
        let _ = writeln!(
            out,
            "{:<15} {:<10} {:<28} {:<15} {:>16}",
            expense.id,
            expense.date.format("%Y-%m-%d").to_string(),
            truncate_string(&expense.description, DESCRIPTION_WIDTH),
            expense.category.as_str(),
            format_amount(expense.amount)
        );
    }
    out
}

pub fn monthly_table(points: &[PeriodTotal]) -> String {
    let mut out = String::from("By month:\n");
    if points.is_empty() {
        out.push_str("  (none)\n");
    }
    for point in points {
        let _ = writeln!(out, "  {:<16} {:>16}", point.period, format_amount(point.total));
    }
    out
}

pub fn category_table(points: &[CategoryTotal]) -> String {
    let mut out = String::from("By category:\n");
    for point in points {
        let _ = writeln!(out, "  {:<16} {:>16}", point.category.as_str(), format_amount(point.total));
    }
    out
}

pub fn usage_table(rows: &[BudgetUsage], period: &str) -> String {
    if rows.is_empty() {
        return format!("No budgets set for {}\n", period);
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<15} {:<15} {:>16} {:>16} {:>16}  {}",
        "ID", "Category", "Budget", "Spent", "Remaining", "Used"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "{:<15} {:<15} {:>16} {:>16} {:>16}  {} {}{}",
            row.budget_id,
            row.category.as_str(),
            format_amount(row.budget),
            format_amount(row.spent),
            format_amount(row.remaining),
            bar(row.display_percent()),
            row.label(),
            level_marker(row.level)
        );
    }
    out
}

pub fn comparison_table(rows: &[BudgetComparison]) -> String {
    let mut out = String::from("Budget vs. actual:\n");
    if rows.is_empty() {
        out.push_str("  (nothing to compare)\n");
    }
    for row in rows {
        let flag = if row.over_budget { "  over budget" } else { "" };
        let _ = writeln!(
            out,
            "  {:<15} {:>16} / {:<16} {} {}{}",
            row.category.as_str(),
            format_amount(row.actual),
            format_amount(row.budget),
            bar(row.display_percent),
            format_percent(row.percent_used),
            flag
        );
    }
    out
}

fn level_marker(level: UsageLevel) -> &'static str {
    match level {
        UsageLevel::Healthy => "",
        UsageLevel::Warning => "  (!)",
        UsageLevel::Over => "  (!!)",
    }
}

/// Fixed-width bar for a percentage in 0..=100.
fn bar(percent: Decimal) -> String {
    let clamped = percent.max(Decimal::ZERO).min(Decimal::ONE_HUNDRED);
    let filled = (clamped * Decimal::from(BAR_WIDTH) / Decimal::ONE_HUNDRED)
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use spendsheet_core::models::Category;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(dec!(0)), format!("[{}]", ".".repeat(20)));
        assert_eq!(bar(dec!(50)), format!("[{}{}]", "#".repeat(10), ".".repeat(10)));
        assert_eq!(bar(dec!(250)), format!("[{}]", "#".repeat(20)));
    }

    #[test]
    fn test_expense_table() {
        let lunch = Expense::new(1, "Lunch".into(), dec!(45000), Category::Food, date(2025, 1, 15));
        let table = expense_table(&[&lunch], "January 2025");
        assert!(table.contains("Lunch"));
        assert!(table.contains("Rp 45,000"));
        assert!(table.contains("2025-01-15"));
    }

    #[test]
    fn test_empty_expense_table() {
        assert_eq!(expense_table(&[], "All months"), "No expenses recorded for All months\n");
    }

    #[test]
    fn test_comparison_table_marks_overspend() {
        let rows = vec![BudgetComparison {
            category: Category::Food,
            budget: dec!(1000000),
            actual: dec!(1200000),
            percent_used: dec!(120),
            display_percent: dec!(100),
            over_budget: true,
        }];
        let table = comparison_table(&rows);
        assert!(table.contains("120%"));
        assert!(table.contains("over budget"));
        assert!(table.contains("Rp 1,200,000 / Rp 1,000,000"));
    }

    #[test]
    fn test_period_report_lists_options() {
        let report = period_report(&["January 2025".to_string()], &[], date(2025, 6, 1));
        assert!(report.contains("  January 2025\n"));
        assert!(report.contains("Budget periods:\n  (none)\n"));
        assert!(report.contains("years 2025, 2026"));
    }
}
