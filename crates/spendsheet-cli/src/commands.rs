//! Command-line parsing and dispatch.

use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use spendsheet_core::api::{RemoteStore, Sheet, SheetClient};
use spendsheet_core::cache::CacheManager;
use spendsheet_core::dashboard::{BudgetDashboard, BudgetForm, ExpenseDashboard, ExpenseForm};
use spendsheet_core::models::period::month_options;
use spendsheet_core::models::{PeriodSelector, Upsert};
use spendsheet_core::Config;

use crate::render;

const AFTER_HELP: &str = "\
Periods: current, all, or \"<Month> <Year>\" (e.g. \"Jan 2025\")

Categories: Food, Transportation, Shopping, Entertainment, Bills, Children, Other

Config keys: endpoint_url, budgets_endpoint_url, cache_dir, request_timeout_secs

Environment:
  SPENDSHEET_ENDPOINT          remote sheet endpoint (local-only when unset)
  SPENDSHEET_BUDGETS_ENDPOINT  separate endpoint for budgets
  SPENDSHEET_CACHE_DIR         local cache directory
  RUST_LOG                     log filter, e.g. debug";

/// Track expenses and monthly budgets from the terminal.
#[derive(Debug, Parser)]
#[command(name = "spendsheet", version, after_help = AFTER_HELP)]
pub struct Cli {
    /// Lists all expenses when omitted
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// List expenses, all months unless a period is given
    #[command(args_conflicts_with_subcommands = true)]
    Expenses {
        #[command(subcommand)]
        action: Option<ExpenseAction>,
        period: Vec<String>,
    },
    /// Show budget usage, this month unless a period is given
    #[command(args_conflicts_with_subcommands = true)]
    Budgets {
        #[command(subcommand)]
        action: Option<BudgetAction>,
        period: Vec<String>,
    },
    /// List the periods that have records
    Periods,
    /// Show the effective configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Debug, Subcommand)]
enum ExpenseAction {
    /// Record an expense
    Add {
        description: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
        category: String,
        /// YYYY-MM-DD, defaults to today
        date: Option<String>,
    },
    /// Delete an expense by id
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
enum BudgetAction {
    /// Set the budget for a category and month
    Add {
        category: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// "<Month> <Year>", defaults to this month
        period: Vec<String>,
    },
    /// Delete a budget by id
    Delete { id: i64 },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Write a key to the config file; no value clears it
    Set { key: String, value: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Expenses(PeriodSelector),
    AddExpense(ExpenseForm),
    DeleteExpense(i64),
    Budgets(PeriodSelector),
    AddBudget(BudgetForm),
    DeleteBudget(i64),
    Periods,
    ShowConfig,
    SetConfig { key: String, value: String },
}

impl Cli {
    /// Resolve parsed arguments into a command. `today` fills in the
    /// defaulted dates and months.
    pub fn into_command(self, today: NaiveDate) -> Result<Command> {
        let Some(command) = self.command else {
            return Ok(Command::Expenses(PeriodSelector::All));
        };

        match command {
            CliCommand::Expenses { action: None, period } => {
                Ok(Command::Expenses(selector(&period, PeriodSelector::All)))
            }
            CliCommand::Expenses {
                action: Some(ExpenseAction::Add { description, amount, category, date }),
                ..
            } => Ok(Command::AddExpense(ExpenseForm {
                description,
                amount,
                category,
                date: date.unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
            })),
            CliCommand::Expenses {
                action: Some(ExpenseAction::Delete { id }),
                ..
            } => Ok(Command::DeleteExpense(id)),
            CliCommand::Budgets { action: None, period } => {
                Ok(Command::Budgets(selector(&period, PeriodSelector::Current)))
            }
            CliCommand::Budgets {
                action: Some(BudgetAction::Add { category, amount, period }),
                ..
            } => budget_form(category, amount, &period, today).map(Command::AddBudget),
            CliCommand::Budgets {
                action: Some(BudgetAction::Delete { id }),
                ..
            } => Ok(Command::DeleteBudget(id)),
            CliCommand::Periods => Ok(Command::Periods),
            CliCommand::Config { action: None } => Ok(Command::ShowConfig),
            CliCommand::Config {
                action: Some(ConfigAction::Set { key, value }),
            } => Ok(Command::SetConfig {
                key,
                value: value.join(" "),
            }),
        }
    }
}

fn selector(args: &[String], default: PeriodSelector) -> PeriodSelector {
    if args.is_empty() {
        return default;
    }
    args.join(" ")
        .parse()
        .unwrap_or_else(|never: std::convert::Infallible| match never {})
}

fn budget_form(category: String, amount: String, period: &[String], today: NaiveDate) -> Result<BudgetForm> {
    let mut form = BudgetForm::for_month(today);
    form.category = category;
    form.amount = amount;

    if !period.is_empty() {
        let joined = period.join(" ");
        let parts: Vec<&str> = joined.split_whitespace().collect();
        let [month, year] = parts.as_slice() else {
            bail!(
                "period must be '<Month> <Year>', months: {}",
                month_options().join(", ")
            );
        };
        form.month = month.to_string();
        form.year = year.to_string();
    }
    Ok(form)
}

/// Write one field to the config file. Environment overrides are not saved.
pub fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;
    println!("Saved {} to {}", key, Config::config_path()?.display());
    Ok(())
}

/// Print the effective configuration, overrides included.
pub fn show_config(config: &Config) -> Result<()> {
    let unset = || "(not set)".to_string();
    println!("Config file: {}", Config::config_path()?.display());
    println!(
        "Expenses endpoint: {}",
        config.endpoint_for(Sheet::Expenses).map_or_else(unset, str::to_string)
    );
    println!(
        "Budgets endpoint:  {}",
        config.endpoint_for(Sheet::Budgets).map_or_else(unset, str::to_string)
    );
    println!("Cache directory:   {}", config.cache_dir()?.display());
    println!(
        "Request timeout:   {}",
        config
            .request_timeout()
            .map_or_else(|| "none".to_string(), |t| format!("{}s", t.as_secs()))
    );
    Ok(())
}

/// Shared handles for building dashboards.
pub struct Context {
    cache: Arc<CacheManager>,
    expenses_remote: Option<Arc<dyn RemoteStore>>,
    budgets_remote: Option<Arc<dyn RemoteStore>>,
}

impl Context {
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        let cache = CacheManager::new(cache_dir.clone())
            .with_context(|| format!("Failed to open cache at {}", cache_dir.display()))?;

        Ok(Self {
            cache: Arc::new(cache),
            expenses_remote: remote_for(config, Sheet::Expenses)?,
            budgets_remote: remote_for(config, Sheet::Budgets)?,
        })
    }

    fn expense_dashboard(&self) -> ExpenseDashboard {
        ExpenseDashboard::new(Arc::clone(&self.cache), self.expenses_remote.clone())
    }

    fn budget_dashboard(&self) -> BudgetDashboard {
        BudgetDashboard::new(Arc::clone(&self.cache), self.budgets_remote.clone())
    }
}

fn remote_for(config: &Config, sheet: Sheet) -> Result<Option<Arc<dyn RemoteStore>>> {
    let Some(endpoint) = config.endpoint_for(sheet) else {
        debug!(sheet = sheet.name(), "No endpoint configured, running local-only");
        return Ok(None);
    };
    let client: Arc<dyn RemoteStore> =
        Arc::new(SheetClient::new(endpoint, config.request_timeout())?);
    Ok(Some(client))
}

fn report_status(status: Option<&str>) {
    if let Some(message) = status {
        eprintln!("Note: {}", message);
    }
}

pub async fn run(command: Command, config: &Config, today: NaiveDate) -> Result<()> {
    match command {
        Command::ShowConfig => return show_config(config),
        Command::SetConfig { key, value } => return set_config(&key, &value),
        _ => {}
    }

    info!(
        remote = config.endpoint_for(Sheet::Expenses).is_some(),
        "spendsheet starting"
    );
    let context = Context::from_config(config)?;

    match command {
        Command::Expenses(selector) => {
            let mut dashboard = context.expense_dashboard();
            dashboard.load().await;
            dashboard.set_period(selector);
            print!("{}", render::expense_report(&dashboard, today));
            report_status(dashboard.status_message.as_deref());
        }
        Command::AddExpense(form) => {
            let mut dashboard = context.expense_dashboard();
            dashboard.load().await;
            match dashboard.add_expense(&form) {
                Some(id) => println!("Added expense {}", id),
                None => println!("Nothing added: check the amount, category and date"),
            }
            dashboard.flush().await;
            report_status(dashboard.status_message.as_deref());
        }
        Command::DeleteExpense(id) => {
            let mut dashboard = context.expense_dashboard();
            dashboard.load().await;
            if dashboard.delete_expense(id) {
                println!("Deleted expense {}", id);
            } else {
                println!("No expense with id {}", id);
            }
            dashboard.flush().await;
            report_status(dashboard.status_message.as_deref());
        }
        Command::Budgets(selector) => {
            let mut dashboard = context.budget_dashboard();
            dashboard.load().await;
            dashboard.set_period(selector);
            print!("{}", render::budget_report(&dashboard, today));
            report_status(dashboard.status_message.as_deref());
        }
        Command::AddBudget(form) => {
            let mut dashboard = context.budget_dashboard();
            dashboard.load().await;
            match dashboard.add_budget(&form) {
                Some(Upsert::Inserted(id)) => {
                    println!("Added budget {} for {} {} {}", id, form.category, form.month, form.year)
                }
                Some(Upsert::Updated(id)) => println!("Updated budget {}", id),
                None => println!("Nothing added: check the category, amount and period"),
            }
            dashboard.flush().await;
            report_status(dashboard.status_message.as_deref());
        }
        Command::DeleteBudget(id) => {
            let mut dashboard = context.budget_dashboard();
            dashboard.load().await;
            if dashboard.delete_budget(id) {
                println!("Deleted budget {}", id);
            } else {
                println!("No budget with id {}", id);
            }
            dashboard.flush().await;
            report_status(dashboard.status_message.as_deref());
        }
        Command::Periods => {
            let mut expenses = context.expense_dashboard();
            let mut budgets = context.budget_dashboard();
            expenses.load().await;
            budgets.load().await;
            print!(
                "{}",
                render::period_report(&expenses.period_options(), &budgets.period_options(), today)
            );
            report_status(expenses.status_message.as_deref());
            report_status(budgets.status_message.as_deref());
        }
        Command::ShowConfig | Command::SetConfig { .. } => {}
    }
    Ok(())
}
