use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::error::Result;
use crate::firefly::{Budget, Category, DateRange, Ledger, Transaction, TransactionType};

use super::format::{amount, format_entries, is_excluded, key_value, money, section};
use super::format::{LedgerEntry, NOTHING_TO_REPORT};

const BUDGETS_TITLE: &str = "🟢 Budgets: 🟢";
const CATEGORIES_TITLE: &str = "🟢 Categories: 🟢";
const SUMMARY_TITLE: &str = "🟢 Summary: 🟢";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetMode {
    /// Month-to-date spending against the full limit.
    Plain,
    /// Spending inside the report range against a prorated share of the limit.
    Periodic,
}

pub async fn budgets(
    ledger: &dyn Ledger,
    range: DateRange,
    exclude: &[String],
    mode: BudgetMode,
) -> Result<String> {
    let budgets = ledger.budgets(range.month_to_date()).await?;
    let lines = match mode {
        BudgetMode::Plain => plain_budget_lines(&budgets, exclude),
        BudgetMode::Periodic => {
            let transactions = ledger.transactions(range, TransactionType::All).await?;
            let spent = spent_by_budget(&transactions);
            periodic_budget_lines(&budgets, exclude, &spent, range)
        }
    };
    Ok(section(BUDGETS_TITLE, &or_nothing(lines)))
}

pub async fn categories(
    ledger: &dyn Ledger,
    range: DateRange,
    exclude: &[String],
) -> Result<String> {
    let categories = ledger.categories(range).await?;
    Ok(section(
        CATEGORIES_TITLE,
        &or_nothing(category_lines(categories, exclude)),
    ))
}

/// Withdrawal and deposit totals, optionally split by source account.
pub async fn summary(ledger: &dyn Ledger, range: DateRange, by_account: bool) -> Result<String> {
    let mut lines = Vec::new();
    for kind in [TransactionType::Withdrawal, TransactionType::Deposit] {
        let transactions = ledger.transactions(range, kind).await?;
        lines.extend(summary_lines(kind, &transactions, by_account));
    }
    Ok(section(SUMMARY_TITLE, &lines))
}

/// One section per non-empty transaction type.
pub async fn transactions(ledger: &dyn Ledger, range: DateRange) -> Result<String> {
    let mut parts = Vec::new();
    for kind in [
        TransactionType::Withdrawal,
        TransactionType::Deposit,
        TransactionType::Transfer,
    ] {
        let transactions = ledger.transactions(range, kind).await?;
        if transactions.is_empty() {
            continue;
        }
        let lines: Vec<String> = transactions.iter().map(transaction_line).collect();
        parts.push(section(
            &format!("🟢 Transactions: {}", kind.as_str().to_uppercase()),
            &lines,
        ));
    }
    if parts.is_empty() {
        parts.push(section("🟢 Transactions", &[NOTHING_TO_REPORT.to_string()]));
    }
    Ok(parts.join("\n\n"))
}

fn or_nothing(lines: Vec<String>) -> Vec<String> {
    if lines.is_empty() {
        vec![NOTHING_TO_REPORT.to_string()]
    } else {
        lines
    }
}

fn within_limit_symbol(limit: f64, spent: f64, allowance: f64) -> &'static str {
    if limit > 0.0 && spent <= allowance {
        "✅"
    } else {
        "❌"
    }
}

pub(crate) fn plain_budget_lines(budgets: &[Budget], exclude: &[String]) -> Vec<String> {
    budgets
        .iter()
        .filter(|budget| !is_excluded(&budget.name, exclude))
        .map(|budget| {
            let currency = budget.currency_code.as_deref();
            let mut value = format!(
                "{} / {}",
                money(budget.spent, currency),
                money(budget.limit, currency)
            );
            if budget.limit > 0.0 {
                let used = (budget.spent / budget.limit * 100.0) as i64;
                value.push_str(&format!(" ({}%)", used));
            }
            let symbol = within_limit_symbol(budget.limit, budget.spent, budget.limit);
            key_value(&format!("{} {}", symbol, budget.name), &value)
        })
        .collect()
}

pub(crate) fn periodic_budget_lines(
    budgets: &[Budget],
    exclude: &[String],
    spent_in_range: &HashMap<String, f64>,
    range: DateRange,
) -> Vec<String> {
    let share = range.days() as f64 / days_in_month(range.start) as f64;
    budgets
        .iter()
        .filter(|budget| !is_excluded(&budget.name, exclude))
        .map(|budget| {
            let currency = budget.currency_code.as_deref();
            let spent = spent_in_range.get(&budget.name).copied().unwrap_or(0.0);
            let allowance = budget.limit * share;
            let symbol = within_limit_symbol(budget.limit, spent, allowance);

            let available = budget.limit - budget.spent;
            let available_symbol = if available >= 0.0 { "🟢" } else { "🔴" };
            let mut available_text =
                format!("{} Available {}", available_symbol, money(available, currency));
            if budget.limit > 0.0 {
                let left = (available / budget.limit * 100.0) as i64;
                if left != 0 {
                    available_text.push_str(&format!(" ({}%)", left));
                }
            }

            key_value(
                &format!("{} {}", symbol, budget.name),
                &format!(
                    "{} / {} ({})",
                    money(spent, currency),
                    money(allowance, currency),
                    available_text
                ),
            )
        })
        .collect()
}

pub(crate) fn spent_by_budget(transactions: &[Transaction]) -> HashMap<String, f64> {
    let mut spent = HashMap::new();
    for transaction in transactions {
        if let Some(name) = &transaction.budget_name {
            *spent.entry(name.clone()).or_insert(0.0) += transaction.amount;
        }
    }
    spent
}

/// Largest spending first; categories with no spending in the range dropped.
pub(crate) fn category_lines(mut categories: Vec<Category>, exclude: &[String]) -> Vec<String> {
    categories.sort_by(|a, b| {
        a.spent
            .unwrap_or(0.0)
            .total_cmp(&b.spent.unwrap_or(0.0))
    });
    categories
        .iter()
        .filter(|category| !is_excluded(&category.name, exclude))
        .filter_map(|category| {
            let spent = category.spent?;
            let earned = category.earned.unwrap_or(0.0);
            if spent == 0.0 && earned == 0.0 {
                return None;
            }
            Some(key_value(
                &category.name,
                &format!(
                    "-{} / +{}",
                    money(spent.abs(), category.currency_code.as_deref()),
                    money(earned, category.currency_code.as_deref())
                ),
            ))
        })
        .collect()
}

pub(crate) fn summary_lines(
    kind: TransactionType,
    transactions: &[Transaction],
    by_account: bool,
) -> Vec<String> {
    let total: f64 = transactions.iter().map(|t| t.amount).sum();
    let mut lines = vec![key_value(kind.label(), &amount(total))];
    if by_account {
        let mut entries: Vec<LedgerEntry> = Vec::new();
        for transaction in transactions {
            let name = transaction.source_name.as_deref().unwrap_or("None");
            match entries.iter_mut().find(|entry| entry.name == name) {
                Some(entry) => entry.amount += transaction.amount,
                None => entries.push(
                    LedgerEntry::new(name, transaction.amount)
                        .with_currency(transaction.currency_code.clone()),
                ),
            }
        }
        lines.extend(
            format_entries(&entries, &[])
                .lines
                .into_iter()
                .map(|line| format!("  • {}", line)),
        );
    }
    lines
}

pub(crate) fn transaction_line(transaction: &Transaction) -> String {
    let source = transaction.source_name.as_deref().unwrap_or("-");
    let accounts = match (transaction.kind.as_str(), &transaction.destination_name) {
        ("transfer", Some(destination)) => format!("[{} → {}]", source, destination),
        _ => format!("[{}]", source),
    };
    let key = format!(
        "{} {} ({})",
        accounts,
        transaction.category_name.as_deref().unwrap_or("-"),
        transaction.budget_name.as_deref().unwrap_or("-"),
    );
    let value = format!(
        "{} ({})",
        money(transaction.amount, transaction.currency_code.as_deref()),
        transaction.description
    );
    key_value(&key, &value)
}

pub(crate) fn days_in_month(date: NaiveDate) -> u32 {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|next| next.pred_opt())
        .map(|last| last.day())
        .unwrap_or(30)
}
