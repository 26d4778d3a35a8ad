//! Texts shown in reply to interactive chat commands.

use chrono::NaiveDate;

use crate::error::Result;
use crate::firefly::{AccountType, DateRange, Ledger, Transaction, TransactionType};

use super::format::{format_entries, key_value, money, section, LedgerEntry, NOTHING_TO_REPORT};
use super::sections::plain_budget_lines;

const NO_ACCOUNTS: &str = "No accounts found.";
const NO_TRANSACTIONS: &str = "No transactions found.";

pub async fn accounts_view(ledger: &dyn Ledger, kind: AccountType) -> Result<String> {
    let accounts = ledger.accounts(kind).await?;
    let title = format!("🟢 {} accounts: 🟢", kind.label());
    if accounts.is_empty() {
        return Ok(section(&title, &[NO_ACCOUNTS.to_string()]));
    }
    let entries: Vec<LedgerEntry> = accounts.iter().map(LedgerEntry::from).collect();
    Ok(section(&title, &[format_entries(&entries, &[]).render()]))
}

/// Every withdrawal, deposit and transfer booked on `date`.
pub async fn transactions_view(ledger: &dyn Ledger, date: NaiveDate) -> Result<String> {
    let range = DateRange::day(date);
    let mut parts = vec![section(
        &format!("🟢 Transactions {}", date.format("%Y-%m-%d")),
        &[],
    )];
    for kind in [
        TransactionType::Withdrawal,
        TransactionType::Deposit,
        TransactionType::Transfer,
    ] {
        let transactions = ledger.transactions(range, kind).await?;
        let lines = if transactions.is_empty() {
            vec![NO_TRANSACTIONS.to_string()]
        } else {
            transactions.iter().map(day_line).collect()
        };
        parts.push(section(&format!("🟢 {}", kind.label()), &lines));
    }
    Ok(parts.join("\n\n"))
}

/// Budgets of the current month up to `today`.
pub async fn budgets_view(ledger: &dyn Ledger, today: NaiveDate) -> Result<String> {
    let budgets = ledger.budgets(DateRange::day(today).month_to_date()).await?;
    let mut lines = plain_budget_lines(&budgets, &[]);
    if lines.is_empty() {
        lines.push(NOTHING_TO_REPORT.to_string());
    }
    Ok(section("📊 Budgets", &lines))
}

/// This month's transactions in one category, newest first.
pub async fn category_transactions_view(
    ledger: &dyn Ledger,
    category: &str,
    today: NaiveDate,
) -> Result<String> {
    let range = DateRange::day(today).month_to_date();
    let mut transactions: Vec<Transaction> = ledger
        .transactions(range, TransactionType::All)
        .await?
        .into_iter()
        .filter(|t| t.category_name.as_deref() == Some(category))
        .collect();
    transactions.sort_by(|a, b| b.date.cmp(&a.date));

    let lines = if transactions.is_empty() {
        vec![NO_TRANSACTIONS.to_string()]
    } else {
        transactions.iter().map(category_line).collect()
    };
    Ok(section(&format!("🟢 Transactions: {}", category), &lines))
}

fn day_line(transaction: &Transaction) -> String {
    key_value(
        &format!(
            "[{}] {} ({})",
            transaction.source_name.as_deref().unwrap_or("-"),
            transaction.category_name.as_deref().unwrap_or("-"),
            transaction.budget_name.as_deref().unwrap_or("-"),
        ),
        &format!(
            "{} ({})",
            money(transaction.amount, transaction.currency_code.as_deref()),
            transaction.description
        ),
    )
}

fn category_line(transaction: &Transaction) -> String {
    let date = transaction
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "----------".to_string());
    key_value(
        &format!(
            "- {} [{}] {}",
            date,
            transaction.source_name.as_deref().unwrap_or("-"),
            transaction.budget_name.as_deref().unwrap_or("-"),
        ),
        &format!(
            "{} ({})",
            money(transaction.amount, transaction.currency_code.as_deref()),
            transaction.description
        ),
    )
}
