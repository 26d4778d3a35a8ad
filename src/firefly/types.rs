use chrono::{Datelike, NaiveDate};

use super::models::{
    AccountAttributes, BudgetAttributes, BudgetLimitAttributes, CategoryAttributes,
    TransactionGroupAttributes,
};

/// Inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// From the first day of `start`'s month to `end`.
    pub fn month_to_date(&self) -> Self {
        Self::new(self.start.with_day(1).unwrap_or(self.start), self.end)
    }

    pub fn query(&self) -> [(&'static str, String); 2] {
        [
            ("start", self.start.format("%Y-%m-%d").to_string()),
            ("end", self.end.format("%Y-%m-%d").to_string()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionType {
    All,
    Withdrawal,
    Deposit,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::All => "all",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Deposit => "deposit",
            TransactionType::Transfer => "transfer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::All => "All",
            TransactionType::Withdrawal => "Withdrawal",
            TransactionType::Deposit => "Deposit",
            TransactionType::Transfer => "Transfer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccountType {
    Asset,
    Revenue,
    Expense,
    Liabilities,
}

impl AccountType {
    pub const ALL: [AccountType; 4] = [
        AccountType::Asset,
        AccountType::Revenue,
        AccountType::Expense,
        AccountType::Liabilities,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Revenue => "revenue",
            AccountType::Expense => "expense",
            AccountType::Liabilities => "liabilities",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountType::Asset => "Asset",
            AccountType::Revenue => "Revenue",
            AccountType::Expense => "Expense",
            AccountType::Liabilities => "Liabilities",
        }
    }

    /// Case-insensitive lookup by the API name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    pub id: String,
    pub name: String,
    /// Zero when no limit covers the requested range.
    pub limit: f64,
    pub currency_code: Option<String>,
    /// Sum of the budget's transactions in the requested range.
    pub spent: f64,
}

impl Budget {
    pub(crate) fn from_parts(
        id: String,
        attributes: BudgetAttributes,
        limit: Option<&BudgetLimitAttributes>,
        transactions: &[TransactionGroupAttributes],
    ) -> Self {
        let spent = transactions
            .iter()
            .filter_map(|group| group.transactions.first())
            .map(|split| split.amount)
            .sum();
        Self {
            id,
            name: attributes.name,
            limit: limit.map(|l| l.amount).unwrap_or(0.0),
            currency_code: limit.and_then(|l| l.currency_code.clone()),
            spent,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Negative in Firefly; `None` when nothing was spent in the range.
    pub spent: Option<f64>,
    pub earned: Option<f64>,
    pub currency_code: Option<String>,
}

impl Category {
    pub(crate) fn from_attributes(id: String, attributes: CategoryAttributes) -> Self {
        let spent = attributes.spent.first();
        let earned = attributes.earned.first();
        let currency_code = spent
            .and_then(|s| s.currency_code.clone())
            .or_else(|| earned.and_then(|e| e.currency_code.clone()));
        Self {
            id,
            name: attributes.name,
            spent: spent.and_then(|s| s.sum),
            earned: earned.and_then(|e| e.sum),
            currency_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub date: Option<NaiveDate>,
    pub kind: String,
    pub amount: f64,
    pub currency_code: Option<String>,
    pub description: String,
    pub source_name: Option<String>,
    pub destination_name: Option<String>,
    pub budget_name: Option<String>,
    pub category_name: Option<String>,
}

impl Transaction {
    /// `None` for groups without splits.
    pub(crate) fn from_group(group: TransactionGroupAttributes) -> Option<Self> {
        let created = group.created_at.map(|dt| dt.date_naive());
        let split = group.transactions.into_iter().next()?;
        Some(Self {
            date: split.date.map(|dt| dt.date_naive()).or(created),
            kind: split.kind,
            amount: split.amount,
            currency_code: split.currency_code,
            description: split.description,
            source_name: split.source_name,
            destination_name: split.destination_name,
            budget_name: split.budget_name,
            category_name: split.category_name,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub name: String,
    pub kind: String,
    pub current_balance: f64,
    pub currency_code: Option<String>,
}

impl From<AccountAttributes> for Account {
    fn from(attributes: AccountAttributes) -> Self {
        Self {
            name: attributes.name,
            kind: attributes.kind.unwrap_or_else(|| "unknown".to_string()),
            current_balance: attributes.current_balance.unwrap_or(0.0),
            currency_code: attributes.currency_code,
        }
    }
}
