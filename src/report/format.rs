//! Text building blocks for Telegram HTML messages.

use crate::firefly::Account;

pub const NOTHING_TO_REPORT: &str = "Nothing to report.";

/// One named amount fed to [`format_entries`].
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub name: String,
    pub amount: f64,
    pub currency: Option<String>,
}

impl LedgerEntry {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
            currency: None,
        }
    }

    pub fn with_currency(mut self, currency: Option<String>) -> Self {
        self.currency = currency;
        self
    }
}

impl From<&Account> for LedgerEntry {
    fn from(account: &Account) -> Self {
        LedgerEntry::new(account.name.clone(), account.current_balance)
            .with_currency(account.currency_code.clone())
    }
}

/// Formatted entry lines and their total; `total` is `None` when every
/// entry was excluded.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryBlock {
    pub lines: Vec<String>,
    pub total: Option<String>,
}

impl EntryBlock {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn render(&self) -> String {
        match &self.total {
            Some(total) if !self.is_empty() => {
                format!("{}\n{}", self.lines.join("\n"), key_value("Total", total))
            }
            _ => NOTHING_TO_REPORT.to_string(),
        }
    }
}

/// Exact, case-sensitive name match against the exclusion list.
pub fn is_excluded(name: &str, exclude: &[String]) -> bool {
    exclude.iter().any(|excluded| excluded == name)
}

/// One line per entry not in `exclude`, input order kept, plus the total of
/// the included amounts.
pub fn format_entries(entries: &[LedgerEntry], exclude: &[String]) -> EntryBlock {
    let included: Vec<&LedgerEntry> = entries
        .iter()
        .filter(|entry| !is_excluded(&entry.name, exclude))
        .collect();

    if included.is_empty() {
        return EntryBlock {
            lines: Vec::new(),
            total: None,
        };
    }

    let lines = included
        .iter()
        .map(|entry| {
            key_value(
                &entry.name,
                &money(entry.amount, entry.currency.as_deref()),
            )
        })
        .collect();

    let sum: f64 = included.iter().map(|entry| entry.amount).sum();
    let first_currency = included[0].currency.as_deref();
    let shared_currency = included
        .iter()
        .all(|entry| entry.currency.as_deref() == first_currency)
        .then_some(first_currency)
        .flatten();

    EntryBlock {
        lines,
        total: Some(money(sum, shared_currency)),
    }
}

/// Two decimals, without a negative zero.
pub fn amount(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        "0.00".to_string()
    } else {
        format!("{:.2}", rounded)
    }
}

pub fn money(value: f64, currency: Option<&str>) -> String {
    match currency {
        Some(code) if !code.is_empty() => format!("{} {}", amount(value), code),
        _ => amount(value),
    }
}

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn bold(text: &str) -> String {
    format!("<b>{}</b>", escape_html(text))
}

pub fn key_value(key: &str, value: &str) -> String {
    format!("{}: {}", escape_html(key), escape_html(value))
}

/// Bold heading followed by its body lines.
pub fn section(title: &str, body: &[String]) -> String {
    let mut out = bold(title);
    for line in body {
        out.push('\n');
        out.push_str(line);
    }
    out
}
