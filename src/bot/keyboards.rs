use chrono::{Duration, NaiveDate};
use teloxide::types::{KeyboardButton, KeyboardMarkup};

use crate::chat::{Menu, MenuOption};
use crate::firefly::{AccountType, CategoryRef};
use crate::report::ReportKind;

pub const ACCOUNTS: &str = "💳 Accounts";
pub const TRANSACTIONS: &str = "🔀 Transactions";
pub const BUDGETS: &str = "📊 Budgets";
pub const REPORTS: &str = "📈 Reports";
pub const CATEGORIES: &str = "🧾 Categories";

const OK: &str = "✅ OK";

/// Text commands accepted from the chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Reports,
    Accounts,
    Transactions,
    Budgets,
    Categories,
}

impl Command {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        // "/start@my_bot" in group chats
        let command = text.split('@').next().unwrap_or(text);
        match command {
            "/start" => Some(Command::Start),
            "/stop" => Some(Command::Stop),
            "/reports" | REPORTS => Some(Command::Reports),
            ACCOUNTS => Some(Command::Accounts),
            TRANSACTIONS => Some(Command::Transactions),
            BUDGETS => Some(Command::Budgets),
            CATEGORIES => Some(Command::Categories),
            _ => None,
        }
    }
}

/// Decoded inline button payloads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    Report(ReportKind),
    Account(AccountType),
    AccountsOk,
    TransactionsOn(NaiveDate),
    TransactionsOk,
    Category(String),
    CategoriesOk,
}

impl Callback {
    pub fn parse(data: &str) -> Option<Self> {
        let (prefix, value) = data.split_once('/')?;
        let is_ok = value.eq_ignore_ascii_case("ok");
        match prefix {
            "report" => ReportKind::parse(value).map(Callback::Report),
            "account" if is_ok => Some(Callback::AccountsOk),
            "account" => AccountType::parse(value).map(Callback::Account),
            "transactions" if is_ok => Some(Callback::TransactionsOk),
            "transactions" => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(Callback::TransactionsOn),
            "categories" if is_ok => Some(Callback::CategoriesOk),
            "category" if !value.is_empty() => Some(Callback::Category(value.to_string())),
            _ => None,
        }
    }
}

pub fn main_keyboard() -> KeyboardMarkup {
    let buttons: Vec<KeyboardButton> = [ACCOUNTS, TRANSACTIONS, BUDGETS, REPORTS, CATEGORIES]
        .into_iter()
        .map(KeyboardButton::new)
        .collect();
    KeyboardMarkup::new(buttons.chunks(2).map(|row| row.to_vec())).resize_keyboard()
}

/// The other account types, one per row.
pub fn accounts_menu(current: AccountType) -> Menu {
    let options = AccountType::ALL
        .into_iter()
        .filter(|kind| *kind != current)
        .map(|kind| {
            MenuOption::new(
                kind.label(),
                format!("account/{}", kind.as_str().to_uppercase()),
            )
        })
        .collect();
    Menu::new(options, 1).with_footer(MenuOption::new(OK, "account/OK"))
}

/// Day before and day after `date`.
pub fn transactions_menu(date: NaiveDate) -> Menu {
    let previous = date - Duration::days(1);
    let next = date + Duration::days(1);
    let options = vec![
        MenuOption::new(
            format!("<< {}", previous.format("%Y-%m-%d")),
            format!("transactions/{}", previous.format("%Y-%m-%d")),
        ),
        MenuOption::new(
            format!(">> {}", next.format("%Y-%m-%d")),
            format!("transactions/{}", next.format("%Y-%m-%d")),
        ),
    ];
    Menu::new(options, 2).with_footer(MenuOption::new(OK, "transactions/OK"))
}

pub fn reports_menu(day_period: u32) -> Menu {
    let options = ReportKind::ALL
        .into_iter()
        .map(|kind| {
            MenuOption::new(kind.label(day_period), format!("report/{}", kind.as_str()))
        })
        .collect();
    Menu::new(options, 1)
}

/// Category grid keyed by id; Telegram caps callback data at 64 bytes.
pub fn categories_menu(categories: &[CategoryRef], per_row: usize) -> Menu {
    let options = categories
        .iter()
        .map(|category| MenuOption::new(&category.name, format!("category/{}", category.id)))
        .collect();
    Menu::new(options, per_row).with_footer(MenuOption::new(OK, "categories/OK"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(menu: &Menu) -> Vec<String> {
        menu.options
            .iter()
            .chain(menu.footer.iter())
            .map(|o| o.callback_data.clone())
            .collect()
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("/start"), Some(Command::Start));
        assert_eq!(Command::parse("/stop@finance_bot"), Some(Command::Stop));
        assert_eq!(Command::parse("📈 Reports"), Some(Command::Reports));
        assert_eq!(Command::parse("/reports"), Some(Command::Reports));
        assert_eq!(Command::parse("🧾 Categories"), Some(Command::Categories));
        assert_eq!(Command::parse("hello"), None);
    }

    #[test]
    fn test_callback_parse() {
        assert_eq!(
            Callback::parse("report/monthly"),
            Some(Callback::Report(ReportKind::Monthly))
        );
        assert_eq!(
            Callback::parse("account/LIABILITIES"),
            Some(Callback::Account(AccountType::Liabilities))
        );
        assert_eq!(Callback::parse("account/OK"), Some(Callback::AccountsOk));
        assert_eq!(Callback::parse("transactions/ok"), Some(Callback::TransactionsOk));
        assert_eq!(
            Callback::parse("transactions/2024-02-29"),
            Some(Callback::TransactionsOn(
                NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
            ))
        );
        assert_eq!(Callback::parse("category/17"), Some(Callback::Category("17".into())));
        assert_eq!(Callback::parse("categories/OK"), Some(Callback::CategoriesOk));
        assert_eq!(Callback::parse("transactions/yesterday"), None);
        assert_eq!(Callback::parse("report/weekly"), None);
        assert_eq!(Callback::parse("category/"), None);
        assert_eq!(Callback::parse("garbage"), None);
    }

    #[test]
    fn test_accounts_menu_skips_current_type() {
        let menu = accounts_menu(AccountType::Asset);
        assert_eq!(
            data(&menu),
            vec!["account/REVENUE", "account/EXPENSE", "account/LIABILITIES", "account/OK"]
        );
        assert_eq!(menu.rows().len(), 4);
        for option in &menu.options {
            assert!(Callback::parse(&option.callback_data).is_some());
        }
    }

    #[test]
    fn test_transactions_menu_navigates_days() {
        let menu = transactions_menu(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(
            data(&menu),
            vec!["transactions/2024-02-29", "transactions/2024-03-02", "transactions/OK"]
        );
        assert_eq!(menu.options[0].label, "<< 2024-02-29");
        assert_eq!(menu.rows().len(), 2);
    }

    #[test]
    fn test_reports_menu_one_per_row() {
        let menu = reports_menu(5);
        assert_eq!(
            data(&menu),
            vec!["report/daily", "report/periodic", "report/monthly"]
        );
        assert_eq!(menu.options[1].label, "📊 5 days report");
        assert_eq!(menu.rows().len(), 3);
    }

    #[test]
    fn test_categories_menu_grid() {
        let categories: Vec<CategoryRef> = (1..=3)
            .map(|i| CategoryRef {
                id: i.to_string(),
                name: format!("Category {}", i),
            })
            .collect();
        let menu = categories_menu(&categories, 2);
        let sizes: Vec<usize> = menu.rows().iter().map(|r| r.len()).collect();
        assert_eq!(sizes, vec![2, 1, 1]);
        assert_eq!(data(&menu)[0], "category/1");
        assert!(data(&menu).iter().all(|d| d.len() <= 64));
    }
}
