//! Scheduled and on-demand ledger reports.

pub mod format;
pub mod sections;
pub mod views;

use chrono::{Datelike, Duration, NaiveDate};

use crate::config::{Config, ReportConfig};
use crate::error::Result;
use crate::firefly::{DateRange, Ledger};

use format::bold;
use sections::BudgetMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Daily,
    Periodic,
    Monthly,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [ReportKind::Daily, ReportKind::Periodic, ReportKind::Monthly];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportKind::Daily => "daily",
            ReportKind::Periodic => "periodic",
            ReportKind::Monthly => "monthly",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Button caption in the report menu.
    pub fn label(&self, day_period: u32) -> String {
        match self {
            ReportKind::Daily => "📊 Daily report".to_string(),
            ReportKind::Periodic => format!("📊 {} days report", day_period),
            ReportKind::Monthly => "📊 Monthly report".to_string(),
        }
    }

    fn settings<'a>(&self, config: &'a Config) -> &'a ReportConfig {
        match self {
            ReportKind::Daily => &config.daily_report,
            ReportKind::Periodic => &config.periodic_report,
            ReportKind::Monthly => &config.monthly_report,
        }
    }
}

/// Everything needed to build one report, fixed at request time.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub kind: ReportKind,
    pub header: String,
    pub range: DateRange,
    pub exclude_budgets: Vec<String>,
    pub exclude_categories: Vec<String>,
}

impl ReportRequest {
    /// The report of `kind` covering the days before `today`.
    pub fn for_kind(kind: ReportKind, today: NaiveDate, config: &Config) -> Self {
        let yesterday = today - Duration::days(1);
        let (range, header) = match kind {
            ReportKind::Daily => (
                DateRange::day(yesterday),
                format!("Daily report: {}", yesterday.format("%Y-%m-%d")),
            ),
            ReportKind::Monthly => (
                DateRange::day(yesterday).month_to_date(),
                format!("Monthly report: {}", yesterday.format("%Y-%m")),
            ),
            ReportKind::Periodic => {
                let start = yesterday - Duration::days(i64::from(config.day_period) - 1);
                (
                    DateRange::new(start, yesterday),
                    format!(
                        "Last {} days report: {} - {}",
                        config.day_period,
                        start.format("%Y-%m-%d"),
                        yesterday.format("%Y-%m-%d")
                    ),
                )
            }
        };
        let settings = kind.settings(config);
        Self {
            kind,
            header,
            range,
            exclude_budgets: settings.exclude_budgets.clone(),
            exclude_categories: settings.exclude_categories.clone(),
        }
    }
}

/// Reports due on `today`, in sending order.
pub fn scheduled_requests(today: NaiveDate, config: &Config) -> Vec<ReportRequest> {
    let day = today.day();
    let mut due = Vec::new();
    if config.daily_report.send_report {
        due.push(ReportKind::Daily);
    }
    if config.monthly_report.send_report && day == 1 {
        due.push(ReportKind::Monthly);
    }
    if config.periodic_report.send_report
        && day != 1
        && config.day_period > 0
        && (day - 1) % config.day_period == 0
    {
        due.push(ReportKind::Periodic);
    }
    due.into_iter()
        .map(|kind| ReportRequest::for_kind(kind, today, config))
        .collect()
}

/// Builds the full report text. Any ledger failure aborts the whole report.
pub async fn generate(request: &ReportRequest, ledger: &dyn Ledger) -> Result<String> {
    let range = request.range;
    let mut parts = vec![bold(&format!("📋 {}", request.header))];
    match request.kind {
        ReportKind::Daily => {
            parts.push(
                sections::budgets(ledger, range, &request.exclude_budgets, BudgetMode::Periodic)
                    .await?,
            );
            parts.push(sections::transactions(ledger, range).await?);
        }
        ReportKind::Periodic => {
            parts.push(
                sections::budgets(ledger, range, &request.exclude_budgets, BudgetMode::Periodic)
                    .await?,
            );
            parts.push(sections::categories(ledger, range, &request.exclude_categories).await?);
        }
        ReportKind::Monthly => {
            parts.push(sections::summary(ledger, range, true).await?);
            parts.push(
                sections::budgets(ledger, range, &request.exclude_budgets, BudgetMode::Plain)
                    .await?,
            );
            parts.push(sections::categories(ledger, range, &request.exclude_categories).await?);
        }
    }
    Ok(parts.join("\n\n"))
}
