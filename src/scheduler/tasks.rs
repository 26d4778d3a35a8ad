use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::bot::AppState;
use crate::chat::Messenger;
use crate::config::Config;
use crate::firefly::Ledger;
use crate::report::{self, scheduled_requests};
use crate::scheduler::{DailySchedule, Scheduler};

/// Register the daily report run at the configured local time.
pub async fn register_report_task(
    scheduler: &Scheduler,
    state: Arc<AppState>,
) -> anyhow::Result<DailySchedule> {
    let schedule = DailySchedule::new(
        state.config.send_report_hour,
        state.config.send_report_minute,
    );
    scheduler
        .add_daily_job(schedule, "reports", move || {
            let state = state.clone();
            Box::pin(async move {
                let today = Local::now().date_naive();
                send_scheduled_reports(
                    &state.config,
                    state.ledger.as_ref(),
                    &state.chat,
                    &state.report_gate,
                    today,
                )
                .await;
            })
        })
        .await?;
    Ok(schedule)
}

/// Send every report due on `today`, one after another, holding the report
/// gate for the whole run. A failed report is logged and skipped. Returns
/// the number of reports delivered.
pub async fn send_scheduled_reports(
    config: &Config,
    ledger: &dyn Ledger,
    messenger: &dyn Messenger,
    gate: &Mutex<()>,
    today: NaiveDate,
) -> usize {
    let requests = scheduled_requests(today, config);
    if requests.is_empty() {
        info!("No reports due on {}", today);
        return 0;
    }

    let _guard = gate.lock().await;
    let mut delivered = 0;
    for request in &requests {
        let text = match report::generate(request, ledger).await {
            Ok(text) => text,
            Err(e) if e.is_network() => {
                warn!("Firefly unreachable, skipping {} report: {}", request.kind.as_str(), e);
                continue;
            }
            Err(e) => {
                error!("Failed to build {} report: {}", request.kind.as_str(), e);
                continue;
            }
        };
        match messenger.send(&text).await {
            Ok(()) => {
                info!("Sent {}", request.header);
                delivered += 1;
            }
            Err(e) => error!("Failed to send {} report: {}", request.kind.as_str(), e),
        }
    }
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::Menu;
    use crate::error::{Error, Result};
    use crate::report::tests::{test_config, FakeLedger};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct FakeMessenger {
        sent: StdMutex<Vec<String>>,
        reject: bool,
    }

    #[async_trait]
    impl Messenger for FakeMessenger {
        async fn send(&self, text: &str) -> Result<()> {
            if self.reject {
                return Err(Error::Delivery("Forbidden: bot was blocked by the user".into()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }

        async fn send_menu(&self, text: &str, _menu: &Menu) -> Result<()> {
            self.send(text).await
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[tokio::test]
    async fn test_first_of_month_sends_daily_then_monthly() {
        let config = test_config();
        let ledger = FakeLedger::default();
        let messenger = FakeMessenger::default();
        let gate = Mutex::new(());

        let delivered = send_scheduled_reports(&config, &ledger, &messenger, &gate, date(1)).await;

        assert_eq!(delivered, 2);
        let sent = messenger.sent.lock().unwrap();
        assert!(sent[0].starts_with("<b>📋 Daily report: 2024-05-31</b>"));
        assert!(sent[1].starts_with("<b>📋 Monthly report: 2024-05</b>"));
    }

    #[tokio::test]
    async fn test_ledger_failure_sends_nothing() {
        let config = test_config();
        let ledger = FakeLedger {
            fail: true,
            ..Default::default()
        };
        let messenger = FakeMessenger::default();
        let gate = Mutex::new(());

        let delivered = send_scheduled_reports(&config, &ledger, &messenger, &gate, date(6)).await;

        assert_eq!(delivered, 0);
        assert!(messenger.sent.lock().unwrap().is_empty());
        // both due reports were attempted
        assert_eq!(ledger.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_not_counted() {
        let config = test_config();
        let ledger = FakeLedger::default();
        let messenger = FakeMessenger {
            reject: true,
            ..Default::default()
        };
        let gate = Mutex::new(());

        let delivered = send_scheduled_reports(&config, &ledger, &messenger, &gate, date(2)).await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_nothing_due_when_reports_disabled() {
        let mut config = test_config();
        config.daily_report.send_report = false;
        let ledger = FakeLedger::default();
        let messenger = FakeMessenger::default();
        let gate = Mutex::new(());

        let delivered = send_scheduled_reports(&config, &ledger, &messenger, &gate, date(2)).await;
        assert_eq!(delivered, 0);
        assert!(ledger.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_waits_for_report_gate() {
        let config = test_config();
        let ledger = FakeLedger::default();
        let messenger = FakeMessenger::default();
        let gate = Mutex::new(());

        let held = gate.lock().await;
        let run = send_scheduled_reports(&config, &ledger, &messenger, &gate, date(2));
        tokio::pin!(run);
        let pending =
            tokio::time::timeout(std::time::Duration::from_millis(50), &mut run).await;
        assert!(pending.is_err());
        assert!(ledger.calls.lock().unwrap().is_empty());

        drop(held);
        assert_eq!(run.await, 1);
    }
}
