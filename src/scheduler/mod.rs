pub mod tasks;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use futures::future::BoxFuture;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

/// A fixed local wall-clock time, once per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    pub hour: u32,
    pub minute: u32,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }

    /// Six-field cron expression (seconds first).
    pub fn cron_expr(&self) -> String {
        format!("0 {} {} * * *", self.minute, self.hour)
    }

    fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// First trigger strictly after `now`.
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let candidate = now.date().and_time(self.time());
        if candidate > now {
            candidate
        } else {
            candidate + Duration::days(1)
        }
    }
}

/// Wrapper around tokio-cron-scheduler for background tasks
pub struct Scheduler {
    inner: JobScheduler,
}

impl Scheduler {
    pub async fn new() -> Result<Self> {
        let inner = JobScheduler::new()
            .await
            .context("Failed to create job scheduler")?;
        Ok(Self { inner })
    }

    /// Run `task` every day at `schedule`, in the host's local time zone.
    pub async fn add_daily_job<F>(&self, schedule: DailySchedule, name: &str, task: F) -> Result<()>
    where
        F: Fn() -> BoxFuture<'static, ()> + Send + Sync + 'static,
    {
        let cron_expr = schedule.cron_expr();
        let job_name = name.to_string();
        let job = Job::new_async_tz(cron_expr.as_str(), chrono::Local, move |_uuid, _lock| {
            let name = job_name.clone();
            let fut = task();
            Box::pin(async move {
                info!("Running scheduled task: {}", name);
                fut.await;
            })
        })
        .with_context(|| format!("Failed to create cron job: {}", name))?;

        self.inner
            .add(job)
            .await
            .with_context(|| format!("Failed to add job: {}", name))?;

        info!("Scheduled task '{}' with cron: {}", name, cron_expr);
        Ok(())
    }

    pub async fn start(&self) -> Result<()> {
        self.inner
            .start()
            .await
            .context("Failed to start scheduler")?;
        info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .context("Failed to shutdown scheduler")?;
        info!("Scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_cron_expr() {
        assert_eq!(DailySchedule::new(12, 0).cron_expr(), "0 0 12 * * *");
        assert_eq!(DailySchedule::new(7, 45).cron_expr(), "0 45 7 * * *");
    }

    #[test]
    fn test_next_after_is_strictly_later() {
        let schedule = DailySchedule::new(12, 30);
        assert_eq!(schedule.next_after(at(3, 9, 0)), at(3, 12, 30));
        assert_eq!(schedule.next_after(at(3, 12, 30)), at(4, 12, 30));
        assert_eq!(schedule.next_after(at(3, 23, 59)), at(4, 12, 30));
    }

    #[test]
    fn test_exactly_one_trigger_per_day() {
        let schedule = DailySchedule::new(0, 0);
        let mut now = at(1, 0, 0);
        let mut triggers = Vec::new();
        while now < at(11, 0, 0) {
            now = schedule.next_after(now);
            triggers.push(now);
        }
        assert_eq!(triggers.len(), 10);
        for pair in triggers.windows(2) {
            assert_eq!(pair[1] - pair[0], Duration::days(1));
            assert_ne!(pair[1].date(), pair[0].date());
        }
    }

    #[tokio::test]
    async fn test_scheduler_accepts_daily_job() {
        let scheduler = Scheduler::new().await.unwrap();
        scheduler
            .add_daily_job(DailySchedule::new(12, 0), "noop", || Box::pin(async {}))
            .await
            .unwrap();
    }
}
