use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::enricher::CatalogProvider;
use crate::jobs::pipeline::{Pipeline, RunOutcome, RunReport};
use crate::reconcile::ContentRepository;
use crate::scraper::{ProviderConfig, SearchProvider};

const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[async_trait]
pub trait Poller: Send + Sync {
    async fn poll(&self, cancel: &CancellationToken) -> Vec<RunReport>;
}

/// Runs every configured provider through the pipeline, one after the other.
pub struct ScrapePoller<S, C, R> {
    pipeline: Pipeline<S, C, R>,
    providers: Vec<ProviderConfig>,
}

impl<S, C, R> ScrapePoller<S, C, R> {
    pub fn new(pipeline: Pipeline<S, C, R>, providers: Vec<ProviderConfig>) -> Self {
        Self {
            pipeline,
            providers,
        }
    }
}

#[async_trait]
impl<S, C, R> Poller for ScrapePoller<S, C, R>
where
    S: SearchProvider,
    C: CatalogProvider,
    R: ContentRepository,
{
    #[instrument(skip_all)]
    async fn poll(&self, cancel: &CancellationToken) -> Vec<RunReport> {
        let mut reports = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            if cancel.is_cancelled() {
                break;
            }
            let report = self.pipeline.run_until_cancelled(provider, cancel).await;
            log_report(&report);
            reports.push(report);
        }
        reports
    }
}

fn log_report(report: &RunReport) {
    match report.outcome {
        RunOutcome::NoPages => error!("{report}"),
        RunOutcome::Cancelled => warn!("{report}"),
        RunOutcome::Completed => info!("{report}"),
    }
    for dropped in report.failures() {
        warn!("{}: {}", dropped.subject, dropped.error);
    }
}

pub fn start(poller: impl Poller + 'static, cancel: CancellationToken) -> Result<JoinHandle<()>> {
    start_with_period(poller, DEFAULT_INTERVAL, cancel)
}

pub fn start_with_period(
    poller: impl Poller + 'static,
    period: Duration,
    cancel: CancellationToken,
) -> Result<JoinHandle<()>> {
    let interval = interval_at_next_minute(period)?;
    Ok(start_with_interval(poller, interval, cancel))
}

pub fn start_with_interval(
    poller: impl Poller + 'static,
    mut interval: Interval,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::task::spawn(async move {
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }
            poller.poll(&cancel).await;
        }
    })
}

fn interval_at_next_minute(period: Duration) -> Result<Interval> {
    let now: DateTime<Utc> = Utc::now();
    let minute = (now + chrono::Duration::minutes(1))
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .ok_or(anyhow!("failed to strip seconds"))?;
    let duration = (minute - now).to_std()?;
    let start = Instant::now() + duration;
    Ok(interval_at(start, period))
}
