use std::fmt;

use ahash::AHashMap;
use futures::{stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument, warn};

use crate::enricher::{self, CatalogProvider};
use crate::errors::PipelineError;
use crate::extractor::Extractor;
use crate::merger::{Batch, BatchEntry};
use crate::models::{ContentKind, ContentRecord};
use crate::reconcile::{self, ContentRepository, Reconciled};
use crate::scraper::{self, ProviderConfig, SearchProvider};

const DEFAULT_CONCURRENCY: usize = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// Priming failed or reported nothing to scrape.
    NoPages,
    Cancelled,
}

/// Something that was left out of a run and why.
#[derive(Debug)]
pub struct Dropped {
    /// Page, listing title or slug the error belongs to.
    pub subject: String,
    pub error: PipelineError,
}

#[derive(Debug)]
pub struct RunReport {
    pub provider: String,
    pub outcome: RunOutcome,
    pub pages: u32,
    pub listings: usize,
    pub discovered: usize,
    pub enriched: usize,
    pub reconciled: usize,
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub dropped: Vec<Dropped>,
}

impl RunReport {
    fn new(provider: &str) -> Self {
        Self {
            provider: provider.to_owned(),
            outcome: RunOutcome::Completed,
            pages: 0,
            listings: 0,
            discovered: 0,
            enriched: 0,
            reconciled: 0,
            inserted: 0,
            updated: 0,
            unchanged: 0,
            dropped: Vec::new(),
        }
    }

    fn record(&mut self, subject: impl Into<String>, error: PipelineError) {
        self.dropped.push(Dropped {
            subject: subject.into(),
            error,
        });
    }

    fn tally(&mut self, outcome: CandidateOutcome) {
        match outcome {
            CandidateOutcome::Cancelled => self.outcome = RunOutcome::Cancelled,
            CandidateOutcome::Reconciled(reconciled) => {
                self.enriched += 1;
                self.reconciled += 1;
                match reconciled {
                    Reconciled::Inserted => self.inserted += 1,
                    Reconciled::Updated => self.updated += 1,
                    Reconciled::Unchanged => self.unchanged += 1,
                }
            }
            CandidateOutcome::Dropped { enriched, dropped } => {
                if enriched {
                    self.enriched += 1;
                }
                self.dropped.push(dropped);
            }
        }
    }

    /// Dropped entries that are real failures rather than expected skips.
    pub fn failures(&self) -> impl Iterator<Item = &Dropped> {
        self.dropped.iter().filter(|d| d.error.is_failure())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:?}, {} pages, {} listings, {} discovered, {} enriched, {} reconciled \
             ({} inserted, {} updated, {} unchanged), {} dropped",
            self.provider,
            self.outcome,
            self.pages,
            self.listings,
            self.discovered,
            self.enriched,
            self.reconciled,
            self.inserted,
            self.updated,
            self.unchanged,
            self.dropped.len(),
        )
    }
}

enum CandidateOutcome {
    Cancelled,
    Reconciled(Reconciled),
    Dropped { enriched: bool, dropped: Dropped },
}

impl CandidateOutcome {
    fn dropped(enriched: bool, subject: String, error: PipelineError) -> Self {
        if error.is_failure() {
            warn!("dropping {subject}: {error}");
        } else {
            debug!("skipping {subject}: {error}");
        }
        CandidateOutcome::Dropped {
            enriched,
            dropped: Dropped { subject, error },
        }
    }
}

enum Enrichment {
    Found(ContentRecord),
    Skipped(CandidateOutcome),
}

/// Groups records by id, keeping first-occurrence order.
fn group_by_id(records: Vec<ContentRecord>) -> Vec<Vec<ContentRecord>> {
    let mut index: AHashMap<String, usize> = AHashMap::new();
    let mut groups: Vec<Vec<ContentRecord>> = Vec::new();
    for record in records {
        match index.get(&record.id) {
            Some(&position) => groups[position].push(record),
            None => {
                index.insert(record.id.clone(), groups.len());
                groups.push(vec![record]);
            }
        }
    }
    groups
}

/// Scrape, extract, merge, enrich and reconcile one provider per run.
pub struct Pipeline<S, C, R> {
    search: S,
    catalog: C,
    repository: R,
    extractor: Extractor,
    concurrency: usize,
}

impl<S, C, R> Pipeline<S, C, R>
where
    S: SearchProvider,
    C: CatalogProvider,
    R: ContentRepository,
{
    /// # Errors
    /// Returns an error if the title patterns fail to compile.
    pub fn new(search: S, catalog: C, repository: R) -> Result<Self, regex::Error> {
        Ok(Self {
            search,
            catalog,
            repository,
            extractor: Extractor::new()?,
            concurrency: DEFAULT_CONCURRENCY,
        })
    }

    /// Maximum number of candidates enriched and reconciled at once.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn run(&self, config: &ProviderConfig) -> RunReport {
        self.run_until_cancelled(config, &CancellationToken::new())
            .await
    }

    /// Run once, stopping between pages or candidates when `cancel` fires.
    /// Calls already in flight are allowed to finish.
    #[instrument(skip_all, fields(provider = %config.name))]
    pub async fn run_until_cancelled(
        &self,
        config: &ProviderConfig,
        cancel: &CancellationToken,
    ) -> RunReport {
        let mut report = RunReport::new(&config.name);

        let scrape = match scraper::scrape(&self.search, config, cancel).await {
            Ok(scrape) => scrape,
            Err(error) => {
                error!("aborting run: {error}");
                report.outcome = RunOutcome::NoPages;
                report.record(config.name.as_str(), error);
                return report;
            }
        };
        report.pages = scrape.pages;
        report.listings = scrape.listings.len();
        for failure in scrape.failures {
            let subject = match failure {
                PipelineError::PageFetchFailure { page, .. } => format!("page {page}"),
                _ => config.name.clone(),
            };
            report.record(subject, failure);
        }
        if scrape.cancelled {
            report.outcome = RunOutcome::Cancelled;
            return report;
        }

        let mut batch = Batch::default();
        for listing in scrape.listings {
            let title = listing.title.clone();
            match self.extractor.extract(listing, config.kind, &config.name) {
                Ok(candidate) => batch.push(candidate),
                Err(error) => {
                    debug!("skipping listing: {error}");
                    report.record(title, error);
                }
            }
        }
        report.discovered = batch.len();
        debug!("discovered {} entries", report.discovered);

        // Ordered, so records sharing an id are reconciled in first-seen order.
        let enriched: Vec<Enrichment> = stream::iter(batch.into_entries())
            .map(|entry| self.enrich(config.kind, entry, cancel))
            .buffered(self.concurrency)
            .collect()
            .await;
        let mut records = Vec::with_capacity(enriched.len());
        for enrichment in enriched {
            match enrichment {
                Enrichment::Found(record) => records.push(record),
                Enrichment::Skipped(outcome) => report.tally(outcome),
            }
        }

        let outcomes: Vec<Vec<CandidateOutcome>> = stream::iter(group_by_id(records))
            .map(|group| self.reconcile_group(group, cancel))
            .buffer_unordered(self.concurrency)
            .collect()
            .await;
        for outcome in outcomes.into_iter().flatten() {
            report.tally(outcome);
        }
        report
    }

    #[instrument(skip(self, entry, cancel), fields(slug = %entry.slug))]
    async fn enrich(
        &self,
        kind: ContentKind,
        entry: BatchEntry,
        cancel: &CancellationToken,
    ) -> Enrichment {
        if cancel.is_cancelled() {
            return Enrichment::Skipped(CandidateOutcome::Cancelled);
        }
        let subject = entry.slug.clone();
        match enricher::enrich(&self.catalog, kind, &entry).await {
            Ok(Some(record)) => Enrichment::Found(ContentRecord {
                torrents: entry.torrents,
                ..record
            }),
            Ok(None) => {
                let error = PipelineError::EnrichmentMiss(entry.lookup_id());
                Enrichment::Skipped(CandidateOutcome::dropped(false, subject, error))
            }
            Err(error) => Enrichment::Skipped(CandidateOutcome::dropped(false, subject, error)),
        }
    }

    /// Different slugs can resolve to one catalog id, so a group shares a
    /// record and is reconciled strictly one after the other.
    async fn reconcile_group(
        &self,
        group: Vec<ContentRecord>,
        cancel: &CancellationToken,
    ) -> Vec<CandidateOutcome> {
        let mut outcomes = Vec::with_capacity(group.len());
        for record in group {
            if cancel.is_cancelled() {
                outcomes.push(CandidateOutcome::Cancelled);
                continue;
            }
            let subject = record.slug.clone();
            let outcome = match reconcile::reconcile(&self.repository, record).await {
                Ok(outcome) => CandidateOutcome::Reconciled(outcome),
                Err(error) => CandidateOutcome::dropped(true, subject, error),
            };
            outcomes.push(outcome);
        }
        outcomes
    }
}
