use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::errors::{InternalError, PipelineError};
use crate::models::{ContentKind, RawListing};

pub mod kat;

/// Search fields sent to the torrent index for every page of a run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: Option<String>,
    pub category: Option<String>,
    pub verified: bool,
    pub adult_filter: bool,
    pub page: u32,
}

impl SearchQuery {
    fn for_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SearchPage {
    pub results: Vec<RawListing>,
    pub total_pages: Option<u32>,
}

/// A paginated torrent index. Asking for the same page twice must give the same answer.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, InternalError>;
}

/// Everything one run needs to know about the provider it scrapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Stamped on every torrent variant found by this provider.
    pub name: String,
    pub kind: ContentKind,
    pub query: SearchQuery,
    pub max_pages: Option<u32>,
}

impl ProviderConfig {
    fn kat(name: &str, kind: ContentKind, text: Option<&str>, category: &str) -> Self {
        Self {
            name: name.into(),
            kind,
            query: SearchQuery {
                text: text.map(Into::into),
                category: Some(category.into()),
                verified: true,
                adult_filter: true,
                page: 1,
            },
            max_pages: None,
        }
    }

    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::kat("KAT Movies", ContentKind::Movie, None, "movies"),
            Self::kat("KAT Shows", ContentKind::Show, None, "tv"),
            Self::kat(
                "KAT Anime",
                ContentKind::Anime,
                Some("horriblesubs"),
                "english-translated",
            ),
        ]
    }

    #[must_use]
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }
}

/// Listings of one run in page order, plus what went wrong on the way.
#[derive(Debug, Default)]
pub struct Scrape {
    pub listings: Vec<RawListing>,
    pub pages: u32,
    pub failures: Vec<PipelineError>,
    pub cancelled: bool,
}

/// Ask the provider how many pages there are.
///
/// # Errors
/// [`PipelineError::PrimingFailure`] if the request fails or there is nothing to fetch.
pub async fn prime<S>(provider: &S, config: &ProviderConfig) -> Result<u32, PipelineError>
where
    S: SearchProvider + ?Sized,
{
    let page = provider
        .search(&config.query.for_page(1))
        .await
        .map_err(|e| PipelineError::PrimingFailure(format!("{e:#}")))?;
    let total = match page.total_pages {
        None => return Err(PipelineError::PrimingFailure("no page count".into())),
        Some(0) => return Err(PipelineError::PrimingFailure("no results".into())),
        Some(total) => total,
    };
    Ok(config.max_pages.map_or(total, |max| total.min(max)))
}

/// Fetch every page sequentially, from the first through the primed total.
///
/// A failing page is recorded and contributes nothing; the loop stops early
/// only when `cancel` fires.
///
/// # Errors
/// [`PipelineError::PrimingFailure`] if the page count cannot be determined.
/// No page is requested in that case.
#[instrument(skip_all, fields(provider = %config.name))]
pub async fn scrape<S>(
    provider: &S,
    config: &ProviderConfig,
    cancel: &CancellationToken,
) -> Result<Scrape, PipelineError>
where
    S: SearchProvider + ?Sized,
{
    let total = prime(provider, config).await?;
    debug!("scraping {total} pages");

    let mut scrape = Scrape::default();
    for page in 1..=total {
        if cancel.is_cancelled() {
            debug!("cancelled before page {page}");
            scrape.cancelled = true;
            break;
        }
        scrape.pages += 1;
        match provider.search(&config.query.for_page(page)).await {
            Ok(result) => {
                debug!("page {page} gave {} listings", result.results.len());
                scrape.listings.extend(result.results);
            }
            Err(error) => {
                warn!("failed to fetch page {page}: {error:#}");
                scrape
                    .failures
                    .push(PipelineError::PageFetchFailure { page, error });
            }
        }
    }
    Ok(scrape)
}
