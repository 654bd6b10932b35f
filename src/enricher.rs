use async_trait::async_trait;
use tracing::{instrument, trace, warn};

use crate::errors::{InternalError, PipelineError};
use crate::merger::BatchEntry;
use crate::models::{CanonicalMetadata, ContentKind, ContentRecord};

pub mod catalog;

/// Source of canonical metadata for discovered titles.
#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// `Ok(None)` when the catalog has no usable entry for `id`.
    async fn summary(
        &self,
        kind: ContentKind,
        id: &str,
    ) -> Result<Option<CanonicalMetadata>, InternalError>;

    /// Live watcher count, `Ok(None)` where the catalog has no such notion.
    async fn watchers(&self, kind: ContentKind, id: &str) -> Result<Option<u32>, InternalError>;
}

/// Build the record shell for one batch entry. Torrents are left empty.
///
/// Returns `Ok(None)` if the catalog does not know the entry.
///
/// # Errors
/// [`PipelineError::EnrichmentFailure`] if the summary lookup fails. A failing
/// watcher lookup only degrades the watcher count to zero.
#[instrument(skip(catalog, entry), fields(slug = %entry.slug))]
pub async fn enrich<C>(
    catalog: &C,
    kind: ContentKind,
    entry: &BatchEntry,
) -> Result<Option<ContentRecord>, PipelineError>
where
    C: CatalogProvider + ?Sized,
{
    let id = entry.lookup_id();
    let canonical = catalog
        .summary(kind, &id)
        .await
        .map_err(|error| PipelineError::EnrichmentFailure {
            slug: entry.slug.clone(),
            error,
        })?;
    let Some(canonical) = canonical else {
        trace!("no catalog entry for {id}");
        return Ok(None);
    };

    let watching = match catalog.watchers(kind, &id).await {
        Ok(count) => count.unwrap_or_default(),
        Err(e) => {
            warn!("failed to get watchers for {id}: {e:#}");
            0
        }
    };

    Ok(Some(ContentRecord::from_canonical(
        kind,
        &entry.slug,
        canonical,
        watching,
    )))
}
