use anyhow::anyhow;
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::errors::{InternalError, PipelineError};
use crate::merger::supersedes;
use crate::models::{ContentRecord, QualityMap, Torrents};

/// Persisted content, keyed by record id. Each upsert must be atomic per key.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<ContentRecord>, InternalError>;

    async fn upsert(&self, record: &ContentRecord) -> Result<ContentRecord, InternalError>;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Reconciled {
    Inserted,
    Updated,
    /// The stored record already was the merge result; nothing was written.
    Unchanged,
}

fn merge_cells(stored: &mut QualityMap, discovered: QualityMap) {
    for (quality, variant) in discovered {
        if supersedes(&variant, stored.get(&quality)) {
            stored.insert(quality, variant);
        }
    }
}

/// Cell-wise union of two torrent maps. A discovered variant only replaces a
/// stored one with strictly more seeds.
#[must_use]
pub fn merge_torrents(stored: Torrents, discovered: Torrents) -> Torrents {
    match (stored, discovered) {
        (Torrents::Movie(mut stored), Torrents::Movie(discovered)) => {
            merge_cells(&mut stored, discovered);
            Torrents::Movie(stored)
        }
        (Torrents::Episodes(mut stored), Torrents::Episodes(discovered)) => {
            for (season, episodes) in discovered {
                let stored_season = stored.entry(season).or_default();
                for (episode, cells) in episodes {
                    merge_cells(stored_season.entry(episode).or_default(), cells);
                }
            }
            Torrents::Episodes(stored)
        }
        (stored, _) => {
            debug!("discarding discovered torrents with a different layout");
            stored
        }
    }
}

/// Fresh metadata with the torrents of both records merged.
#[must_use]
pub fn merge_record(stored: ContentRecord, fresh: ContentRecord) -> ContentRecord {
    ContentRecord {
        torrents: merge_torrents(stored.torrents, fresh.torrents),
        ..fresh
    }
}

fn persistence_failure(id: &str) -> impl FnOnce(InternalError) -> PipelineError + '_ {
    move |error| PipelineError::PersistenceFailure {
        id: id.to_owned(),
        error,
    }
}

/// Merge `record` into whatever is stored under its id and write the result.
///
/// # Errors
/// [`PipelineError::PersistenceFailure`] if the repository fails or the
/// stored record is of another content kind.
#[instrument(skip_all, fields(id = %record.id))]
pub async fn reconcile<R>(repository: &R, record: ContentRecord) -> Result<Reconciled, PipelineError>
where
    R: ContentRepository + ?Sized,
{
    let id = record.id.clone();
    let stored = repository
        .find_by_id(&id)
        .await
        .map_err(persistence_failure(&id))?;

    let (merged, outcome) = match stored {
        None => (record, Reconciled::Inserted),
        Some(stored) if stored.kind != record.kind => {
            return Err(persistence_failure(&id)(anyhow!(
                "stored as {} but discovered as {}",
                stored.kind,
                record.kind
            )));
        }
        Some(stored) => {
            let merged = merge_record(stored.clone(), record);
            if merged == stored {
                debug!("unchanged");
                return Ok(Reconciled::Unchanged);
            }
            (merged, Reconciled::Updated)
        }
    };

    repository
        .upsert(&merged)
        .await
        .map_err(persistence_failure(&id))?;
    debug!(?outcome, cells = merged.torrents.len(), "persisted");
    Ok(outcome)
}
