pub type InternalError = anyhow::Error;

/// Everything that can drop a page or a candidate from a run.
///
/// Only [`PipelineError::PrimingFailure`] ends a run early, every other
/// variant is recorded in the run report and the run moves on.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("{0} didn't match any known title pattern")]
    UnrecognizedTitle(String),
    #[error("failed to fetch page {page}: {error:#}")]
    PageFetchFailure { page: u32, error: InternalError },
    #[error("failed to determine total pages: {0}")]
    PrimingFailure(String),
    #[error("no catalog entry for {0}")]
    EnrichmentMiss(String),
    #[error("failed to look up {slug}: {error:#}")]
    EnrichmentFailure { slug: String, error: InternalError },
    #[error("failed to persist {id}: {error:#}")]
    PersistenceFailure { id: String, error: InternalError },
}

impl PipelineError {
    /// Whether this is a real failure rather than an expected skip.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !matches!(
            self,
            PipelineError::UnrecognizedTitle(_) | PipelineError::EnrichmentMiss(_)
        )
    }
}
