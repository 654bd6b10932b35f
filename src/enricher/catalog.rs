use async_trait::async_trait;
use tracing::debug;

use crate::enricher::CatalogProvider;
use crate::errors::InternalError;
use crate::models::{CanonicalMetadata, ContentKind, MissingImdbId};

/// Movies and shows come from trakt, anime from kitsu.
#[derive(Clone, Debug)]
pub struct Catalog {
    trakt: trakt::Client,
    kitsu: reqwest::Client,
}

impl Catalog {
    #[must_use]
    pub fn new(trakt: trakt::Client, kitsu: reqwest::Client) -> Self {
        Self { trakt, kitsu }
    }
}

fn found<T>(result: Result<T, trakt::Error>) -> Result<Option<T>, trakt::Error> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(trakt::Error::NotFound) => Ok(None),
        Err(e) => Err(e),
    }
}

fn with_imdb_id<T>(value: T) -> Option<CanonicalMetadata>
where
    T: TryInto<CanonicalMetadata, Error = MissingImdbId>,
{
    value
        .try_into()
        .inspect_err(|e| debug!("skipping: {e}"))
        .ok()
}

#[async_trait]
impl CatalogProvider for Catalog {
    async fn summary(
        &self,
        kind: ContentKind,
        id: &str,
    ) -> Result<Option<CanonicalMetadata>, InternalError> {
        let canonical = match kind {
            ContentKind::Movie => found(trakt::movies::summary(&self.trakt, id).await)?
                .and_then(with_imdb_id),
            ContentKind::Show => {
                found(trakt::shows::summary(&self.trakt, id).await)?.and_then(with_imdb_id)
            }
            ContentKind::Anime => kitsu::anime::by_slug(&self.kitsu, id)
                .await?
                .map(CanonicalMetadata::from),
        };
        Ok(canonical)
    }

    async fn watchers(&self, kind: ContentKind, id: &str) -> Result<Option<u32>, InternalError> {
        let users = match kind {
            ContentKind::Movie => trakt::movies::watching(&self.trakt, id).await?,
            ContentKind::Show => trakt::shows::watching(&self.trakt, id).await?,
            ContentKind::Anime => return Ok(None),
        };
        Ok(Some(u32::try_from(users.len()).unwrap_or(u32::MAX)))
    }
}
