use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{Executor, FromRow, Postgres};
use tracing::trace;

use crate::errors::InternalError;
use crate::models::{ContentRecord, Metadata, Torrents};
use crate::reconcile::ContentRepository;
use crate::state::DBPool;

const SELECT_BY_ID: &str = include_str!("../../../queries/content/select_by_id.sql");
const UPSERT: &str = include_str!("../../../queries/content/upsert.sql");

#[derive(Debug, FromRow)]
struct ContentEntity {
    id: String,
    kind: String,
    slug: String,
    title: String,
    year: Option<i32>,
    metadata: Json<Metadata>,
    torrents: Json<Torrents>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContentEntity> for ContentRecord {
    type Error = InternalError;

    fn try_from(entity: ContentEntity) -> Result<Self, Self::Error> {
        Ok(ContentRecord {
            kind: entity.kind.parse()?,
            id: entity.id,
            slug: entity.slug,
            title: entity.title,
            year: entity.year,
            metadata: entity.metadata.0,
            torrents: entity.torrents.0,
        })
    }
}

async fn select_by_id<'e, E>(executor: E, id: &str) -> anyhow::Result<Option<ContentEntity>>
where
    E: Executor<'e, Database = Postgres>,
{
    let entity = sqlx::query_as::<_, ContentEntity>(SELECT_BY_ID)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(entity)
}

async fn upsert<'e, E>(executor: E, record: &ContentRecord) -> anyhow::Result<ContentEntity>
where
    E: Executor<'e, Database = Postgres>,
{
    let entity = sqlx::query_as::<_, ContentEntity>(UPSERT)
        .bind(&record.id)
        .bind(record.kind.as_str())
        .bind(&record.slug)
        .bind(&record.title)
        .bind(record.year)
        .bind(Json(&record.metadata))
        .bind(Json(&record.torrents))
        .fetch_one(executor)
        .await?;
    Ok(entity)
}

/// Content records stored as one row each, metadata and torrents as JSONB.
#[derive(Debug, Clone)]
pub struct PgContentRepository {
    pool: DBPool,
}

impl PgContentRepository {
    #[must_use]
    pub fn new(pool: DBPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<ContentRecord>, InternalError> {
        select_by_id(&self.pool, id)
            .await?
            .map(ContentRecord::try_from)
            .transpose()
    }

    async fn upsert(&self, record: &ContentRecord) -> Result<ContentRecord, InternalError> {
        let entity = upsert(&self.pool, record).await?;
        trace!(id = %entity.id, updated_at = %entity.updated_at, "upserted");
        entity.try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentKind, QualityMap};

    fn entity(kind: &str) -> ContentEntity {
        ContentEntity {
            id: "tt0000001".into(),
            kind: kind.into(),
            slug: "movie-title".into(),
            title: "Movie Title".into(),
            year: Some(2019),
            metadata: Json(Metadata::default()),
            torrents: Json(Torrents::Movie(QualityMap::new())),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_entity_into_record() {
        let record = ContentRecord::try_from(entity("movie")).unwrap();
        assert_eq!(record.kind, ContentKind::Movie);
        assert_eq!(record.slug, "movie-title");
        assert_eq!(record.year, Some(2019));
    }

    #[test]
    fn test_entity_with_unknown_kind_fails() {
        assert!(ContentRecord::try_from(entity("documentary")).is_err());
    }

    #[test]
    fn test_queries_target_content_table() {
        assert!(SELECT_BY_ID.contains("FROM content"));
        assert!(UPSERT.contains("ON CONFLICT (id) DO UPDATE"));
    }
}
