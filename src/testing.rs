//! In-memory stand-ins for the external collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::anyhow;
use async_trait::async_trait;

use crate::enricher::CatalogProvider;
use crate::errors::InternalError;
use crate::models::{CanonicalMetadata, ContentKind, ContentRecord, RawListing};
use crate::reconcile::ContentRepository;
use crate::scraper::{SearchPage, SearchProvider, SearchQuery};

pub fn listing(title: &str, seeds: u32) -> RawListing {
    RawListing {
        title: title.into(),
        link: format!("https://kat.cr/{}.html", title.to_lowercase()),
        magnet: format!("magnet:?xt=urn:btih:{seeds:08}&dn={title}"),
        seeds,
        peers: 0,
    }
}

/// Serves fixed pages and remembers which ones were asked for.
#[derive(Debug, Default)]
pub struct ScriptedSearch {
    pages: Vec<Vec<RawListing>>,
    failing: HashSet<u32>,
    requested: Mutex<Vec<u32>>,
}

impl ScriptedSearch {
    pub fn new(pages: Vec<Vec<RawListing>>) -> Self {
        Self {
            pages,
            ..Default::default()
        }
    }

    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing.insert(page);
        self
    }

    pub fn requested(&self) -> Vec<u32> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, InternalError> {
        self.requested.lock().unwrap().push(query.page);
        if self.failing.contains(&query.page) {
            return Err(anyhow!("page {} timed out", query.page));
        }
        let index = query.page.saturating_sub(1) as usize;
        Ok(SearchPage {
            results: self.pages.get(index).cloned().unwrap_or_default(),
            total_pages: Some(self.pages.len() as u32),
        })
    }
}

type CatalogKey = (ContentKind, String);

#[derive(Debug, Default)]
pub struct MemoryCatalog {
    summaries: HashMap<CatalogKey, CanonicalMetadata>,
    watchers: HashMap<CatalogKey, u32>,
    failing: HashSet<String>,
    failing_watchers: bool,
    watcher_calls: AtomicUsize,
}

impl MemoryCatalog {
    pub fn with_summary(mut self, kind: ContentKind, id: &str, summary: CanonicalMetadata) -> Self {
        self.summaries.insert((kind, id.into()), summary);
        self
    }

    pub fn with_watchers(mut self, kind: ContentKind, id: &str, count: u32) -> Self {
        self.watchers.insert((kind, id.into()), count);
        self
    }

    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.into());
        self
    }

    pub fn failing_watchers(mut self) -> Self {
        self.failing_watchers = true;
        self
    }

    pub fn watcher_calls(&self) -> usize {
        self.watcher_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogProvider for MemoryCatalog {
    async fn summary(
        &self,
        kind: ContentKind,
        id: &str,
    ) -> Result<Option<CanonicalMetadata>, InternalError> {
        if self.failing.contains(id) {
            return Err(anyhow!("catalog unavailable"));
        }
        Ok(self.summaries.get(&(kind, id.to_owned())).cloned())
    }

    async fn watchers(&self, kind: ContentKind, id: &str) -> Result<Option<u32>, InternalError> {
        self.watcher_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_watchers {
            return Err(anyhow!("watchers unavailable"));
        }
        Ok(self.watchers.get(&(kind, id.to_owned())).copied())
    }
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    records: Mutex<HashMap<String, ContentRecord>>,
    failing: HashSet<String>,
    yielding: bool,
    writes: AtomicUsize,
}

impl MemoryRepository {
    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.into());
        self
    }

    /// Give other tasks a turn between reading a record and writing it back.
    pub fn yielding(mut self) -> Self {
        self.yielding = true;
        self
    }

    pub fn insert(&self, record: ContentRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.id.clone(), record);
    }

    pub fn get(&self, id: &str) -> Option<ContentRecord> {
        self.records.lock().unwrap().get(id).cloned()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentRepository for MemoryRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<ContentRecord>, InternalError> {
        if self.failing.contains(id) {
            return Err(anyhow!("connection reset"));
        }
        let record = self.get(id);
        if self.yielding {
            tokio::task::yield_now().await;
        }
        Ok(record)
    }

    async fn upsert(&self, record: &ContentRecord) -> Result<ContentRecord, InternalError> {
        if self.failing.contains(&record.id) {
            return Err(anyhow!("connection reset"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.insert(record.clone());
        Ok(record.clone())
    }
}
