use async_trait::async_trait;
use url::Url;

use crate::errors::InternalError;
use crate::models::RawListing;
use crate::scraper::{SearchPage, SearchProvider, SearchQuery};

/// [`SearchProvider`] backed by the KAT JSON search endpoint.
#[derive(Clone, Debug)]
pub struct KatSearch {
    client: reqwest::Client,
    base: Url,
}

impl KatSearch {
    #[must_use]
    pub fn new(client: reqwest::Client, base: Url) -> Self {
        Self { client, base }
    }
}

impl From<&SearchQuery> for ::kat::Query {
    fn from(query: &SearchQuery) -> Self {
        Self {
            query: query.text.clone(),
            category: query.category.clone(),
            verified: query.verified,
            adult_filter: query.adult_filter,
            page: query.page,
        }
    }
}

#[async_trait]
impl SearchProvider for KatSearch {
    async fn search(&self, query: &SearchQuery) -> Result<SearchPage, InternalError> {
        let result = ::kat::search(&self.client, &self.base, &query.into()).await?;
        Ok(SearchPage {
            results: result.results.into_iter().map(RawListing::from).collect(),
            total_pages: Some(result.total_pages),
        })
    }
}
