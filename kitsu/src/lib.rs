pub mod models;
mod params;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::trace;
use url::Url;

const BASE_URL: &str = "https://kitsu.io/api/edge/";
const JSON_API_TYPE: &str = "application/vnd.api+json";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error("request failed with status code: {0}")]
    Status(StatusCode),
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Copy, Clone, Deserialize)]
pub struct Meta {
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Links {
    pub first: Option<Url>,
    pub next: Option<Url>,
    pub last: Option<Url>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Collection<T> {
    pub data: Vec<T>,
    pub meta: Option<Meta>,
    pub links: Option<Links>,
}

async fn get_document<T>(client: &reqwest::Client, url: Url) -> Result<T>
where
    T: DeserializeOwned,
{
    trace!("requesting {url}");
    let response = client
        .get(url)
        .header(ACCEPT, JSON_API_TYPE)
        .header(CONTENT_TYPE, JSON_API_TYPE)
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status(status));
    }
    let body = response.bytes().await?;
    let document = serde_json::from_slice(&body)?;
    Ok(document)
}

pub mod anime {
    use std::borrow::Cow;

    use crate::params::{JsonFilterKey, PageKey};
    use crate::{get_document, models, Collection, Result, BASE_URL};
    use url::Url;

    /// Look up an anime by its kitsu slug.
    ///
    /// An empty result collection is reported as `Ok(None)`.
    pub async fn by_slug(client: &reqwest::Client, slug: &str) -> Result<Option<models::Anime>> {
        let url = slug_url(slug)?;
        let collection: Collection<models::Anime> = get_document(client, url).await?;
        Ok(collection.data.into_iter().next())
    }

    pub(crate) fn slug_url(slug: &str) -> Result<Url> {
        let mut url = Url::parse(BASE_URL)?.join("anime")?;
        let filter: Cow<str> = JsonFilterKey("slug").into();
        let limit: Cow<str> = PageKey("limit").into();
        url.query_pairs_mut()
            .append_pair(&filter, slug)
            .append_pair(&limit, "1");
        Ok(url)
    }
}
