pub mod models;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

const API_URL: &str = "https://api.trakt.tv/";
const API_VERSION: &str = "2";
const API_VERSION_HEADER: &str = "trakt-api-version";
const API_KEY_HEADER: &str = "trakt-api-key";
const SUMMARY_EXTENSIONS: &str = "full,images";

#[derive(Debug, Clone)]
pub struct Client {
    client_id: String,
    base: Url,
    reqwest: reqwest::Client,
}

impl Client {
    /// Create a client authenticating with the application's client id.
    ///
    /// # Errors
    /// [`Error::UrlParseError`]: If the api base url cannot be parsed.
    pub fn new<S>(client_id: S, reqwest: reqwest::Client) -> Result<Self, Error>
    where
        S: Into<String>,
    {
        Ok(Client {
            client_id: client_id.into(),
            base: Url::parse(API_URL)?,
            reqwest,
        })
    }

    fn url(&self, path: &str, extended: Option<&str>) -> Result<Url, Error> {
        let mut url = self.base.join(path)?;
        if let Some(extended) = extended {
            url.query_pairs_mut().append_pair("extended", extended);
        }
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        tracing::trace!("requesting {url}");
        let response = self
            .reqwest
            .get(url)
            .header(API_VERSION_HEADER, API_VERSION)
            .header(API_KEY_HEADER, &self.client_id)
            .send()
            .await?;
        handle_response(response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("The provided client id is invalid")]
    Unauthorized,
    #[error("The requested resource could not be found")]
    NotFound,
    #[error("request failed with status code: {0}")]
    Status(StatusCode),
    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),
    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
    #[error(transparent)]
    DeserializationError(#[from] serde_json::Error),
}

async fn handle_response<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, Error> {
    match res.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Err(Error::Unauthorized),
        StatusCode::NOT_FOUND => return Err(Error::NotFound),
        status if !status.is_success() => return Err(Error::Status(status)),
        _ => {}
    }
    let body = res.text().await?;
    match serde_json::from_str(&body) {
        Ok(response) => Ok(response),
        Err(e) => {
            tracing::trace!(body = body, "error deserializing response: {}", e);
            Err(Error::DeserializationError(e))
        }
    }
}

pub mod movies {
    use crate::models::{Movie, User};
    use crate::{Client, Error, SUMMARY_EXTENSIONS};

    /// Full summary of a movie.
    ///
    /// # Errors
    /// [`Error::NotFound`]: If no movie has the given slug or id.
    pub async fn summary(client: &Client, id: &str) -> Result<Movie, Error> {
        let url = client.url(&format!("movies/{id}"), Some(SUMMARY_EXTENSIONS))?;
        client.get(url).await
    }

    /// Users currently watching a movie.
    ///
    /// # Errors
    /// [`Error::NotFound`]: If no movie has the given slug or id.
    pub async fn watching(client: &Client, id: &str) -> Result<Vec<User>, Error> {
        let url = client.url(&format!("movies/{id}/watching"), None)?;
        client.get(url).await
    }
}

pub mod shows {
    use crate::models::{Show, User};
    use crate::{Client, Error, SUMMARY_EXTENSIONS};

    /// Full summary of a show.
    ///
    /// # Errors
    /// [`Error::NotFound`]: If no show has the given slug or id.
    pub async fn summary(client: &Client, id: &str) -> Result<Show, Error> {
        let url = client.url(&format!("shows/{id}"), Some(SUMMARY_EXTENSIONS))?;
        client.get(url).await
    }

    /// Users currently watching a show.
    ///
    /// # Errors
    /// [`Error::NotFound`]: If no show has the given slug or id.
    pub async fn watching(client: &Client, id: &str) -> Result<Vec<User>, Error> {
        let url = client.url(&format!("shows/{id}/watching"), None)?;
        client.get(url).await
    }
}
