use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use url::Url;

pub type DBPool = Pool<Postgres>;

#[derive(Debug, Clone)]
pub struct AppState {
    pub client: reqwest::Client,
    pub pool: DBPool,
}

impl AppState {
    /// # Errors
    /// Returns an error if the database settings are missing or invalid.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            pool: create_db_pool()?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct DbConfig {
    host: String,
    port: u16,
    user: String,
    pass: String,
    database: String,
}

impl DbConfig {
    fn url(&self) -> Result<Url> {
        let mut url = Url::parse("postgres://")?;
        url.set_host(Some(&self.host))?;
        url.set_password(Some(&self.pass))
            .map_err(|()| anyhow!("password should be accepted"))?;
        url.set_username(&self.user)
            .map_err(|()| anyhow!("username should be accepted"))?;
        url.set_port(Some(self.port))
            .map_err(|()| anyhow!("port should be accepted"))?;
        url.set_path(&self.database);
        Ok(url)
    }
}

pub(crate) fn create_db_pool() -> Result<DBPool> {
    let config: DbConfig = envy::prefixed("PG_").from_env()?;
    Ok(PgPoolOptions::new().connect_lazy(config.url()?.as_ref())?)
}

fn default_concurrency() -> usize {
    2
}

fn default_interval_minutes() -> u64 {
    60
}

/// Scraper settings, read from `SCRAPER_*` variables.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ScraperConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default)]
    pub kat_url: Option<Url>,
    pub trakt_client_id: String,
    #[serde(default)]
    pub max_pages: Option<u32>,
}

impl ScraperConfig {
    /// # Errors
    /// Returns an error if `SCRAPER_TRAKT_CLIENT_ID` is missing or a value fails to parse.
    pub fn from_env() -> Result<Self> {
        Ok(envy::prefixed("SCRAPER_").from_env()?)
    }

    /// # Errors
    /// Returns an error if the built-in endpoint fails to parse.
    pub fn kat_base(&self) -> Result<Url> {
        match &self.kat_url {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(kat::DEFAULT_URL)?),
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes.max(1) * 60)
    }
}
