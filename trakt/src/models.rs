use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ids {
    pub trakt: u64,
    pub slug: Option<String>,
    pub imdb: Option<String>,
    pub tmdb: Option<u64>,
    pub tvdb: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSizes {
    pub full: Option<Url>,
    pub medium: Option<Url>,
    pub thumb: Option<Url>,
}

/// Artwork served with `extended=images`. Missing kinds deserialize empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Images {
    pub poster: ImageSizes,
    pub fanart: ImageSizes,
    pub banner: ImageSizes,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movie {
    pub title: String,
    pub year: Option<i32>,
    pub ids: Ids,
    pub overview: Option<String>,
    pub runtime: Option<u32>,
    pub rating: Option<f64>,
    pub votes: Option<u32>,
    pub language: Option<String>,
    pub released: Option<NaiveDate>,
    pub trailer: Option<Url>,
    pub certification: Option<String>,
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub images: Images,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Show {
    pub title: String,
    pub year: Option<i32>,
    pub ids: Ids,
    pub overview: Option<String>,
    pub runtime: Option<u32>,
    pub rating: Option<f64>,
    pub votes: Option<u32>,
    pub language: Option<String>,
    pub first_aired: Option<DateTime<Utc>>,
    pub trailer: Option<Url>,
    pub certification: Option<String>,
    pub genres: Option<Vec<String>>,
    pub network: Option<String>,
    pub status: Option<String>,
    pub aired_episodes: Option<u32>,
    #[serde(default)]
    pub images: Images,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub private: bool,
    pub name: Option<String>,
}
