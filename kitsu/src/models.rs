use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

#[derive(Deserialize, Clone, Debug)]
pub struct LinkRel {
    #[serde(rename = "self")]
    pub this: Url,
    pub related: Option<Url>,
}

#[derive(Deserialize, Copy, Clone, Debug)]
pub struct ImageMeta {
    pub dimensions: ImageDimensions,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Images {
    pub original: Url,
    pub large: Option<Url>,
    pub medium: Option<Url>,
    pub small: Option<Url>,
    pub tiny: Option<Url>,
    pub meta: Option<ImageMeta>,
}

#[derive(Deserialize, Copy, Clone, Debug)]
pub struct ImageDimension {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Deserialize, Copy, Clone, Debug)]
pub struct ImageDimensions {
    pub large: Option<ImageDimension>,
    pub medium: Option<ImageDimension>,
    pub small: Option<ImageDimension>,
    pub tiny: Option<ImageDimension>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Titles {
    pub en: Option<String>,
    pub en_jp: Option<String>,
    pub ja_jp: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Attributes {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub slug: String,
    pub synopsis: Option<String>,
    pub titles: Titles,
    pub canonical_title: String,
    pub average_rating: Option<String>,
    #[serde(default)]
    pub user_count: u32,
    pub start_date: Option<String>,
    pub age_rating: Option<String>,
    pub subtype: String,
    pub status: String,
    pub poster_image: Option<Images>,
    pub cover_image: Option<Images>,
    pub episode_count: Option<u32>,
    pub episode_length: Option<u32>,
    pub youtube_video_id: Option<String>,
    #[serde(default)]
    pub nsfw: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Anime {
    pub id: String,
    #[serde(rename = "type")]
    pub r#type: String,
    pub links: LinkRel,
    pub attributes: Attributes,
}
