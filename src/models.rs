use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use kitsu::models as kitsu;
use trakt::models as trakt;

#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Movie,
    Show,
    Anime,
}

impl ContentKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Movie => "movie",
            ContentKind::Show => "show",
            ContentKind::Anime => "anime",
        }
    }

    #[must_use]
    pub fn is_episodic(self) -> bool {
        !matches!(self, ContentKind::Movie)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl FromStr for ContentKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(ContentKind::Movie),
            "show" => Ok(ContentKind::Show),
            "anime" => Ok(ContentKind::Anime),
            _ => Err(UnknownVariant {
                kind: "content kind",
                value: s.into(),
            }),
        }
    }
}

/// Resolution tag of a torrent. Ordered from lowest to highest.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quality {
    #[serde(rename = "480p")]
    Sd,
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "1080p")]
    FullHd,
    #[serde(rename = "2160p")]
    UltraHd,
}

impl Quality {
    /// Used when a title carries no known resolution tag.
    pub const FALLBACK: Quality = Quality::Sd;

    #[must_use]
    pub fn from_resolution(lines: u16) -> Option<Self> {
        match lines {
            480 => Some(Quality::Sd),
            720 => Some(Quality::Hd),
            1080 => Some(Quality::FullHd),
            2160 => Some(Quality::UltraHd),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Quality::Sd => "480p",
            Quality::Hd => "720p",
            Quality::FullHd => "1080p",
            Quality::UltraHd => "2160p",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownVariant {
            kind: "quality",
            value: s.into(),
        };
        let lines = s
            .strip_suffix(['p', 'P'])
            .and_then(|n| n.parse().ok())
            .ok_or_else(unknown)?;
        Quality::from_resolution(lines).ok_or_else(unknown)
    }
}

/// One search result as returned by the torrent index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawListing {
    pub title: String,
    pub link: String,
    pub magnet: String,
    pub seeds: u32,
    pub peers: u32,
}

impl From<::kat::Torrent> for RawListing {
    fn from(t: ::kat::Torrent) -> Self {
        Self {
            title: t.title,
            link: t.link,
            magnet: t.magnet,
            seeds: t.seeds,
            peers: t.peers,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TorrentVariant {
    pub url: String,
    pub seeds: u32,
    pub peers: u32,
    pub provider: String,
}

pub type QualityMap = BTreeMap<Quality, TorrentVariant>;
pub type EpisodeMap = BTreeMap<u32, BTreeMap<u32, QualityMap>>;

/// The torrent cells of a record: quality for movies, season/episode/quality otherwise.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "layout", content = "cells", rename_all = "lowercase")]
pub enum Torrents {
    Movie(QualityMap),
    Episodes(EpisodeMap),
}

impl Torrents {
    #[must_use]
    pub fn empty(kind: ContentKind) -> Self {
        if kind.is_episodic() {
            Torrents::Episodes(EpisodeMap::new())
        } else {
            Torrents::Movie(QualityMap::new())
        }
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Torrents::Movie(qualities) => qualities.len(),
            Torrents::Episodes(seasons) => seasons
                .values()
                .flat_map(BTreeMap::values)
                .map(BTreeMap::len)
                .sum(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shown by clients when the catalog has no artwork of a kind.
pub const PLACEHOLDER_IMAGE: &str = "images/posterholder.png";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Images {
    pub poster: String,
    pub fanart: String,
    pub banner: String,
}

impl Images {
    fn from_urls(poster: Option<Url>, fanart: Option<Url>, banner: Option<Url>) -> Self {
        let or_placeholder =
            |url: Option<Url>| url.map_or_else(|| PLACEHOLDER_IMAGE.to_owned(), String::from);
        Self {
            poster: or_placeholder(poster),
            fanart: or_placeholder(fanart),
            banner: or_placeholder(banner),
        }
    }
}

impl Default for Images {
    fn default() -> Self {
        Self::from_urls(None, None, None)
    }
}

impl From<trakt::Images> for Images {
    fn from(images: trakt::Images) -> Self {
        Self::from_urls(images.poster.full, images.fanart.full, images.banner.full)
    }
}

fn image_url(images: kitsu::Images) -> Url {
    images.large.unwrap_or(images.original)
}

#[derive(Serialize, Deserialize, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rating {
    pub percentage: u8,
    pub votes: u32,
    pub watching: u32,
}

impl Rating {
    /// `score` is on a 0 to 10 scale.
    #[must_use]
    pub fn new(score: Option<f64>, votes: u32, watching: u32) -> Self {
        let percentage = score.map_or(0, |s| (s * 10.0).round().clamp(0.0, 100.0) as u8);
        Self {
            percentage,
            votes,
            watching,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Metadata {
    pub synopsis: Option<String>,
    pub runtime: Option<u32>,
    pub released: Option<DateTime<Utc>>,
    pub certification: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub genres: Vec<String>,
    pub images: Images,
    pub rating: Rating,
    pub trailer: Option<Url>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContentRecord {
    pub id: String,
    pub kind: ContentKind,
    pub slug: String,
    pub title: String,
    pub year: Option<i32>,
    pub metadata: Metadata,
    pub torrents: Torrents,
}

impl ContentRecord {
    /// Build a record shell with no torrents from a catalog summary.
    #[must_use]
    pub fn from_canonical(
        kind: ContentKind,
        slug: &str,
        canonical: CanonicalMetadata,
        watching: u32,
    ) -> Self {
        let genres = if canonical.genres.is_empty() {
            vec!["unknown".into()]
        } else {
            canonical.genres
        };
        Self {
            id: canonical.id,
            kind,
            slug: slug.into(),
            title: canonical.title,
            year: canonical.year,
            metadata: Metadata {
                synopsis: canonical.synopsis,
                runtime: canonical.runtime,
                released: canonical.released,
                certification: canonical.certification,
                country: canonical.country,
                genres,
                images: canonical.images,
                rating: Rating::new(canonical.score, canonical.votes, watching),
                trailer: canonical.trailer,
            },
            torrents: Torrents::empty(kind),
        }
    }
}

/// The catalog fields consumed by enrichment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CanonicalMetadata {
    pub id: String,
    pub title: String,
    pub year: Option<i32>,
    pub synopsis: Option<String>,
    pub runtime: Option<u32>,
    pub released: Option<DateTime<Utc>>,
    pub certification: Option<String>,
    pub country: Option<String>,
    pub genres: Vec<String>,
    pub images: Images,
    pub trailer: Option<Url>,
    /// 0 to 10.
    pub score: Option<f64>,
    pub votes: u32,
}

#[derive(Debug, thiserror::Error)]
#[error("catalog entry {0} has no imdb id")]
pub struct MissingImdbId(pub u64);

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

impl TryFrom<trakt::Movie> for CanonicalMetadata {
    type Error = MissingImdbId;

    fn try_from(movie: trakt::Movie) -> Result<Self, Self::Error> {
        let id = movie.ids.imdb.ok_or(MissingImdbId(movie.ids.trakt))?;
        Ok(Self {
            id,
            title: movie.title,
            year: movie.year,
            synopsis: movie.overview,
            runtime: movie.runtime,
            released: movie.released.map(midnight),
            certification: movie.certification,
            country: movie.language,
            genres: movie.genres.unwrap_or_default(),
            images: movie.images.into(),
            trailer: movie.trailer,
            score: movie.rating,
            votes: movie.votes.unwrap_or_default(),
        })
    }
}

impl TryFrom<trakt::Show> for CanonicalMetadata {
    type Error = MissingImdbId;

    fn try_from(show: trakt::Show) -> Result<Self, Self::Error> {
        let id = show.ids.imdb.ok_or(MissingImdbId(show.ids.trakt))?;
        Ok(Self {
            id,
            title: show.title,
            year: show.year,
            synopsis: show.overview,
            runtime: show.runtime,
            released: show.first_aired,
            certification: show.certification,
            country: show.language,
            genres: show.genres.unwrap_or_default(),
            images: show.images.into(),
            trailer: show.trailer,
            score: show.rating,
            votes: show.votes.unwrap_or_default(),
        })
    }
}

impl From<kitsu::Anime> for CanonicalMetadata {
    fn from(anime: kitsu::Anime) -> Self {
        let attributes = anime.attributes;
        let started = attributes
            .start_date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
        let trailer = attributes
            .youtube_video_id
            .filter(|id| !id.is_empty())
            .and_then(|id| Url::parse_with_params("https://www.youtube.com/watch", [("v", id)]).ok());
        Self {
            id: anime.id,
            title: attributes.titles.en.unwrap_or(attributes.canonical_title),
            year: started.map(|d| d.year()),
            synopsis: attributes.synopsis,
            runtime: attributes.episode_length,
            released: started.map(midnight),
            certification: attributes.age_rating,
            country: None,
            genres: Vec::new(),
            images: Images::from_urls(
                attributes.poster_image.map(image_url),
                attributes.cover_image.map(image_url),
                None,
            ),
            trailer,
            score: attributes
                .average_rating
                .and_then(|r| r.parse::<f64>().ok())
                .map(|r| r / 10.0),
            votes: attributes.user_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_from_str() {
        assert_eq!("720p".parse::<Quality>().unwrap(), Quality::Hd);
        assert_eq!("1080P".parse::<Quality>().unwrap(), Quality::FullHd);
        assert!("540p".parse::<Quality>().is_err());
        assert!("hd".parse::<Quality>().is_err());
    }

    #[test]
    fn test_rating_percentage_rounds_and_clamps() {
        assert_eq!(Rating::new(Some(7.46), 10, 2).percentage, 75);
        assert_eq!(Rating::new(Some(12.0), 0, 0).percentage, 100);
        assert_eq!(Rating::new(None, 0, 0).percentage, 0);
    }

    #[test]
    fn test_torrents_len_counts_nested_cells() {
        let variant = TorrentVariant {
            url: "magnet:?xt=urn:btih:aa".into(),
            seeds: 1,
            peers: 0,
            provider: "test".into(),
        };
        let mut seasons = EpisodeMap::new();
        let season = seasons.entry(1).or_default();
        season
            .entry(1)
            .or_default()
            .insert(Quality::Hd, variant.clone());
        season
            .entry(2)
            .or_default()
            .insert(Quality::Hd, variant.clone());
        season.entry(2).or_default().insert(Quality::FullHd, variant);
        assert_eq!(Torrents::Episodes(seasons).len(), 3);
        assert!(Torrents::empty(ContentKind::Movie).is_empty());
    }

    #[test]
    fn test_torrents_json_round_trip_keeps_cells() {
        let mut qualities = QualityMap::new();
        qualities.insert(
            Quality::FullHd,
            TorrentVariant {
                url: "magnet:?xt=urn:btih:bb".into(),
                seeds: 5,
                peers: 1,
                provider: "KAT Movies".into(),
            },
        );
        let torrents = Torrents::Movie(qualities);
        let json = serde_json::to_value(&torrents).unwrap();
        assert_eq!(json["layout"], "movie");
        assert_eq!(json["cells"]["1080p"]["seeds"], 5);
        let back: Torrents = serde_json::from_value(json).unwrap();
        assert_eq!(back, torrents);
    }

    #[test]
    fn test_record_from_canonical_defaults_genres() {
        let canonical = CanonicalMetadata {
            id: "tt1234567".into(),
            title: "Movie Title".into(),
            year: Some(2019),
            score: Some(6.0),
            votes: 12,
            ..Default::default()
        };
        let record = ContentRecord::from_canonical(ContentKind::Movie, "movie-title", canonical, 3);
        assert_eq!(record.id, "tt1234567");
        assert_eq!(record.slug, "movie-title");
        assert_eq!(record.metadata.genres, vec!["unknown".to_string()]);
        assert_eq!(
            record.metadata.rating,
            Rating {
                percentage: 60,
                votes: 12,
                watching: 3
            }
        );
        assert_eq!(record.torrents, Torrents::Movie(QualityMap::new()));
        assert_eq!(record.metadata.images.poster, PLACEHOLDER_IMAGE);
    }

    fn trakt_movie(images: trakt::Images) -> trakt::Movie {
        trakt::Movie {
            title: "Movie Title".into(),
            year: Some(2019),
            ids: trakt::Ids {
                trakt: 1,
                slug: Some("movie-title-2019".into()),
                imdb: Some("tt1234567".into()),
                tmdb: None,
                tvdb: None,
            },
            overview: None,
            runtime: None,
            rating: Some(7.5),
            votes: Some(10),
            language: Some("en".into()),
            released: None,
            trailer: None,
            certification: None,
            genres: None,
            images,
        }
    }

    #[test]
    fn test_trakt_movie_keeps_artwork_and_country() {
        let mut images = trakt::Images::default();
        images.poster.full = Url::parse("https://walter.trakt.tv/poster.jpg").ok();
        let canonical = CanonicalMetadata::try_from(trakt_movie(images)).unwrap();
        assert_eq!(canonical.images.poster, "https://walter.trakt.tv/poster.jpg");
        assert_eq!(canonical.images.fanart, PLACEHOLDER_IMAGE);
        assert_eq!(canonical.images.banner, PLACEHOLDER_IMAGE);
        assert_eq!(canonical.country.as_deref(), Some("en"));
    }

    #[test]
    fn test_trakt_movie_without_artwork_uses_placeholders() {
        let canonical = CanonicalMetadata::try_from(trakt_movie(trakt::Images::default())).unwrap();
        assert_eq!(canonical.images, Images::default());
        assert_eq!(canonical.images.poster, PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_metadata_without_country_deserializes() {
        let mut json = serde_json::to_value(Metadata::default()).unwrap();
        json.as_object_mut().unwrap().remove("country");
        let metadata: Metadata = serde_json::from_value(json).unwrap();
        assert_eq!(metadata.country, None);
    }
}
