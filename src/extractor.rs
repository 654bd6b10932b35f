use std::num::ParseIntError;

use regex::{Captures, Regex};
use tracing::{instrument, trace};

use crate::errors::PipelineError;
use crate::models::{ContentKind, Quality, RawListing, TorrentVariant};

pub mod slug;

const MOVIE_YEAR_REGEX: &str =
    r"(?i)^(?P<title>.+)[\s._\-(\[]+(?P<year>(?:19|20)\d{2})(?:[\s._\-)\]]|$)";
const MOVIE_RESOLUTION_REGEX: &str = r"(?i)^(?P<title>.+?)[\s._\-(\[]+\d{3,4}p(?:[^0-9a-z]|$)";
const EPISODE_CODE_REGEX: &str = r"(?i)^(?:\[[^\]]*\][\s._]*)?(?P<title>.+?)[\s._\-]+S(?P<season>\d{1,2})[\s._]?E(?P<episode>\d{1,3})(?:[^0-9]|$)";
const FANSUB_SEASON_REGEX: &str = r"(?i)^\[[^\]]*\][\s._]*(?P<title>.+?)[\s._]+S(?P<season>\d{1,2})[\s._]+-[\s._]+(?P<episode>\d{1,4})(?:v\d+)?[\s._]+[\[(](?P<lines>\d{3,4})p[\])]";
const FANSUB_REGEX: &str = r"(?i)^\[[^\]]*\][\s._]*(?P<title>.+?)[\s._]+-[\s._]+(?P<episode>\d{1,4})(?:v\d+)?[\s._]+[\[(](?P<lines>\d{3,4})p[\])]";
const QUALITY_REGEX: &str = r"(?i)(?:^|[^0-9a-z])(?P<lines>\d{3,4})p(?:[^0-9a-z]|$)";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovieCandidate {
    pub title: String,
    pub slug: String,
    pub year: Option<i32>,
    pub quality: Quality,
    pub torrent: TorrentVariant,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpisodeCandidate {
    pub title: String,
    pub slug: String,
    pub season: u32,
    pub episode: u32,
    pub quality: Quality,
    pub torrent: TorrentVariant,
}

/// A listing after its title has been taken apart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Candidate {
    Movie(MovieCandidate),
    Episode(EpisodeCandidate),
}

impl Candidate {
    #[must_use]
    pub fn slug(&self) -> &str {
        match self {
            Candidate::Movie(m) => &m.slug,
            Candidate::Episode(e) => &e.slug,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        match self {
            Candidate::Movie(m) => &m.title,
            Candidate::Episode(e) => &e.title,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Extractor {
    movie: Vec<Regex>,
    episodic: Vec<Regex>,
    quality: Regex,
}

impl Extractor {
    /// Compile the pattern sets.
    ///
    /// # Errors
    /// Returns an error if one of the built-in patterns fails to compile.
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            movie: vec![
                Regex::new(MOVIE_YEAR_REGEX)?,
                Regex::new(MOVIE_RESOLUTION_REGEX)?,
            ],
            episodic: vec![
                Regex::new(EPISODE_CODE_REGEX)?,
                Regex::new(FANSUB_SEASON_REGEX)?,
                Regex::new(FANSUB_REGEX)?,
            ],
            quality: Regex::new(QUALITY_REGEX)?,
        })
    }

    /// Parse one listing into a candidate for the given content kind.
    ///
    /// # Errors
    /// [`PipelineError::UnrecognizedTitle`] if none of the kind's patterns match.
    #[instrument(level = "trace", skip(self, listing), fields(title = %listing.title))]
    pub fn extract(
        &self,
        listing: RawListing,
        kind: ContentKind,
        provider: &str,
    ) -> Result<Candidate, PipelineError> {
        let patterns = if kind.is_episodic() {
            &self.episodic
        } else {
            &self.movie
        };
        let captures = patterns
            .iter()
            .find_map(|regex| regex.captures(&listing.title))
            .ok_or_else(|| PipelineError::UnrecognizedTitle(listing.title.clone()))?;
        let parts = TitleParts::from_captures(&captures)
            .map_err(|_| PipelineError::UnrecognizedTitle(listing.title.clone()))?;
        trace!(?parts, "matched");

        let quality = parts
            .lines
            .and_then(Quality::from_resolution)
            .unwrap_or_else(|| self.scan_quality(&listing.title));
        let title = slug::normalize_title(&parts.title);
        let slug = slug::slugify(&title);
        if slug.is_empty() {
            return Err(PipelineError::UnrecognizedTitle(listing.title));
        }

        let torrent = TorrentVariant {
            url: listing.magnet,
            seeds: listing.seeds,
            peers: listing.peers,
            provider: provider.to_owned(),
        };

        if !kind.is_episodic() {
            return Ok(Candidate::Movie(MovieCandidate {
                title,
                slug,
                year: parts.year.and_then(|y| i32::try_from(y).ok()),
                quality,
                torrent,
            }));
        }

        match (parts.season.unwrap_or(1), parts.episode) {
            (season @ 1.., Some(episode @ 1..)) => Ok(Candidate::Episode(EpisodeCandidate {
                title,
                slug,
                season,
                episode,
                quality,
                torrent,
            })),
            _ => Err(PipelineError::UnrecognizedTitle(listing.title)),
        }
    }

    /// First known resolution tag in the title, else the fallback.
    fn scan_quality(&self, title: &str) -> Quality {
        self.quality
            .captures_iter(title)
            .filter_map(|cap| cap.name("lines")?.as_str().parse().ok())
            .find_map(Quality::from_resolution)
            .unwrap_or(Quality::FALLBACK)
    }
}

#[derive(Debug)]
struct TitleParts {
    title: String,
    year: Option<u32>,
    season: Option<u32>,
    episode: Option<u32>,
    lines: Option<u16>,
}

impl TitleParts {
    fn from_captures(cap: &Captures) -> Result<TitleParts, ParseIntError> {
        Ok(TitleParts {
            title: string_named_group(cap, "title").unwrap_or_default(),
            year: int_named_group(cap, "year")?,
            season: int_named_group(cap, "season")?,
            episode: int_named_group(cap, "episode")?,
            lines: int_named_group(cap, "lines")?,
        })
    }
}

fn string_named_group(captures: &Captures, name: &str) -> Option<String> {
    match captures.name(name).map(|s| s.as_str())? {
        "" => None,
        s => Some(s.into()),
    }
}

fn int_named_group<T>(captures: &Captures, name: &str) -> Result<Option<T>, ParseIntError>
where
    T: std::str::FromStr<Err = ParseIntError>,
{
    captures
        .name(name)
        .map(|s| s.as_str().parse::<T>())
        .transpose()
}
