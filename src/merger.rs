use ahash::AHashMap;
use tracing::trace;

use crate::extractor::Candidate;
use crate::models::{ContentKind, Quality, QualityMap, TorrentVariant, Torrents};

/// Whether `incoming` should take a cell currently holding `current`.
///
/// Only a strictly higher seed count displaces an occupant, so ties keep
/// whatever got there first.
#[must_use]
pub fn supersedes(incoming: &TorrentVariant, current: Option<&TorrentVariant>) -> bool {
    match current {
        None => true,
        Some(current) => incoming.seeds > current.seeds,
    }
}

fn offer(cells: &mut QualityMap, quality: Quality, incoming: TorrentVariant) {
    if supersedes(&incoming, cells.get(&quality)) {
        cells.insert(quality, incoming);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct BatchKey {
    episodic: bool,
    title: String,
    slug: String,
}

/// One deduplicated content entry of a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchEntry {
    pub title: String,
    pub slug: String,
    pub year: Option<i32>,
    pub torrents: Torrents,
}

impl BatchEntry {
    fn absorb(&mut self, candidate: Candidate) {
        match (&mut self.torrents, candidate) {
            (Torrents::Movie(cells), Candidate::Movie(movie)) => {
                if self.year.is_none() {
                    self.year = movie.year;
                }
                offer(cells, movie.quality, movie.torrent);
            }
            (Torrents::Episodes(seasons), Candidate::Episode(episode)) => {
                let cells = seasons
                    .entry(episode.season)
                    .or_default()
                    .entry(episode.episode)
                    .or_default();
                offer(cells, episode.quality, episode.torrent);
            }
            (_, candidate) => trace!("ignoring {} with a different layout", candidate.slug()),
        }
    }

    /// Identifier handed to the catalog. Movie slugs there carry the release year.
    #[must_use]
    pub fn lookup_id(&self) -> String {
        match (&self.torrents, self.year) {
            (Torrents::Movie(_), Some(year)) => format!("{}-{year}", self.slug),
            _ => self.slug.clone(),
        }
    }
}

impl From<Candidate> for BatchEntry {
    fn from(candidate: Candidate) -> Self {
        let kind = match candidate {
            Candidate::Movie(_) => ContentKind::Movie,
            Candidate::Episode(_) => ContentKind::Show,
        };
        let mut entry = BatchEntry {
            title: candidate.title().to_owned(),
            slug: candidate.slug().to_owned(),
            year: None,
            torrents: Torrents::empty(kind),
        };
        entry.absorb(candidate);
        entry
    }
}

/// Candidates of one run folded by (title, slug), in order of first sighting.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    index: AHashMap<BatchKey, usize>,
    entries: Vec<BatchEntry>,
}

impl Batch {
    pub fn push(&mut self, candidate: Candidate) {
        let key = BatchKey {
            episodic: matches!(candidate, Candidate::Episode(_)),
            title: candidate.title().to_owned(),
            slug: candidate.slug().to_owned(),
        };
        match self.index.get(&key) {
            Some(&position) => self.entries[position].absorb(candidate),
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(BatchEntry::from(candidate));
            }
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn into_entries(self) -> Vec<BatchEntry> {
        self.entries
    }
}

impl Extend<Candidate> for Batch {
    fn extend<T: IntoIterator<Item = Candidate>>(&mut self, iter: T) {
        for candidate in iter {
            self.push(candidate);
        }
    }
}

impl FromIterator<Candidate> for Batch {
    fn from_iter<T: IntoIterator<Item = Candidate>>(iter: T) -> Self {
        let mut batch = Batch::default();
        batch.extend(iter);
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{EpisodeCandidate, MovieCandidate};

    fn variant(url: &str, seeds: u32) -> TorrentVariant {
        TorrentVariant {
            url: url.into(),
            seeds,
            peers: 0,
            provider: "test".into(),
        }
    }

    fn movie(slug: &str, year: Option<i32>, quality: Quality, url: &str, seeds: u32) -> Candidate {
        Candidate::Movie(MovieCandidate {
            title: "Movie Title".into(),
            slug: slug.into(),
            year,
            quality,
            torrent: variant(url, seeds),
        })
    }

    fn episode(season: u32, episode: u32, url: &str, seeds: u32) -> Candidate {
        Candidate::Episode(EpisodeCandidate {
            title: "Show Name".into(),
            slug: "show-name".into(),
            season,
            episode,
            quality: Quality::Hd,
            torrent: variant(url, seeds),
        })
    }

    fn movie_cells(entry: &BatchEntry) -> &QualityMap {
        match &entry.torrents {
            Torrents::Movie(cells) => cells,
            Torrents::Episodes(_) => panic!("expected movie layout"),
        }
    }

    #[test]
    fn test_supersedes() {
        let current = variant("a", 10);
        assert!(supersedes(&variant("b", 1), None));
        assert!(supersedes(&variant("b", 11), Some(&current)));
        assert!(!supersedes(&variant("b", 10), Some(&current)));
        assert!(!supersedes(&variant("b", 9), Some(&current)));
    }

    #[test]
    fn test_same_slug_across_pages_merges_qualities() {
        let batch: Batch = [
            movie("movie-title", Some(2019), Quality::Hd, "p1-720", 10),
            movie("movie-title", Some(2019), Quality::FullHd, "p2-1080", 5),
            movie("movie-title", Some(2019), Quality::Hd, "p2-720", 20),
        ]
        .into_iter()
        .collect();

        assert_eq!(batch.len(), 1);
        let entries = batch.into_entries();
        let cells = movie_cells(&entries[0]);
        assert_eq!(entries[0].slug, "movie-title");
        assert_eq!(cells[&Quality::FullHd], variant("p2-1080", 5));
        assert_eq!(cells[&Quality::Hd], variant("p2-720", 20));
    }

    #[test]
    fn test_equal_seeds_keep_first_seen() {
        let batch: Batch = [
            movie("movie-title", None, Quality::Hd, "first", 10),
            movie("movie-title", None, Quality::Hd, "second", 10),
        ]
        .into_iter()
        .collect();
        let entries = batch.into_entries();
        assert_eq!(movie_cells(&entries[0])[&Quality::Hd].url, "first");
    }

    #[test]
    fn test_lower_seeds_never_displace() {
        let batch: Batch = [
            movie("movie-title", None, Quality::Hd, "first", 10),
            movie("movie-title", None, Quality::Hd, "second", 3),
        ]
        .into_iter()
        .collect();
        let entries = batch.into_entries();
        assert_eq!(movie_cells(&entries[0])[&Quality::Hd].url, "first");
    }

    #[test]
    fn test_first_known_year_sticks() {
        let batch: Batch = [
            movie("movie-title", None, Quality::Hd, "a", 1),
            movie("movie-title", Some(2019), Quality::FullHd, "b", 1),
            movie("movie-title", Some(2020), Quality::Sd, "c", 1),
        ]
        .into_iter()
        .collect();
        let entries = batch.into_entries();
        assert_eq!(entries[0].year, Some(2019));
        assert_eq!(entries[0].lookup_id(), "movie-title-2019");
    }

    #[test]
    fn test_entries_keep_first_occurrence_order() {
        let batch: Batch = [
            movie("zeta", None, Quality::Hd, "z", 1),
            movie("alpha", None, Quality::Hd, "a", 1),
            movie("zeta", None, Quality::FullHd, "z2", 1),
        ]
        .into_iter()
        .collect();
        let slugs: Vec<_> = batch.into_entries().into_iter().map(|e| e.slug).collect();
        assert_eq!(slugs, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_episodes_fill_separate_cells() {
        let batch: Batch = [
            episode(1, 1, "s1e1", 4),
            episode(1, 2, "s1e2", 4),
            episode(2, 1, "s2e1", 4),
            episode(1, 1, "s1e1-better", 8),
        ]
        .into_iter()
        .collect();
        assert_eq!(batch.len(), 1);
        let entry = &batch.into_entries()[0];
        assert_eq!(entry.lookup_id(), "show-name");
        assert_eq!(entry.torrents.len(), 3);
        let Torrents::Episodes(seasons) = &entry.torrents else {
            panic!("expected episodic layout");
        };
        assert_eq!(seasons[&1][&1][&Quality::Hd].url, "s1e1-better");
        assert_eq!(seasons[&2][&1][&Quality::Hd].url, "s2e1");
    }
}
