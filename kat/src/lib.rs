use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use tracing::{instrument, trace};
use url::Url;

pub const DEFAULT_URL: &str = "https://kat.cr/json.php";

/// Number of results the index returns per page.
pub const PAGE_SIZE: u32 = 25;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    ParseUrl(#[from] url::ParseError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("request failed with status code: {0}")]
    Status(StatusCode),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A single search request against the index.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pub query: Option<String>,
    pub category: Option<String>,
    pub verified: bool,
    pub adult_filter: bool,
    pub page: u32,
}

impl Query {
    fn build_url(&self, base: &Url) -> Url {
        let mut terms: Vec<String> = Vec::with_capacity(3);
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            terms.push(query.to_owned());
        }
        if let Some(ref category) = self.category {
            terms.push(format!("category:{category}"));
        }
        if self.verified {
            terms.push("verified:1".into());
        }

        let mut url = base.clone();
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", &terms.join(" "));
            pairs.append_pair("page", &self.page.max(1).to_string());
            if self.adult_filter {
                pairs.append_pair("adult_filter", "1");
            }
        }
        url
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Torrent {
    pub title: String,
    pub link: String,
    pub magnet: String,
    pub seeds: u32,
    pub peers: u32,
}

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub results: Vec<Torrent>,
    pub total_pages: u32,
}

#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(default, deserialize_with = "lenient_u32")]
    total_results: u32,
    #[serde(default)]
    list: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: String,
    link: String,
    #[serde(default)]
    hash: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    seeds: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    peers: u32,
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(u32),
        Text(String),
    }

    match Number::deserialize(deserializer)? {
        Number::Int(n) => Ok(n),
        Number::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn magnet(hash: &str, title: &str) -> String {
    let name: String = url::form_urlencoded::byte_serialize(title.as_bytes()).collect();
    format!("magnet:?xt=urn:btih:{hash}&dn={name}")
}

fn map_item(item: Item) -> Option<Torrent> {
    if item.hash.is_empty() {
        trace!("skipping {} without info hash", item.title);
        return None;
    }
    Some(Torrent {
        magnet: magnet(&item.hash, &item.title),
        title: item.title,
        link: item.link,
        seeds: item.seeds,
        peers: item.peers,
    })
}

fn map_feed(feed: Feed) -> SearchResult {
    SearchResult {
        total_pages: feed.total_results.div_ceil(PAGE_SIZE),
        results: feed.list.into_iter().filter_map(map_item).collect(),
    }
}

/// Fetch one page of search results.
///
/// # Errors
/// [`Error::Status`]: If the index answers with a non-success status.
/// [`Error::Json`]: If the body is not a search listing.
#[instrument(skip(client, base), fields(page = query.page))]
pub async fn search(client: &reqwest::Client, base: &Url, query: &Query) -> Result<SearchResult> {
    let url = query.build_url(base);
    trace!("requesting {url}");
    let feed = get_feed(client, url).await?;
    Ok(map_feed(feed))
}

async fn get_feed(client: &reqwest::Client, url: Url) -> Result<Feed> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Status(status));
    }
    let body = response.bytes().await?;
    let feed = serde_json::from_slice(&body)?;
    Ok(feed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse(DEFAULT_URL).unwrap()
    }

    #[test]
    fn test_build_url_with_all_filters() {
        let query = Query {
            query: Some("horriblesubs".into()),
            category: Some("english-translated".into()),
            verified: true,
            adult_filter: true,
            page: 3,
        };
        let url = query.build_url(&base());
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                (
                    "q".into(),
                    "horriblesubs category:english-translated verified:1".into()
                ),
                ("page".into(), "3".into()),
                ("adult_filter".into(), "1".into()),
            ]
        );
    }

    #[test]
    fn test_build_url_page_zero_requests_first_page() {
        let query = Query {
            category: Some("movies".into()),
            ..Default::default()
        };
        let url = query.build_url(&base());
        assert_eq!(url.query(), Some("q=category%3Amovies&page=1"));
    }

    #[test]
    fn test_map_feed_accepts_numeric_strings() {
        let body = r#"{
            "title": "KickassTorrents",
            "total_results": "51",
            "list": [
                {
                    "title": "Movie.Title.2019.720p",
                    "link": "https://kat.cr/movie-title-2019-720p-t1.html",
                    "hash": "ABCDEF0123",
                    "seeds": "10",
                    "peers": 4
                },
                {
                    "title": "No Hash",
                    "link": "https://kat.cr/no-hash-t2.html",
                    "seeds": 1,
                    "peers": 1
                }
            ]
        }"#;
        let feed: Feed = serde_json::from_str(body).unwrap();
        let result = map_feed(feed);
        assert_eq!(result.total_pages, 3);
        assert_eq!(
            result.results,
            vec![Torrent {
                title: "Movie.Title.2019.720p".into(),
                link: "https://kat.cr/movie-title-2019-720p-t1.html".into(),
                magnet: "magnet:?xt=urn:btih:ABCDEF0123&dn=Movie.Title.2019.720p".into(),
                seeds: 10,
                peers: 4,
            }]
        );
    }

    #[test]
    fn test_map_feed_empty() {
        let feed: Feed = serde_json::from_str(r#"{"total_results": 0}"#).unwrap();
        let result = map_feed(feed);
        assert_eq!(result.total_pages, 0);
        assert!(result.results.is_empty());
    }

    #[test]
    fn test_magnet_encodes_name() {
        assert_eq!(
            magnet("00ff", "[HorribleSubs] Show - 01 [720p].mkv"),
            "magnet:?xt=urn:btih:00ff&dn=%5BHorribleSubs%5D+Show+-+01+%5B720p%5D.mkv"
        );
    }
}
