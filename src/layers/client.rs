use anyhow::{Result, anyhow};
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use crate::config::WikiConfig;
use crate::layers::{CandidateRecord, PageRecord, WikiSource};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
const CATEGORY_PREFIX: &str = "Category:";
const NO_EXTRACT: &str = "No description available.";

// MediaWiki `action=query` responses all nest their payload under `query`.
#[derive(Deserialize)]
struct QueryResponse<T> {
    query: Option<T>,
}

#[derive(Deserialize)]
struct SearchList {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Deserialize)]
struct AllPagesList {
    #[serde(default)]
    allpages: Vec<TitleEntry>,
}

#[derive(Deserialize)]
struct RandomList {
    #[serde(default)]
    random: Vec<TitleEntry>,
}

#[derive(Deserialize)]
struct TitleEntry {
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
struct PagesProp {
    #[serde(default)]
    pages: BTreeMap<String, RawPage>,
}

#[derive(Deserialize)]
struct RawPage {
    title: Option<String>,
    extract: Option<String>,
    fullurl: Option<String>,
    thumbnail: Option<RawThumbnail>,
    missing: Option<serde_json::Value>,
    #[serde(default)]
    categories: Vec<TitleEntry>,
}

#[derive(Deserialize)]
struct RawThumbnail {
    source: Option<String>,
}

impl RawPage {
    /// Unknown titles come back under a negative page id with a `missing` flag.
    fn is_missing(&self, id: &str) -> bool {
        self.missing.is_some() || id.parse::<i64>().map(|id| id < 0).unwrap_or(false)
    }
}

pub struct WikiClient {
    client: Client,
    config: WikiConfig,
}

impl WikiClient {
    pub fn new(config: WikiConfig) -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, config })
    }

    async fn get(&self, params: &[(&str, String)]) -> Result<String> {
        let mut request = self.client
            .get(self.config.api_url.clone())
            .query(params)
            .query(&[("format", "json")]);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        match request.send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    return Err(anyhow!("Wiki API error: {}", resp.status()));
                }
                Ok(resp.text().await?)
            }
            Err(e) => Err(anyhow!("Request failed: {}", e)),
        }
    }

    async fn try_search(&self, query: &str, limit: usize) -> Result<Vec<CandidateRecord>> {
        tracing::info!("Querying opensearch: {}", query);
        let body = self.get(&[
            ("action", "opensearch".to_string()),
            ("search", query.to_string()),
            ("limit", limit.to_string()),
            ("namespace", "0".to_string()),
        ]).await?;
        decode_opensearch(&body)
    }

    async fn try_search_full(&self, query: &str, limit: usize) -> Result<Vec<CandidateRecord>> {
        tracing::info!("Querying full-text search: {}", query);
        let body = self.get(&[
            ("action", "query".to_string()),
            ("list", "search".to_string()),
            ("srsearch", query.to_string()),
            ("srlimit", limit.to_string()),
            ("srnamespace", "0".to_string()),
        ]).await?;
        decode_search_full(&body, &self.config)
    }

    async fn try_list_pages(&self, prefix_hint: &str, limit: usize) -> Result<Vec<String>> {
        let prefix = title_prefix(prefix_hint);
        tracing::info!("Listing pages with prefix: {:?}", prefix);
        let body = self.get(&[
            ("action", "query".to_string()),
            ("list", "allpages".to_string()),
            ("aplimit", limit.to_string()),
            ("apprefix", prefix),
            ("apnamespace", "0".to_string()),
        ]).await?;
        decode_all_pages(&body)
    }

    async fn try_get_page_extract(&self, title: &str) -> Result<Option<PageRecord>> {
        tracing::info!("Fetching extract for: {}", title);
        let body = self.get(&[
            ("action", "query".to_string()),
            ("titles", title.to_string()),
            ("prop", "extracts|pageimages|info".to_string()),
            ("exintro", "1".to_string()),
            ("explaintext", "1".to_string()),
            ("exsentences", "5".to_string()),
            ("piprop", "thumbnail".to_string()),
            ("pithumbsize", "300".to_string()),
            ("inprop", "url".to_string()),
        ]).await?;
        decode_page_extract(&body, title, &self.config)
    }

    async fn try_random_title(&self) -> Result<Option<String>> {
        tracing::info!("Picking a random page");
        let body = self.get(&[
            ("action", "query".to_string()),
            ("list", "random".to_string()),
            ("rnnamespace", "0".to_string()),
            ("rnlimit", "1".to_string()),
        ]).await?;
        decode_random_title(&body)
    }

    async fn try_get_categories(&self, title: &str) -> Result<Vec<String>> {
        tracing::info!("Fetching categories for: {}", title);
        let body = self.get(&[
            ("action", "query".to_string()),
            ("titles", title.to_string()),
            ("prop", "categories".to_string()),
            ("cllimit", "10".to_string()),
        ]).await?;
        decode_categories(&body)
    }
}

impl WikiSource for WikiClient {
    async fn search(&self, query: &str, limit: usize) -> Vec<CandidateRecord> {
        self.try_search(query, limit).await.unwrap_or_else(|e| {
            tracing::warn!("Opensearch failed: {}", e);
            Vec::new()
        })
    }

    async fn search_full(&self, query: &str, limit: usize) -> Vec<CandidateRecord> {
        self.try_search_full(query, limit).await.unwrap_or_else(|e| {
            tracing::warn!("Full-text search failed: {}", e);
            Vec::new()
        })
    }

    async fn list_pages(&self, prefix_hint: &str, limit: usize) -> Vec<String> {
        self.try_list_pages(prefix_hint, limit).await.unwrap_or_else(|e| {
            tracing::warn!("Page listing failed: {}", e);
            Vec::new()
        })
    }

    async fn get_page_extract(&self, title: &str) -> Option<PageRecord> {
        match self.try_get_page_extract(title).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Extract lookup for {} failed: {}", title, e);
                None
            }
        }
    }

    async fn get_random_page(&self) -> Option<PageRecord> {
        match self.try_random_title().await {
            Ok(Some(title)) => self.get_page_extract(&title).await,
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Random page lookup failed: {}", e);
                None
            }
        }
    }

    async fn get_categories(&self, title: &str) -> Vec<String> {
        self.try_get_categories(title).await.unwrap_or_else(|e| {
            tracing::warn!("Category lookup for {} failed: {}", title, e);
            Vec::new()
        })
    }

    fn page_url(&self, title: &str) -> String {
        self.config.page_url(title)
    }
}

/// `allpages` only filters by prefix, so the hint is cut to its first two
/// characters.
fn title_prefix(hint: &str) -> String {
    hint.chars().take(2).collect()
}

/// Removes search highlighting and decodes HTML entities left in a snippet.
fn clean_snippet(snippet: &str) -> String {
    let stripped = snippet
        .replace("<span class=\"searchmatch\">", "")
        .replace("</span>", "");
    match unescape_with(&stripped, resolve_html5_entity) {
        Ok(text) => text.into_owned(),
        Err(_) => stripped,
    }
}

fn decode_query<T: for<'de> Deserialize<'de>>(body: &str) -> Result<Option<T>> {
    let response: QueryResponse<T> = serde_json::from_str(body)?;
    Ok(response.query)
}

// Opensearch answers with `[query, [titles], [descriptions], [urls]]`.
fn decode_opensearch(body: &str) -> Result<Vec<CandidateRecord>> {
    let data: Vec<serde_json::Value> = serde_json::from_str(body)?;
    if data.len() < 4 {
        return Ok(Vec::new());
    }

    let titles: Vec<String> = serde_json::from_value(data[1].clone())?;
    let descriptions: Vec<String> = serde_json::from_value(data[2].clone())?;
    let urls: Vec<String> = serde_json::from_value(data[3].clone())?;

    Ok(titles.into_iter()
        .zip(descriptions)
        .zip(urls)
        .filter(|((title, _), _)| !title.is_empty())
        .map(|((title, description), url)| CandidateRecord { title, description, url, score: None })
        .collect())
}

fn decode_search_full(body: &str, config: &WikiConfig) -> Result<Vec<CandidateRecord>> {
    let hits = decode_query::<SearchList>(body)?.map(|list| list.search).unwrap_or_default();
    Ok(hits.into_iter()
        .filter(|hit| !hit.title.is_empty())
        .map(|hit| CandidateRecord {
            url: config.page_url(&hit.title),
            description: clean_snippet(&hit.snippet),
            title: hit.title,
            score: None,
        })
        .collect())
}

fn decode_all_pages(body: &str) -> Result<Vec<String>> {
    let pages = decode_query::<AllPagesList>(body)?.map(|list| list.allpages).unwrap_or_default();
    Ok(pages.into_iter().map(|p| p.title).filter(|t| !t.is_empty()).collect())
}

fn decode_random_title(body: &str) -> Result<Option<String>> {
    let random = decode_query::<RandomList>(body)?.map(|list| list.random).unwrap_or_default();
    Ok(random.into_iter().map(|p| p.title).find(|t| !t.is_empty()))
}

fn decode_page_extract(body: &str, requested: &str, config: &WikiConfig) -> Result<Option<PageRecord>> {
    let pages = decode_query::<PagesProp>(body)?.map(|prop| prop.pages).unwrap_or_default();
    let Some((id, page)) = pages.into_iter().next() else {
        return Ok(None);
    };
    if page.is_missing(&id) {
        tracing::debug!("Page {} does not exist (id {})", requested, id);
        return Ok(None);
    }

    let title = page.title.unwrap_or_else(|| requested.to_string());
    Ok(Some(PageRecord {
        extract: page.extract.unwrap_or_else(|| NO_EXTRACT.to_string()),
        url: page.fullurl.unwrap_or_else(|| config.page_url(&title)),
        thumbnail: page.thumbnail.and_then(|t| t.source),
        categories: Vec::new(),
        title,
    }))
}

fn decode_categories(body: &str) -> Result<Vec<String>> {
    let pages = decode_query::<PagesProp>(body)?.map(|prop| prop.pages).unwrap_or_default();
    Ok(pages.into_values()
        .next()
        .map(|page| page.categories.into_iter()
            .map(|c| c.title.strip_prefix(CATEGORY_PREFIX).unwrap_or(&c.title).to_string())
            .filter(|c| !c.is_empty())
            .collect())
        .unwrap_or_default())
}
