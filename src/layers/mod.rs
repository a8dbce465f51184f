use serde::Serialize;
use std::future::Future;

/// A tentative match surfaced to the user. `score` is only present when the
/// candidate came out of a fuzzy stage.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct CandidateRecord {
    pub title: String,
    pub description: String,
    pub url: String,
    pub score: Option<u8>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PageRecord {
    /// Canonical title as the wiki reports it, not the user's spelling.
    pub title: String,
    pub extract: String,
    pub url: String,
    pub thumbnail: Option<String>,
    pub categories: Vec<String>,
}

/// Read-only operations against a wiki. Implementations never fail: transport
/// and decoding problems come back as an empty `Vec` or `None`.
pub trait WikiSource {
    fn search(&self, query: &str, limit: usize) -> impl Future<Output = Vec<CandidateRecord>> + Send;

    fn search_full(&self, query: &str, limit: usize) -> impl Future<Output = Vec<CandidateRecord>> + Send;

    fn list_pages(&self, prefix_hint: &str, limit: usize) -> impl Future<Output = Vec<String>> + Send;

    fn get_page_extract(&self, title: &str) -> impl Future<Output = Option<PageRecord>> + Send;

    fn get_random_page(&self) -> impl Future<Output = Option<PageRecord>> + Send;

    fn get_categories(&self, title: &str) -> impl Future<Output = Vec<String>> + Send;

    /// Article URL for a title, used when a stage only knows the title.
    fn page_url(&self, title: &str) -> String;
}

pub mod client;
pub mod ranking;
pub mod resolution;
