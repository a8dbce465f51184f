use serde::Serialize;
use crate::layers::{CandidateRecord, PageRecord, WikiSource};
use crate::layers::ranking::{FuzzyRanker, weighted_ratio};

/// Minimum score for a title-sample match to be suggested.
pub const FUZZY_THRESHOLD: u8 = 60;
/// A top candidate at or above this score is treated like an exact lookup.
pub const CONFIDENT_SCORE: u8 = 85;
pub const MAX_CATEGORIES: usize = 5;

const SEARCH_LIMIT: usize = 10;
const TITLE_SAMPLE_LIMIT: usize = 50;
const RANK_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum Resolution {
    Page(PageRecord),
    Candidates(Vec<CandidateRecord>),
    NotFound,
}

/// Fuzzy-search cascade stages, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    ExactSearch,
    TitleSample,
    FullTextRerank,
}

impl Strategy {
    pub const CASCADE: [Strategy; 3] = [Strategy::ExactSearch, Strategy::TitleSample, Strategy::FullTextRerank];
}

pub struct Resolver<'a, S> {
    source: &'a S,
}

impl<'a, S: WikiSource + Sync> Resolver<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Direct lookup first, then the fuzzy cascade. A confident top candidate
    /// is re-resolved into a page; anything else comes back as suggestions.
    /// The query reaches the wiki exactly as given.
    pub async fn resolve_article(&self, query: &str) -> Resolution {
        if query.trim().is_empty() {
            return Resolution::NotFound;
        }

        if let Some(page) = self.source.get_page_extract(query).await {
            return Resolution::Page(self.with_categories(page).await);
        }

        let candidates = self.fuzzy_search(query).await;
        let Some(best) = candidates.first() else {
            tracing::info!("Nothing found for {}", query);
            return Resolution::NotFound;
        };

        if best.score.is_some_and(|score| score >= CONFIDENT_SCORE) {
            tracing::info!("Confident match for {}: {} ({:?})", query, best.title, best.score);
            match self.source.get_page_extract(&best.title).await {
                Some(page) => return Resolution::Page(self.with_categories(page).await),
                None => tracing::warn!("Confident match {} did not resolve, returning suggestions", best.title),
            }
        }

        Resolution::Candidates(candidates)
    }

    /// Always a list, possibly empty.
    pub async fn search_articles(&self, query: &str) -> Vec<CandidateRecord> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        self.fuzzy_search(query).await
    }

    pub async fn random_article(&self) -> Option<PageRecord> {
        let page = self.source.get_random_page().await?;
        Some(self.with_categories(page).await)
    }

    /// Runs each strategy in order and returns the first non-empty result.
    pub async fn fuzzy_search(&self, query: &str) -> Vec<CandidateRecord> {
        for strategy in Strategy::CASCADE {
            if let Some(results) = self.run(strategy, query).await {
                tracing::info!("{:?} produced {} candidate(s) for {}", strategy, results.len(), query);
                return results;
            }
            tracing::debug!("{:?} found nothing for {}", strategy, query);
        }
        Vec::new()
    }

    async fn run(&self, strategy: Strategy, query: &str) -> Option<Vec<CandidateRecord>> {
        let results = match strategy {
            Strategy::ExactSearch => self.source.search(query, SEARCH_LIMIT).await,
            Strategy::TitleSample => self.title_sample(query).await,
            Strategy::FullTextRerank => self.full_text_rerank(query).await,
        };
        (!results.is_empty()).then_some(results)
    }

    async fn title_sample(&self, query: &str) -> Vec<CandidateRecord> {
        let titles = self.source.list_pages(query, TITLE_SAMPLE_LIMIT).await;
        if titles.is_empty() {
            return Vec::new();
        }

        FuzzyRanker::rank(query, &titles, RANK_LIMIT, weighted_ratio)
            .into_iter()
            .filter(|(_, score)| *score >= FUZZY_THRESHOLD)
            .map(|(title, score)| CandidateRecord {
                title: title.to_string(),
                description: format!("Match: {}%", score),
                url: self.source.page_url(title),
                score: Some(score),
            })
            .collect()
    }

    // Only titles that survive the re-rank are kept; each carries its score.
    async fn full_text_rerank(&self, query: &str) -> Vec<CandidateRecord> {
        let hits = self.source.search_full(query, SEARCH_LIMIT).await;
        if hits.is_empty() {
            return Vec::new();
        }

        let titles: Vec<String> = hits.iter().map(|h| h.title.clone()).collect();
        let ranked = FuzzyRanker::rank(query, &titles, RANK_LIMIT, weighted_ratio);

        let mut pool: Vec<Option<CandidateRecord>> = hits.into_iter().map(Some).collect();
        ranked.into_iter()
            .filter_map(|(title, score)| {
                let slot = pool.iter_mut().find(|c| c.as_ref().is_some_and(|c| c.title == title))?;
                slot.take().map(|candidate| CandidateRecord { score: Some(score), ..candidate })
            })
            .collect()
    }

    async fn with_categories(&self, mut page: PageRecord) -> PageRecord {
        let mut categories = self.source.get_categories(&page.title).await;
        categories.truncate(MAX_CATEGORIES);
        page.categories = categories;
        page
    }
}
