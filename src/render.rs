// Plain-text rendering of resolved pages and candidate lists for the terminal.
use crate::layers::{CandidateRecord, PageRecord};
use crate::layers::resolution::MAX_CATEGORIES;

const EXTRACT_CHARS: usize = 1000;
const DESCRIPTION_CHARS: usize = 80;

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        format!("{}...", text.chars().take(max).collect::<String>())
    } else {
        text.to_string()
    }
}

pub fn render_page(page: &PageRecord, random: bool) -> String {
    let marker = if random { "[random] " } else { "" };
    let mut out = format!("{}{}\n{}\n\n{}\n", marker, page.title, page.url, truncate(&page.extract, EXTRACT_CHARS));

    if let Some(thumbnail) = &page.thumbnail {
        out.push_str(&format!("\nImage: {}\n", thumbnail));
    }
    if !page.categories.is_empty() {
        let shown: Vec<&str> = page.categories.iter().take(MAX_CATEGORIES).map(String::as_str).collect();
        out.push_str(&format!("\nCategories: {}\n", shown.join(", ")));
    }
    out
}

pub fn render_candidates(query: &str, results: &[CandidateRecord], fuzzy: bool) -> String {
    let mut out = if fuzzy {
        format!("Did you mean...? ({})\n", query)
    } else {
        format!("Results for: {}\n", query)
    };

    if results.is_empty() {
        out.push_str("\nNo results found.\n");
        return out;
    }

    for (i, result) in results.iter().enumerate() {
        match result.score {
            Some(score) => out.push_str(&format!("\n{}. {} ({}% match) <{}>\n", i + 1, result.title, score, result.url)),
            None => {
                let description = if result.description.is_empty() {
                    "No description".to_string()
                } else {
                    truncate(&result.description, DESCRIPTION_CHARS)
                };
                out.push_str(&format!("\n{}. {} <{}>\n   {}\n", i + 1, result.title, result.url, description));
            }
        }
    }
    out
}

pub fn render_not_found(query: &str) -> String {
    format!("No article found for \"{}\"\n", query)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(title: &str, description: &str, score: Option<u8>) -> CandidateRecord {
        CandidateRecord {
            title: title.to_string(),
            description: description.to_string(),
            url: format!("https://hytalewiki.org/w/{}", title),
            score,
        }
    }

    #[test]
    fn test_page_truncates_extract_and_categories() {
        let page = PageRecord {
            title: "Kweebec".to_string(),
            extract: "a".repeat(1200),
            url: "https://hytalewiki.org/w/Kweebec".to_string(),
            thumbnail: None,
            categories: (1..=7).map(|i| format!("C{}", i)).collect(),
        };
        let out = render_page(&page, false);
        assert!(out.contains(&format!("{}...", "a".repeat(1000))));
        assert!(out.contains("Categories: C1, C2, C3, C4, C5\n"));
        assert!(!out.contains("Image:"));
    }

    #[test]
    fn test_candidates_scored_and_unscored() {
        let results = vec![
            candidate("Kweebec", "Match: 86%", Some(86)),
            candidate("Feran", "", None),
            candidate("Trork", &"x".repeat(100), None),
        ];
        let out = render_candidates("kweebek", &results, true);
        assert!(out.starts_with("Did you mean...? (kweebek)"));
        assert!(out.contains("1. Kweebec (86% match)"));
        assert!(out.contains("No description"));
        assert!(out.contains(&format!("{}...", "x".repeat(80))));
    }

    #[test]
    fn test_empty_candidates() {
        assert!(render_candidates("blo", &[], false).contains("No results found."));
    }
}
