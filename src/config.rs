use anyhow::{Result, anyhow};
use std::env;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://hytalewiki.org/api.php";
pub const DEFAULT_BASE_URL: &str = "https://hytalewiki.org";

#[derive(Debug, Clone)]
pub struct WikiConfig {
    pub api_url: Url,
    pub base_url: Url,
    pub token: Option<String>,
}

impl WikiConfig {
    /// Reads `WIKI_API_URL`, `WIKI_BASE_URL` and `WIKI_TOKEN`, after loading
    /// a `.env` file if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_url = env::var("WIKI_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let base_url = env::var("WIKI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let token = env::var("WIKI_TOKEN").ok();

        Self::from_parts(&api_url, &base_url, token)
    }

    pub fn from_parts(api_url: &str, base_url: &str, token: Option<String>) -> Result<Self> {
        let api_url = parse_url("WIKI_API_URL", api_url)?;
        let mut base_url = parse_url("WIKI_BASE_URL", base_url)?;

        // Keep the base path as a directory so article segments append to it.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            api_url,
            base_url,
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    /// `{base}/w/{Title_With_Underscores}`.
    pub fn page_url(&self, title: &str) -> String {
        let article = title.replace(' ', "_");
        let mut url = self.base_url.clone();
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty().push("w").push(&article);
            }
            Err(()) => return format!("{}w/{}", self.base_url, article),
        }
        url.to_string()
    }
}

fn parse_url(name: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| anyhow!("{} is not a valid URL ({}): {}", name, raw, e))?;
    if url.cannot_be_a_base() {
        return Err(anyhow!("{} must be a hierarchical http(s) URL: {}", name, raw));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_url_replaces_spaces() {
        let config = WikiConfig::from_parts(DEFAULT_API_URL, DEFAULT_BASE_URL, None).unwrap();
        assert_eq!(config.page_url("Trork Chieftain"), "https://hytalewiki.org/w/Trork_Chieftain");
    }

    #[test]
    fn test_page_url_keeps_base_path() {
        let config = WikiConfig::from_parts(DEFAULT_API_URL, "https://example.org/wiki", None).unwrap();
        assert_eq!(config.page_url("Kweebec"), "https://example.org/wiki/w/Kweebec");
    }

    #[test]
    fn test_page_url_escapes_query_characters() {
        let config = WikiConfig::from_parts(DEFAULT_API_URL, DEFAULT_BASE_URL, None).unwrap();
        assert_eq!(config.page_url("What?"), "https://hytalewiki.org/w/What%3F");
    }

    #[test]
    fn test_blank_token_is_unset() {
        let config = WikiConfig::from_parts(DEFAULT_API_URL, DEFAULT_BASE_URL, Some("  ".to_string())).unwrap();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        assert!(WikiConfig::from_parts("not a url", DEFAULT_BASE_URL, None).is_err());
        assert!(WikiConfig::from_parts(DEFAULT_API_URL, "mailto:wiki@example.org", None).is_err());
    }
}
