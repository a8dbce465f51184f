mod config;
mod layers;
mod render;

use crate::config::WikiConfig;
use crate::layers::client::WikiClient;
use crate::layers::resolution::{Resolution, Resolver};
use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "wiki-lookup", about = "Look up wiki articles, tolerating typos")]
struct Cli {
    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    /// Print results as JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show a single article, or suggestions if there is no confident match
    Article { query: String },
    /// List matching articles
    Search { query: String },
    /// Show a random article
    Random,
}

fn require_query(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(anyhow!("query must not be empty"));
    }
    Ok(query)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let config = WikiConfig::from_env()?;
    tracing::info!("Using wiki API at {}", config.api_url);
    let client = WikiClient::new(config)?;
    let resolver = Resolver::new(&client);

    match &cli.command {
        Command::Article { query } => {
            let query = require_query(query)?;
            let resolution = resolver.resolve_article(query).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
                return Ok(());
            }
            match resolution {
                Resolution::Page(page) => print!("{}", render::render_page(&page, false)),
                Resolution::Candidates(results) => print!("{}", render::render_candidates(query, &results, true)),
                Resolution::NotFound => print!("{}", render::render_not_found(query)),
            }
        }
        Command::Search { query } => {
            let query = require_query(query)?;
            let results = resolver.search_articles(query).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&results)?);
                return Ok(());
            }
            let fuzzy = results.first().is_some_and(|r| r.score.is_some());
            print!("{}", render::render_candidates(query, &results, fuzzy));
        }
        Command::Random => {
            let page = resolver.random_article().await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&page)?);
                return Ok(());
            }
            match page {
                Some(page) => print!("{}", render::render_page(&page, true)),
                None => println!("Could not fetch a random article."),
            }
        }
    }

    Ok(())
}
