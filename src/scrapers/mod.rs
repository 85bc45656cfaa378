//! Scrapers for the newsletter and the articles it links to.
//!
//! Scraping happens in two phases:
//!
//! 1. **Indexing** ([`newsletter`]): build the edition page URLs and pull the
//!    outbound article links from each edition
//! 2. **Fetching** ([`extractor`]): download each article and reduce it to
//!    plain text, or derive text from the URL slug alone
//!
//! Both phases fetch concurrently with `futures::stream` and log-and-skip
//! any page that fails.

pub mod extractor;
pub mod newsletter;

use crate::config::AnalysisConfig;
use reqwest::Client;
use std::time::Duration;

/// Build the HTTP client shared by every scraper.
pub fn http_client(config: &AnalysisConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
}

/// GET `url` and return the body, failing on non-success statuses.
pub(crate) async fn fetch_html(client: &Client, url: &str) -> Result<String, reqwest::Error> {
    client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}
