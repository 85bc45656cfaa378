//! Text extraction from article pages and article URLs.
//!
//! Two sources of keyword text exist (see [`Strategy`]):
//! - **Content**: the visible text of the article page
//! - **Url**: the trailing slug of the article URL, which for most blogs is
//!   a hyphenated version of the title

use super::fetch_html;
use crate::models::{Document, Strategy};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use reqwest::Client;
use scraper::{Html, Node};
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};

/// Parent elements whose text is never article content.
const DENIED_PARENTS: &[&str] = &[
    "noscript", "header", "html", "meta", "head", "input", "script", "style", "link", "button",
    "img",
];

/// The last path segment of `url` with hyphens turned into spaces.
///
/// ```ignore
/// assert_eq!(url_slug("https://blog.example.com/posts/scaling-kafka-at-acme/"), "scaling kafka at acme");
/// ```
pub fn url_slug(url: &str) -> String {
    url.trim_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default()
        .replace('-', " ")
}

/// Visible text of an HTML page, one space after every text node.
///
/// Text whose parent is a non-content element (scripts, styles, header,
/// ...) or that sits directly under the document root is skipped.
pub fn page_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut output = String::new();
    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let parent = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name()));
        match parent {
            Some(name) if !DENIED_PARENTS.contains(&name) => {
                output.push_str(text);
                output.push(' ');
            }
            _ => {}
        }
    }
    output
}

/// Fetch a single article and reduce it to text.
#[instrument(level = "debug", skip(client))]
pub async fn fetch_page_text(client: &Client, url: &str) -> Result<String, Box<dyn Error>> {
    let body = fetch_html(client, url).await?;
    let text = page_text(&body);
    debug!(bytes = text.len(), "Parsed article text");
    Ok(text)
}

/// Fetch all articles concurrently, at most `concurrency` at a time.
///
/// Failed fetches and pages without text are logged and skipped without
/// failing the batch.
#[instrument(level = "info", skip_all, fields(urls = urls.len()))]
pub async fn fetch_documents(client: &Client, urls: Vec<String>, concurrency: usize) -> Vec<Document> {
    let documents: Vec<Document> = stream::iter(urls)
        .map(|url| async move {
            match fetch_page_text(client, &url).await {
                Ok(text) if !text.trim().is_empty() => Some(Document { url, text, shares: 1 }),
                Ok(_) => {
                    warn!(%url, "Article produced no text");
                    None
                }
                Err(e) => {
                    error!(error = %e, %url, "Article fetch failed");
                    None
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .filter_map(std::future::ready)
        .collect()
        .await;

    info!(count = documents.len(), "Fetched article contents");
    documents
}

/// Documents made of each distinct URL's slug; no network access.
pub fn slug_documents(urls: &[String]) -> Vec<Document> {
    urls.iter()
        .unique()
        .map(|url| Document {
            url: url.clone(),
            text: url_slug(url),
            shares: 1,
        })
        .collect()
}

/// Documents for `strategy`, reusing already fetched page contents.
///
/// `links` is the full list of shared links, duplicates included; every
/// document is weighted by how often its URL appears there.
pub fn documents_for(strategy: Strategy, links: &[String], pages: &[Document]) -> Vec<Document> {
    let shares = links.iter().map(String::as_str).counts();
    let documents = match strategy {
        Strategy::Content => pages.to_vec(),
        Strategy::Url => slug_documents(links),
    };
    documents
        .into_iter()
        .map(|mut document| {
            document.shares = shares.get(document.url.as_str()).map_or(1, |n| *n as u64);
            document
        })
        .collect()
}
