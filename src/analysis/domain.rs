//! Which sites the newsletter links to most.

use crate::models::KeywordCounts;
use crate::outputs::json;
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};
use url::Url;

/// The lowercased domain of `url`.
///
/// Medium hosts many publications under one host, so for Medium links the
/// first path segment (the publication) is used instead, with hyphens
/// turned into spaces. Unparseable URLs yield `None`.
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    let domain = if host.contains("medium") {
        parsed
            .path()
            .trim_matches('/')
            .split('/')
            .next()
            .unwrap_or_default()
            .replace('-', " ")
    } else {
        host.to_string()
    };
    Some(domain.to_lowercase())
}

/// Count links per domain.
pub fn domain_counts(links: &[String]) -> KeywordCounts {
    let mut counts = KeywordCounts::new();
    for domain in links.iter().filter_map(|link| domain_of(link)) {
        *counts.entry(domain).or_insert(0) += 1;
    }
    counts
}

/// Count links per domain and write `domain.json`.
#[instrument(level = "info", skip_all, fields(links = links.len()))]
pub async fn domain_names(links: &[String], data_dir: &Path) -> Result<KeywordCounts, Box<dyn Error>> {
    let counts = domain_counts(links);
    json::write_json(data_dir, "domain", &counts).await?;
    info!(domains = counts.len(), "Domain analysis complete");
    Ok(counts)
}
