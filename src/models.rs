//! Data models shared by the pipelines.
//!
//! - [`Strategy`]: where keyword text comes from (page content or URL slug)
//! - [`Document`]: one article's text, ready for keyword extraction
//! - [`ClickSummary`]: a Bitly link with its click count and edition
//! - [`KeywordCounts`], [`CountryMetrics`]: the aggregated outputs

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Keyword (or domain) → number of occurrences.
pub type KeywordCounts = BTreeMap<String, u64>;

/// Country name → share of clicks, rounded to two decimals and kept as a
/// string (`"41.27"`).
pub type CountryMetrics = BTreeMap<String, String>;

/// Text source for keyword extraction.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Visible text of the article page.
    Content,
    /// The trailing slug of the article URL.
    Url,
}

impl Strategy {
    /// Stable name used in output file names.
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Content => "content_extractor",
            Strategy::Url => "url_extractor",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An article's extracted text.
#[derive(Debug, Clone)]
pub struct Document {
    /// The article URL the text came from.
    pub url: String,
    pub text: String,
    /// Number of times the article was shared; each share counts its
    /// keywords once more.
    pub shares: u64,
}

/// A shortened link with its 30 day click total.
///
/// Serialized as-is into `top3_links.json`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ClickSummary {
    pub bitly_id: String,
    pub short_link: String,
    pub long_link: String,
    pub title: String,
    pub click_count: u64,
    /// Newsletter edition, taken from the link's first tag.
    pub edition: String,
}
