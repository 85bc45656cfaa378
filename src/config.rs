//! Analysis configuration.
//!
//! Everything the keyword pipeline needs beyond the command line lives in an
//! optional YAML file passed with `--config`. Every field has a default, so
//! a partial file (or none at all) is fine:
//!
//! ```yaml
//! first_edition: 40
//! last_edition: 70
//! min_count: 2
//! runs:
//!   - { strategy: content, ngram_size: 2, top: 10 }
//!   - { strategy: url, ngram_size: 1, top: 2 }
//! ```

use crate::models::Strategy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use tracing::{info, instrument};

/// Tunables for link discovery and n-gram extraction.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Edition page URL; `{edition}` is replaced with the edition number.
    pub edition_url_template: String,
    /// First edition to scan (inclusive).
    pub first_edition: u32,
    /// Last edition to scan (exclusive).
    pub last_edition: u32,
    /// Maximum number of page fetches or extractions in flight.
    pub concurrency: usize,
    /// Keywords seen fewer times than this across all pages are dropped.
    pub min_count: u64,
    /// Similarity above which a candidate is treated as a duplicate keyword.
    pub dedup_threshold: f64,
    /// Stopword language for the keyword extractor.
    pub language: String,
    /// Per-request HTTP timeout, in seconds.
    pub request_timeout_secs: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Extraction runs, each producing one output file.
    pub runs: Vec<NgramRun>,
    /// Rules rejecting edition links that are not articles.
    pub link_filters: LinkFilters,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            edition_url_template:
                "https://www.dataengineeringweekly.com/p/data-engineering-weekly-{edition}"
                    .to_string(),
            first_edition: 24,
            last_edition: 66,
            concurrency: 20,
            min_count: 3,
            dedup_threshold: 0.9,
            language: "en".to_string(),
            request_timeout_secs: 30,
            user_agent: concat!("dew_analytics/", env!("CARGO_PKG_VERSION")).to_string(),
            runs: vec![
                NgramRun::new(Strategy::Content, 3, 5),
                NgramRun::new(Strategy::Content, 2, 5),
                NgramRun::new(Strategy::Content, 1, 5),
                NgramRun::new(Strategy::Url, 2, 2),
                NgramRun::new(Strategy::Url, 1, 2),
            ],
            link_filters: LinkFilters::default(),
        }
    }
}

/// One n-gram analysis: which text to extract from, the maximum n-gram
/// size, and how many keywords to keep per document.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct NgramRun {
    pub strategy: Strategy,
    pub ngram_size: usize,
    pub top: usize,
}

impl NgramRun {
    pub fn new(strategy: Strategy, ngram_size: usize, top: usize) -> Self {
        Self {
            strategy,
            ngram_size,
            top,
        }
    }

    /// Output file stem, e.g. `content_extractor3`.
    pub fn output_name(&self) -> String {
        format!("{}{}", self.strategy.name(), self.ngram_size)
    }
}

/// Rules rejecting links that are not articles (sponsors, social, the
/// newsletter platform itself).
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LinkFilters {
    /// Links rejected when equal to one of these.
    pub deny_exact: Vec<String>,
    /// Each rule is a list of substrings; a link matching all of them is rejected.
    pub deny_contains: Vec<Vec<String>>,
}

impl Default for LinkFilters {
    fn default() -> Self {
        let rule = |parts: &[&str]| parts.iter().map(|p| p.to_string()).collect::<Vec<_>>();
        Self {
            deny_exact: vec!["https://substack.com".to_string()],
            deny_contains: vec![
                rule(&["signup"]),
                rule(&["javascript"]),
                rule(&["ccpa"]),
                rule(&["ananth"]),
                rule(&["substack", "support"]),
                rule(&["twitter", "status"]),
                rule(&["montecarlodata"]),
                rule(&["rudderstack"]),
                rule(&["youtube"]),
            ],
        }
    }
}

impl LinkFilters {
    /// Whether `href` should be dropped. Exact matches ignore a trailing `/`.
    pub fn rejects(&self, href: &str) -> bool {
        let bare = href.trim_end_matches('/');
        self.deny_exact
            .iter()
            .any(|exact| exact.trim_end_matches('/') == bare)
            || self
                .deny_contains
                .iter()
                .filter(|rule| !rule.is_empty())
                .any(|rule| rule.iter().all(|part| href.contains(part.as_str())))
    }
}

/// Load the analysis configuration, falling back to defaults without a path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid YAML for
/// [`AnalysisConfig`].
#[instrument(level = "info")]
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, Box<dyn Error>> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(AnalysisConfig::default());
    };
    let raw = std::fs::read_to_string(path)?;
    let config: AnalysisConfig = serde_yaml::from_str(&raw)?;
    info!(
        path = %path.display(),
        runs = config.runs.len(),
        editions = ?(config.first_edition..config.last_edition),
        "Loaded analysis config"
    );
    Ok(config)
}
