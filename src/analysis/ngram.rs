//! N-gram keyword analysis over a batch of articles.
//!
//! Each [`NgramRun`] extracts the top keywords of every document, counts in
//! how many shared links each keyword appeared, drops rare keywords, and
//! writes `{strategy}{n}.json` to the data directory.

use crate::config::{AnalysisConfig, NgramRun};
use crate::keywords::KeywordExtractor;
use crate::models::{Document, KeywordCounts, Strategy};
use crate::outputs::json;
use crate::scrapers::extractor;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use reqwest::Client;
use std::collections::HashMap;
use std::error::Error;
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};

/// Lowercased keywords of one document, each counted once.
pub fn extract_keywords(text: &str, extractor: &KeywordExtractor) -> HashMap<String, u64> {
    extractor
        .extract(text)
        .into_iter()
        .map(|keyword| (keyword.text.to_lowercase(), 1))
        .collect()
}

/// Add `partial` counts into `into`.
pub fn merge_counts(into: &mut KeywordCounts, partial: HashMap<String, u64>) {
    for (keyword, count) in partial {
        *into.entry(keyword).or_insert(0) += count;
    }
}

/// Keep only keywords seen at least `min_count` times.
pub fn apply_threshold(counts: KeywordCounts, min_count: u64) -> KeywordCounts {
    counts
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .collect()
}

/// Extract, aggregate and threshold keywords for one run over `documents`.
///
/// At most `config.concurrency` extractions run at once, each on the
/// blocking pool. A document's keywords count once per share. A document
/// whose extraction fails is logged and skipped.
#[instrument(level = "info", skip_all, fields(run = %run.output_name(), documents = documents.len()))]
pub async fn aggregate_keywords(
    run: NgramRun,
    documents: Vec<Document>,
    config: &AnalysisConfig,
) -> KeywordCounts {
    let extractor = KeywordExtractor::new(&config.language, run.ngram_size, config.dedup_threshold, run.top);

    let mut counts = KeywordCounts::new();
    let mut partials = stream::iter(documents)
        .map(|document| {
            let extractor = extractor.clone();
            async move {
                let url = document.url.clone();
                let shares = document.shares;
                let result =
                    tokio::task::spawn_blocking(move || extract_keywords(&document.text, &extractor))
                        .await;
                (url, shares, result)
            }
        })
        .buffer_unordered(config.concurrency.max(1));

    while let Some((url, shares, result)) = partials.next().await {
        match result {
            Ok(keywords) => {
                debug!(%url, shares, keywords = ?keywords.keys().sorted().collect::<Vec<_>>(), "Extracted keywords");
                let weighted = keywords
                    .into_iter()
                    .map(|(keyword, count)| (keyword, count * shares))
                    .collect();
                merge_counts(&mut counts, weighted);
            }
            Err(e) => error!(%url, error = %e, "Keyword extraction failed; skipping page"),
        }
    }

    let total = counts.len();
    let kept = apply_threshold(counts, config.min_count);
    info!(total, kept = kept.len(), min_count = config.min_count, "Aggregated keywords");
    kept
}

/// Run one n-gram analysis and write its output file.
#[instrument(level = "info", skip_all, fields(run = %run.output_name()))]
pub async fn run_ngram_analysis(
    run: NgramRun,
    documents: Vec<Document>,
    config: &AnalysisConfig,
    data_dir: &Path,
) -> Result<KeywordCounts, Box<dyn Error>> {
    let counts = aggregate_keywords(run, documents, config).await;
    json::write_json(data_dir, &run.output_name(), &counts).await?;
    Ok(counts)
}

/// Run every configured n-gram analysis over `links`.
///
/// Each distinct article page is fetched once, and only if a content run is
/// configured; a link shared several times still counts once per share.
/// Runs execute concurrently; a failed run is logged and does not stop the
/// others.
#[instrument(level = "info", skip_all, fields(links = links.len(), runs = config.runs.len()))]
pub async fn execute(client: &Client, links: &[String], config: &AnalysisConfig, data_dir: &Path) {
    let has_content_run = config.runs.iter().any(|r| r.strategy == Strategy::Content);
    let pages = if has_content_run {
        let distinct: Vec<String> = links.iter().unique().cloned().collect();
        extractor::fetch_documents(client, distinct, config.concurrency).await
    } else {
        Vec::new()
    };
    if has_content_run && pages.is_empty() && !links.is_empty() {
        warn!("No article contents available for content runs");
    }

    let analyses = config.runs.iter().map(|run| {
        let documents = extractor::documents_for(run.strategy, links, &pages);
        async move {
            let name = run.output_name();
            match run_ngram_analysis(*run, documents, config, data_dir).await {
                Ok(counts) => info!(run = %name, keywords = counts.len(), "N-gram analysis complete"),
                Err(e) => error!(run = %name, error = %e, "N-gram analysis failed"),
            }
        }
    });
    join_all(analyses).await;
}
