//! Markdown dashboard over the data files.
//!
//! # Sections
//!
//! | Section | Source file |
//! |---------|-------------|
//! | DEW Viewers Distribution Percentage | `country_metrics.json` |
//! | DEW Top 3 Most Viewed Links Per Edition | `top3_links.json` |
//! | Top Keywords (one table per run) | `{strategy}{n}.json` |
//! | Top Domains | `domain.json` |
//!
//! A selected section whose file is missing fails the whole render with an
//! error naming the file, so a stale or partial dashboard is never written.

use super::json;
use crate::config::NgramRun;
use crate::models::{ClickSummary, CountryMetrics, KeywordCounts};
use crate::utils::format_percentage;
use chrono::Local;
use itertools::Itertools;
use std::error::Error;
use std::fmt::Write;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

/// Which sections to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sections {
    pub geography: bool,
    pub top_links: bool,
    pub keywords: bool,
    pub domains: bool,
}

impl Sections {
    /// Geography alone, the dashboard's default view.
    pub fn geography_only() -> Self {
        Self {
            geography: true,
            top_links: false,
            keywords: false,
            domains: false,
        }
    }
}

/// Everything the selected sections need, already loaded.
#[derive(Debug, Default)]
pub struct DashboardData {
    pub country_metrics: Option<CountryMetrics>,
    pub top_links: Option<Vec<ClickSummary>>,
    /// Run output name → counts, in run order.
    pub keywords: Vec<(String, KeywordCounts)>,
    pub domains: Option<KeywordCounts>,
}

/// Load the data files for the selected sections.
#[instrument(level = "info", skip(data_dir, runs), fields(data_dir = %data_dir.display()))]
pub async fn load(
    data_dir: &Path,
    sections: Sections,
    runs: &[NgramRun],
) -> Result<DashboardData, Box<dyn Error>> {
    let mut data = DashboardData::default();
    if sections.geography {
        data.country_metrics = Some(json::read_json(data_dir, "country_metrics").await?);
    }
    if sections.top_links {
        data.top_links = Some(json::read_json(data_dir, "top3_links").await?);
    }
    if sections.keywords {
        for run in runs {
            let name = run.output_name();
            let counts = json::read_json(data_dir, &name).await?;
            data.keywords.push((name, counts));
        }
    }
    if sections.domains {
        data.domains = Some(json::read_json(data_dir, "domain").await?);
    }
    Ok(data)
}

/// Render the loaded data as Markdown.
///
/// Keyword and domain tables are cut to `limit` rows, most frequent first.
pub fn render(data: &DashboardData, limit: usize, generated_at: &str) -> String {
    let mut md = String::new();
    writeln!(md, "# Data Engineering Weekly Analytics\n").unwrap();
    writeln!(md, "_Generated {generated_at}_\n").unwrap();

    if let Some(metrics) = &data.country_metrics {
        writeln!(md, "## DEW Viewers Distribution Percentage\n").unwrap();
        writeln!(md, "| Country | Readers Percentage |").unwrap();
        writeln!(md, "|---|---|").unwrap();
        for (country, share) in sorted_shares(metrics) {
            writeln!(md, "| {} | {} |", cell(country), format_percentage(share)).unwrap();
        }
        md.push('\n');
    }

    if let Some(links) = &data.top_links {
        writeln!(md, "## DEW Top 3 Most Viewed Links Per Edition\n").unwrap();
        writeln!(md, "| Edition | Title | URL |").unwrap();
        writeln!(md, "|---|---|---|").unwrap();
        for link in links {
            writeln!(
                md,
                "| {} | {} | {} |",
                cell(&link.edition),
                cell(&link.title),
                cell(&link.short_link)
            )
            .unwrap();
        }
        md.push('\n');
    }

    for (name, counts) in &data.keywords {
        writeln!(md, "## Top Keywords: {name}\n").unwrap();
        count_table(&mut md, "Keyword", counts, limit);
    }

    if let Some(domains) = &data.domains {
        writeln!(md, "## Top Domains\n").unwrap();
        count_table(&mut md, "Domain", domains, limit);
    }

    md
}

/// Load, render and write `{data_dir}/dashboard.md`.
///
/// Returns the written path and the Markdown.
#[instrument(level = "info", skip(data_dir, runs), fields(data_dir = %data_dir.display()))]
pub async fn write_dashboard(
    data_dir: &Path,
    sections: Sections,
    runs: &[NgramRun],
    limit: usize,
) -> Result<(PathBuf, String), Box<dyn Error>> {
    let data = load(data_dir, sections, runs).await?;
    let generated_at = Local::now().format("%Y-%m-%d %H:%M").to_string();
    let md = render(&data, limit, &generated_at);

    let path = data_dir.join("dashboard.md");
    fs::write(&path, &md).await?;
    info!(path = %path.display(), bytes = md.len(), "Wrote dashboard");
    Ok((path, md))
}

fn sorted_shares(metrics: &CountryMetrics) -> Vec<(&str, f64)> {
    metrics
        .iter()
        .map(|(country, share)| {
            let value = share.parse::<f64>().unwrap_or_else(|_| {
                warn!(%country, %share, "Unparseable country share; showing 0");
                0.0
            });
            (country.as_str(), value)
        })
        .sorted_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)))
        .collect()
}

fn count_table(md: &mut String, label: &str, counts: &KeywordCounts, limit: usize) {
    writeln!(md, "| {label} | Count |").unwrap();
    writeln!(md, "|---|---|").unwrap();
    for (key, count) in counts
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)))
        .take(limit)
    {
        writeln!(md, "| {} | {} |", cell(key), count).unwrap();
    }
    md.push('\n');
}

/// Escape a value for a Markdown table cell.
fn cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Strategy;

    fn sample() -> DashboardData {
        DashboardData {
            country_metrics: Some(CountryMetrics::from([
                ("India".to_string(), "12.5".to_string()),
                ("United States".to_string(), "41.27".to_string()),
                ("Others".to_string(), "7.0".to_string()),
            ])),
            top_links: Some(vec![ClickSummary {
                bitly_id: "bit.ly/a".to_string(),
                short_link: "https://bit.ly/a".to_string(),
                long_link: "https://example.com/a".to_string(),
                title: "Kafka | Flink".to_string(),
                click_count: 12,
                edition: "DEW #60".to_string(),
            }]),
            keywords: vec![(
                "content_extractor1".to_string(),
                KeywordCounts::from([
                    ("kafka".to_string(), 9),
                    ("spark".to_string(), 9),
                    ("dbt".to_string(), 4),
                ]),
            )],
            domains: None,
        }
    }

    #[test]
    fn test_render_country_table_sorted_by_share() {
        let md = render(&sample(), 10, "2026-10-18 09:00");
        let us = md.find("| United States | 41.27% |").unwrap();
        let india = md.find("| India | 12.5% |").unwrap();
        let others = md.find("| Others | 7.0% |").unwrap();
        assert!(us < india && india < others);
    }

    #[test]
    fn test_render_escapes_and_limits() {
        let md = render(&sample(), 2, "2026-10-18 09:00");
        assert!(md.contains("| DEW #60 | Kafka \\| Flink | https://bit.ly/a |"));
        assert!(md.contains("## Top Keywords: content_extractor1"));
        let kafka = md.find("| kafka | 9 |").unwrap();
        let spark = md.find("| spark | 9 |").unwrap();
        assert!(kafka < spark);
        assert!(!md.contains("| dbt |"));
        assert!(!md.contains("Top Domains"));
    }

    #[tokio::test]
    async fn test_write_dashboard_requires_selected_files() {
        let tmp = tempfile::tempdir().unwrap();
        let err = write_dashboard(tmp.path(), Sections::geography_only(), &[], 10)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("country_metrics.json"));
    }

    #[tokio::test]
    async fn test_write_dashboard_with_keywords_and_domains() {
        let tmp = tempfile::tempdir().unwrap();
        let runs = [NgramRun::new(Strategy::Url, 1, 2)];
        json::write_json(tmp.path(), "url_extractor1", &KeywordCounts::from([("iceberg".to_string(), 5)]))
            .await
            .unwrap();
        json::write_json(tmp.path(), "domain", &KeywordCounts::from([("eng.uber.com".to_string(), 3)]))
            .await
            .unwrap();

        let sections = Sections {
            geography: false,
            top_links: false,
            keywords: true,
            domains: true,
        };
        let (path, md) = write_dashboard(tmp.path(), sections, &runs, 10).await.unwrap();
        assert_eq!(path, tmp.path().join("dashboard.md"));
        assert!(md.contains("| iceberg | 5 |"));
        assert!(md.contains("| eng.uber.com | 3 |"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), md);
    }
}
