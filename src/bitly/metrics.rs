//! Country distribution and top links derived from Bitly data.

use super::{BitlyApi, LinksByEdition, country_clicks, group_guid, links_by_group, org_guid};
use crate::models::{ClickSummary, CountryMetrics};
use crate::outputs::json;
use crate::utils::format_round2;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::io;
use std::path::Path;
use tracing::{error, info, instrument};

/// Country requests kept in flight at once; Bitly rate limits per minute.
const COUNTRY_CONCURRENCY: usize = 4;

/// Country code → display name.
pub type CountryMap = HashMap<String, String>;

/// Parse the country CSV: a header row, then `name,code` rows.
///
/// Quotes and surrounding whitespace are stripped from both fields; rows
/// with fewer than two fields are ignored.
pub fn parse_country_map<R: io::Read>(reader: R) -> Result<CountryMap, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let clean = |field: &str| field.replace('"', "").trim().to_string();
    let mut map = CountryMap::new();
    for record in csv_reader.records() {
        let record = record?;
        if let (Some(name), Some(code)) = (record.get(0), record.get(1)) {
            map.insert(clean(code), clean(name));
        }
    }
    Ok(map)
}

/// Load the country map from a CSV file.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_country_map(path: &Path) -> Result<CountryMap, Box<dyn Error>> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("cannot open country map {}: {e}", path.display()))?;
    let map = parse_country_map(file)?;
    info!(countries = map.len(), "Loaded country map");
    Ok(map)
}

/// Each country's share of all `clicks`, in percent.
///
/// Codes missing from `country_map` are counted as `Others`. Shares are
/// rounded to two decimals and kept as strings. No clicks means no entries.
pub fn country_metrics(clicks: &[(String, u64)], country_map: &CountryMap) -> CountryMetrics {
    let mut per_country: BTreeMap<&str, u64> = BTreeMap::new();
    for (code, count) in clicks {
        let name = country_map.get(code).map(String::as_str).unwrap_or("Others");
        *per_country.entry(name).or_insert(0) += count;
    }

    let total: u64 = per_country.values().sum();
    if total == 0 {
        return CountryMetrics::new();
    }
    per_country
        .into_iter()
        .map(|(name, count)| {
            let share = count as f64 / total as f64 * 100.0;
            (name.to_string(), format_round2(share))
        })
        .collect()
}

/// The `n` most clicked links of each edition, most clicked first.
///
/// Editions appear in ascending order; ties keep API order.
pub fn top_links(links: &LinksByEdition, n: usize) -> Vec<ClickSummary> {
    let mut top = Vec::new();
    for edition_links in links.values() {
        let mut sorted = edition_links.clone();
        sorted.sort_by(|a, b| b.click_count.cmp(&a.click_count));
        top.extend(sorted.into_iter().take(n));
    }
    top
}

/// Fetch country clicks for every link, aggregate, and write
/// `country_metrics.json`.
///
/// A link whose country breakdown cannot be fetched is logged and left out.
#[instrument(level = "info", skip_all)]
pub async fn write_country_metrics<A: BitlyApi>(
    api: &A,
    links: &LinksByEdition,
    country_map: &CountryMap,
    data_dir: &Path,
) -> Result<CountryMetrics, Box<dyn Error>> {
    let ids: Vec<&str> = links
        .values()
        .flatten()
        .map(|l| l.bitly_id.as_str())
        .collect();

    let per_link: Vec<Vec<(String, u64)>> = stream::iter(ids)
        .map(|id| async move {
            match country_clicks(api, id).await {
                Ok(clicks) => Some(clicks),
                Err(e) => {
                    error!(%id, error = %e, "Country metrics fetch failed; skipping link");
                    None
                }
            }
        })
        .buffer_unordered(COUNTRY_CONCURRENCY)
        .filter_map(std::future::ready)
        .collect()
        .await;

    let clicks: Vec<(String, u64)> = per_link.into_iter().flatten().collect();
    let metrics = country_metrics(&clicks, country_map);
    json::write_json(data_dir, "country_metrics", &metrics).await?;
    info!(countries = metrics.len(), "Wrote country metrics");
    Ok(metrics)
}

/// Write the top three links per edition to `top3_links.json`.
#[instrument(level = "info", skip_all)]
pub async fn write_top_links(
    links: &LinksByEdition,
    data_dir: &Path,
) -> Result<Vec<ClickSummary>, Box<dyn Error>> {
    let top = top_links(links, 3);
    json::write_json(data_dir, "top3_links", &top).await?;
    info!(links = top.len(), "Wrote top links");
    Ok(top)
}

/// Full click pipeline: organization → group → links → both data files.
#[instrument(level = "info", skip_all)]
pub async fn run<A: BitlyApi>(
    api: &A,
    country_map: &CountryMap,
    data_dir: &Path,
) -> Result<(), Box<dyn Error>> {
    let org = org_guid(api).await?;
    let group = group_guid(api, &org).await?;
    let links = links_by_group(api, &group).await?;

    write_country_metrics(api, &links, country_map, data_dir).await?;
    write_top_links(&links, data_dir).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::fake::account;
    use super::*;

    const COUNTRY_CSV: &str = "\"Name\",\"Code\"\n\
        \"United Kingdom\",\"GB\"\n\
        \"Russia\", \"RU\"\n\
        \"United States\",\"US\"\n\
        \"India\",\"IN\"\n\
        \"Incomplete\"\n";

    fn summary(id: &str, clicks: u64, edition: &str) -> ClickSummary {
        ClickSummary {
            bitly_id: id.to_string(),
            short_link: format!("https://{id}"),
            long_link: format!("https://example.com/{id}"),
            title: id.to_string(),
            click_count: clicks,
            edition: edition.to_string(),
        }
    }

    #[test]
    fn test_parse_country_map() {
        let map = parse_country_map(COUNTRY_CSV.as_bytes()).unwrap();
        assert_eq!(map["GB"], "United Kingdom");
        assert_eq!(map["RU"], "Russia");
        assert_eq!(map.len(), 4);
        assert!(!map.contains_key("Code"));
    }

    #[test]
    fn test_bundled_country_map() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("data/country.csv");
        let map = load_country_map(&path).unwrap();
        assert_eq!(map["GB"], "United Kingdom");
        assert_eq!(map["RU"], "Russia");
    }

    #[test]
    fn test_country_metrics_shares() {
        let map = parse_country_map(COUNTRY_CSV.as_bytes()).unwrap();
        let clicks = vec![
            ("US".to_string(), 2),
            ("GB".to_string(), 1),
            ("ZZ".to_string(), 1),
            ("US".to_string(), 2),
        ];
        let metrics = country_metrics(&clicks, &map);
        assert_eq!(metrics["United States"], "66.67");
        assert_eq!(metrics["United Kingdom"], "16.67");
        assert_eq!(metrics["Others"], "16.67");
    }

    #[test]
    fn test_country_metrics_round_half_to_even() {
        let map = parse_country_map(COUNTRY_CSV.as_bytes()).unwrap();
        // 1/32 and 5/32 of the clicks are exactly 3.125% and 15.625%
        let metrics = country_metrics(&[("US".to_string(), 1), ("GB".to_string(), 31)], &map);
        assert_eq!(metrics["United States"], "3.12");
        assert_eq!(metrics["United Kingdom"], "96.88");

        let metrics = country_metrics(&[("IN".to_string(), 5), ("RU".to_string(), 27)], &map);
        assert_eq!(metrics["India"], "15.62");
        assert_eq!(metrics["Russia"], "84.38");
    }

    #[test]
    fn test_country_metrics_without_clicks() {
        let map = CountryMap::new();
        assert!(country_metrics(&[], &map).is_empty());
        assert!(country_metrics(&[("US".to_string(), 0)], &map).is_empty());
    }

    #[test]
    fn test_top_links_per_edition() {
        let mut links = LinksByEdition::new();
        links.insert(
            "DEW #61".to_string(),
            vec![
                summary("a", 1, "DEW #61"),
                summary("b", 9, "DEW #61"),
                summary("c", 5, "DEW #61"),
                summary("d", 7, "DEW #61"),
            ],
        );
        links.insert("DEW #60".to_string(), vec![summary("e", 3, "DEW #60")]);

        let top = top_links(&links, 3);
        let ids: Vec<&str> = top.iter().map(|l| l.bitly_id.as_str()).collect();
        assert_eq!(ids, vec!["e", "b", "d", "c"]);
    }

    #[tokio::test]
    async fn test_run_writes_both_files() {
        let tmp = tempfile::tempdir().unwrap();
        let api = account();
        let map = parse_country_map(COUNTRY_CSV.as_bytes()).unwrap();

        run(&api, &map, tmp.path()).await.unwrap();

        let metrics: CountryMetrics = json::read_json(tmp.path(), "country_metrics").await.unwrap();
        // US 26, GB 4, Others 10, India 10 out of 50
        assert_eq!(metrics["United States"], "52.0");
        assert_eq!(metrics["United Kingdom"], "8.0");
        assert_eq!(metrics["Others"], "20.0");
        assert_eq!(metrics["India"], "20.0");

        let top: Vec<ClickSummary> = json::read_json(tmp.path(), "top3_links").await.unwrap();
        let ids: Vec<&str> = top.iter().map(|l| l.bitly_id.as_str()).collect();
        assert_eq!(ids, vec!["bit.ly/b", "bit.ly/a", "bit.ly/c"]);
    }
}
