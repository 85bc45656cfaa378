//! Click statistics from the Bitly link-metrics API.
//!
//! Every link shared in the newsletter is shortened through Bitly and
//! tagged with its edition. This module walks the account's links and
//! produces two data files:
//!
//! - `top3_links.json`: the three most clicked links of each edition
//! - `country_metrics.json`: each country's share of all clicks
//!
//! # API calls
//!
//! | Step | Endpoint |
//! |------|----------|
//! | organization | `GET /v4/organizations` |
//! | group | `GET /v4/groups?organization_guid=…` |
//! | links | `GET /v4/groups/{group}/bitlinks?size=25` (paginated) |
//! | clicks | `GET /v4/bitlinks/{id}/clicks/summary` (last 30 days) |
//! | countries | `GET /v4/bitlinks/{id}/countries` (last 30 days) |

pub mod client;
pub mod metrics;

pub use client::{BitlyApi, BitlyError, HttpBitly, RetryApi};

use crate::models::ClickSummary;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

const API_BASE: &str = "https://api-ssl.bitly.com/v4";
const WINDOW: &str = "unit=day&units=30&size=30";

#[derive(Debug, Deserialize)]
struct Guid {
    guid: String,
}

#[derive(Debug, Deserialize)]
struct Organizations {
    organizations: Vec<Guid>,
}

#[derive(Debug, Deserialize)]
struct Groups {
    groups: Vec<Guid>,
}

#[derive(Debug, Deserialize)]
struct Bitlink {
    id: String,
    link: String,
    long_url: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BitlinksPage {
    links: Vec<Bitlink>,
    #[serde(default)]
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct ClicksSummary {
    total_clicks: u64,
}

#[derive(Debug, Deserialize)]
struct CountryMetric {
    value: String,
    clicks: u64,
}

#[derive(Debug, Deserialize)]
struct Countries {
    metrics: Vec<CountryMetric>,
}

/// Edition → its links, in API order.
pub type LinksByEdition = BTreeMap<String, Vec<ClickSummary>>;

/// GUID of the token's first organization.
#[instrument(level = "info", skip_all)]
pub async fn org_guid<A: BitlyApi>(api: &A) -> Result<String, BitlyError> {
    let orgs: Organizations = api.get_json(&format!("{API_BASE}/organizations")).await?;
    let guid = orgs
        .organizations
        .into_iter()
        .next()
        .map(|o| o.guid)
        .ok_or_else(|| BitlyError::Missing("no Bitly organization for this token".to_string()))?;
    info!(%guid, "Found organization");
    Ok(guid)
}

/// GUID of the organization's first group.
#[instrument(level = "info", skip(api))]
pub async fn group_guid<A: BitlyApi>(api: &A, org_guid: &str) -> Result<String, BitlyError> {
    let url = format!(
        "{API_BASE}/groups?organization_guid={}",
        urlencoding::encode(org_guid)
    );
    let groups: Groups = api.get_json(&url).await?;
    let guid = groups
        .groups
        .into_iter()
        .next()
        .map(|g| g.guid)
        .ok_or_else(|| BitlyError::Missing(format!("no Bitly group in organization {org_guid}")))?;
    info!(%guid, "Found group");
    Ok(guid)
}

/// Clicks on `bitly_id` over the last 30 days.
pub async fn total_clicks<A: BitlyApi>(api: &A, bitly_id: &str) -> Result<u64, BitlyError> {
    let url = format!("{API_BASE}/bitlinks/{bitly_id}/clicks/summary?{WINDOW}");
    let summary: ClicksSummary = api.get_json(&url).await?;
    Ok(summary.total_clicks)
}

/// Clicks on `bitly_id` per country code over the last 30 days.
pub async fn country_clicks<A: BitlyApi>(
    api: &A,
    bitly_id: &str,
) -> Result<Vec<(String, u64)>, BitlyError> {
    let url = format!("{API_BASE}/bitlinks/{bitly_id}/countries?{WINDOW}");
    let countries: Countries = api.get_json(&url).await?;
    Ok(countries
        .metrics
        .into_iter()
        .map(|m| (m.value, m.clicks))
        .collect())
}

/// Every link of the group with its click total, grouped by edition.
///
/// Follows `pagination.next` until the API returns no next page. The
/// edition is the link's first tag; untagged links are skipped.
#[instrument(level = "info", skip(api))]
pub async fn links_by_group<A: BitlyApi>(
    api: &A,
    group_guid: &str,
) -> Result<LinksByEdition, BitlyError> {
    let mut by_edition = LinksByEdition::new();
    let mut next = Some(format!("{API_BASE}/groups/{group_guid}/bitlinks?size=25&page=1"));
    let mut pages = 0usize;

    while let Some(url) = next.take() {
        let page: BitlinksPage = api.get_json(&url).await?;
        pages += 1;
        debug!(page = pages, links = page.links.len(), "Fetched bitlinks page");

        for bitlink in page.links {
            let Some(edition) = bitlink.tags.first().cloned() else {
                warn!(id = %bitlink.id, "Bitlink has no edition tag; skipping");
                continue;
            };
            let click_count = total_clicks(api, &bitlink.id).await?;
            by_edition.entry(edition.clone()).or_default().push(ClickSummary {
                bitly_id: bitlink.id,
                short_link: bitlink.link,
                long_link: bitlink.long_url,
                title: bitlink.title.unwrap_or_default(),
                click_count,
                edition,
            });
        }

        next = page.pagination.next.filter(|n| !n.is_empty());
    }

    info!(
        pages,
        editions = by_edition.len(),
        links = by_edition.values().map(Vec::len).sum::<usize>(),
        "Collected bitlinks"
    );
    Ok(by_edition)
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use serde::de::DeserializeOwned;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned JSON bodies by URL and records requests.
    #[derive(Default)]
    pub struct FakeBitly {
        pub responses: HashMap<String, String>,
        pub requests: RefCell<Vec<String>>,
    }

    impl FakeBitly {
        pub fn with(mut self, url: &str, body: &str) -> Self {
            self.responses.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl BitlyApi for FakeBitly {
        async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, BitlyError> {
            self.requests.borrow_mut().push(url.to_string());
            let body = self.responses.get(url).ok_or_else(|| BitlyError::Status {
                url: url.to_string(),
                status: 404,
                body: "not found".to_string(),
            })?;
            serde_json::from_str(body).map_err(|source| BitlyError::Decode {
                url: url.to_string(),
                source,
            })
        }
    }

    /// An account with two pages of links across two editions.
    pub fn account() -> FakeBitly {
        let page2 = format!("{API_BASE}/groups/G1/bitlinks?size=25&page=2");
        FakeBitly::default()
            .with(&format!("{API_BASE}/organizations"), r#"{"organizations":[{"guid":"O1"}]}"#)
            .with(
                &format!("{API_BASE}/groups?organization_guid=O1"),
                r#"{"groups":[{"guid":"G1"}]}"#,
            )
            .with(
                &format!("{API_BASE}/groups/G1/bitlinks?size=25&page=1"),
                &format!(
                    r#"{{"links":[
                        {{"id":"bit.ly/a","link":"https://bit.ly/a","long_url":"https://a.com/1","title":"A1","tags":["DEW #60"]}},
                        {{"id":"bit.ly/b","link":"https://bit.ly/b","long_url":"https://b.com/1","title":"B1","tags":["DEW #60"]}},
                        {{"id":"bit.ly/u","link":"https://bit.ly/u","long_url":"https://u.com/1","title":"U","tags":[]}}
                    ],"pagination":{{"next":"{page2}"}}}}"#
                ),
            )
            .with(
                &page2,
                r#"{"links":[
                    {"id":"bit.ly/c","link":"https://bit.ly/c","long_url":"https://c.com/1","title":null,"tags":["DEW #61"]}
                ],"pagination":{"next":""}}"#,
            )
            .with(&format!("{API_BASE}/bitlinks/bit.ly/a/clicks/summary?{WINDOW}"), r#"{"total_clicks":10}"#)
            .with(&format!("{API_BASE}/bitlinks/bit.ly/b/clicks/summary?{WINDOW}"), r#"{"total_clicks":30}"#)
            .with(&format!("{API_BASE}/bitlinks/bit.ly/c/clicks/summary?{WINDOW}"), r#"{"total_clicks":5}"#)
            .with(
                &format!("{API_BASE}/bitlinks/bit.ly/a/countries?{WINDOW}"),
                r#"{"metrics":[{"value":"US","clicks":6},{"value":"GB","clicks":4}]}"#,
            )
            .with(
                &format!("{API_BASE}/bitlinks/bit.ly/b/countries?{WINDOW}"),
                r#"{"metrics":[{"value":"US","clicks":20},{"value":"ZZ","clicks":10}]}"#,
            )
            .with(
                &format!("{API_BASE}/bitlinks/bit.ly/c/countries?{WINDOW}"),
                r#"{"metrics":[{"value":"IN","clicks":10}]}"#,
            )
    }
}
