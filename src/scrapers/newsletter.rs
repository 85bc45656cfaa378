//! Data Engineering Weekly edition indexing.
//!
//! Edition URLs follow a fixed pattern, so no crawling is needed to find
//! them. Each edition page is then scanned for outbound links, which are the
//! articles shared that week.

use super::fetch_html;
use crate::config::{AnalysisConfig, LinkFilters};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Whether `url` parses with both a scheme and a host.
pub fn is_valid(url: &str) -> bool {
    Url::parse(url).is_ok_and(|u| !u.scheme().is_empty() && u.has_host())
}

/// Build the edition page URLs for the configured edition range.
#[instrument(level = "info", skip_all, fields(first = config.first_edition, last = config.last_edition))]
pub fn weekly_links(config: &AnalysisConfig) -> Vec<String> {
    let mut editions = Vec::new();
    for edition in config.first_edition..config.last_edition {
        let url = config
            .edition_url_template
            .replace("{edition}", &edition.to_string());
        if is_valid(&url) {
            editions.push(url);
        } else {
            warn!(%url, "Found invalid edition url");
        }
    }
    info!(count = editions.len(), "Built edition URLs");
    editions
}

/// Extract the outbound article links from an edition page.
///
/// Links are resolved against `base`, reduced to `scheme://host/path`, and
/// kept only if they are http(s), do not point back at the newsletter's own
/// host, and are not rejected by `filters`.
pub fn article_links(base: &Url, html: &str, filters: &LinkFilters) -> BTreeSet<String> {
    let document = Html::parse_document(html);
    let anchor = Selector::parse("a[href]").unwrap();
    let own_host = base.host_str().unwrap_or_default();

    let mut links = BTreeSet::new();
    for element in document.select(&anchor) {
        let Some(href) = element.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty() {
            continue;
        }
        let Ok(resolved) = base.join(href) else {
            debug!(%href, "Unresolvable href");
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        let Some(host) = resolved.host_str() else {
            continue;
        };
        let port = resolved.port().map(|p| format!(":{p}")).unwrap_or_default();
        let link = format!("{}://{}{}{}", resolved.scheme(), host, port, resolved.path());

        if !own_host.is_empty() && link.contains(own_host) {
            continue;
        }
        if filters.rejects(&link) {
            continue;
        }
        links.insert(link);
    }
    links
}

/// Fetch one edition page and extract its article links.
#[instrument(level = "info", skip(client, filters))]
pub async fn fetch_edition_links(
    client: &Client,
    edition_url: &str,
    filters: &LinkFilters,
) -> Result<BTreeSet<String>, Box<dyn Error>> {
    let base = Url::parse(edition_url)?;
    let html = fetch_html(client, edition_url).await?;
    let links = article_links(&base, &html, filters);
    info!(count = links.len(), "Indexed edition links");
    Ok(links)
}

/// Fetch every edition concurrently and concatenate their article links.
///
/// A link shared in several editions appears once per edition. Editions
/// that fail to load are logged and skipped.
#[instrument(level = "info", skip_all, fields(editions = editions.len()))]
pub async fn collect_article_links(
    client: &Client,
    editions: Vec<String>,
    config: &AnalysisConfig,
) -> Vec<String> {
    let filters = &config.link_filters;
    let mut per_edition: Vec<(String, BTreeSet<String>)> = stream::iter(editions)
        .map(|edition| async move {
            match fetch_edition_links(client, &edition, filters).await {
                Ok(links) => Some((edition, links)),
                Err(e) => {
                    error!(error = %e, %edition, "Edition fetch failed");
                    None
                }
            }
        })
        .buffer_unordered(config.concurrency.max(1))
        .filter_map(std::future::ready)
        .collect()
        .await;
    per_edition.sort_by(|a, b| a.0.cmp(&b.0));

    let links: Vec<String> = per_edition
        .into_iter()
        .flat_map(|(_, links)| links)
        .collect();
    info!(count = links.len(), "Collected article links");
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDITION_HTML: &str = r##"
        <html><body>
          <a href="https://engineering.example.com/post/streaming-joins?utm_source=dew#top">Joins</a>
          <a href="/p/data-engineering-weekly-41">Previous edition</a>
          <a href="https://www.dataengineeringweekly.com/subscribe">Subscribe</a>
          <a href="https://substack.com">Substack</a>
          <a href="https://twitter.com/someone/status/12345">Tweet</a>
          <a href="https://www.youtube.com/watch?v=abc">Talk</a>
          <a href="javascript:void(0)">Share</a>
          <a href="mailto:editor@example.com">Mail</a>
          <a href="">Empty</a>
          <a>No href</a>
          <a href="https://medium.com/airbnb-engineering/data-quality-at-airbnb-870d03080469">Airbnb</a>
          <a href="https://engineering.example.com/post/streaming-joins">Joins again</a>
        </body></html>
    "##;

    fn base() -> Url {
        Url::parse("https://www.dataengineeringweekly.com/p/data-engineering-weekly-42").unwrap()
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("https://www.dataengineeringweekly.com/p/data-engineering-weekly-24"));
        assert!(!is_valid("not a url"));
        assert!(!is_valid("data:text/plain,hello"));
    }

    #[test]
    fn test_weekly_links_covers_range() {
        let config = AnalysisConfig::default();
        let links = weekly_links(&config);
        assert_eq!(links.len(), 42);
        assert_eq!(
            links[0],
            "https://www.dataengineeringweekly.com/p/data-engineering-weekly-24"
        );
        assert!(links.last().unwrap().ends_with("-65"));
    }

    #[test]
    fn test_weekly_links_skips_invalid_template() {
        let config = AnalysisConfig {
            edition_url_template: "editions/{edition}".to_string(),
            ..AnalysisConfig::default()
        };
        assert!(weekly_links(&config).is_empty());
    }

    #[test]
    fn test_article_links_filters_and_normalises() {
        let links = article_links(&base(), EDITION_HTML, &LinkFilters::default());
        let links: Vec<&str> = links.iter().map(String::as_str).collect();
        assert_eq!(
            links,
            vec![
                "https://engineering.example.com/post/streaming-joins",
                "https://medium.com/airbnb-engineering/data-quality-at-airbnb-870d03080469",
            ]
        );
    }

    #[test]
    fn test_article_links_without_filters_keeps_social_links() {
        let filters = LinkFilters {
            deny_exact: vec![],
            deny_contains: vec![],
        };
        let links = article_links(&base(), EDITION_HTML, &filters);
        assert!(links.contains("https://twitter.com/someone/status/12345"));
        assert!(links.contains("https://www.youtube.com/watch"));
        assert!(!links.iter().any(|l| l.contains("dataengineeringweekly.com")));
        assert!(!links.iter().any(|l| l.starts_with("mailto")));
    }

    /// Serve `body` to every request on a local port.
    async fn serve(body: &'static str) -> std::net::SocketAddr {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut request = [0u8; 4096];
                    let _ = socket.read(&mut request).await;
                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_collect_article_links_skips_failed_edition() {
        let addr = serve(EDITION_HTML).await;
        let reachable = format!("http://{addr}/p/data-engineering-weekly-41");
        let editions = vec![
            "http://127.0.0.1:9/p/data-engineering-weekly-40".to_string(),
            reachable.clone(),
        ];
        let config = AnalysisConfig::default();
        let client = Client::builder()
            .no_proxy()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap();

        let links = collect_article_links(&client, editions, &config).await;

        let expected: Vec<String> =
            article_links(&Url::parse(&reachable).unwrap(), EDITION_HTML, &config.link_filters)
                .into_iter()
                .collect();
        assert!(!expected.is_empty());
        assert_eq!(links, expected);
    }

    #[tokio::test]
    async fn test_collect_article_links_repeats_links_across_editions() {
        let addr = serve(EDITION_HTML).await;
        let editions = vec![
            format!("http://{addr}/p/data-engineering-weekly-41"),
            format!("http://{addr}/p/data-engineering-weekly-42"),
        ];
        let client = Client::builder()
            .no_proxy()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .unwrap();

        let links = collect_article_links(&client, editions, &AnalysisConfig::default()).await;

        let joins = "https://engineering.example.com/post/streaming-joins";
        assert_eq!(links.iter().filter(|l| *l == joins).count(), 2);
    }
}
