//! Product page crawlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::extract::{extract_product_details, extract_seller_address, is_seller_profile};
use super::types::ProductDetails;
use crate::config::Config;
use crate::error::CrawlError;
use crate::metrics;

/// Fetches a product page and extracts its details.
#[async_trait]
pub trait ProductCrawler: Send + Sync {
    /// Crawl one product page.
    async fn crawl(&self, product_url: &str, platform: &str) -> Result<ProductDetails, CrawlError>;
}

/// Check that `url` is an absolute http(s) URL with a host.
pub fn validate_product_url(url: &str) -> Result<Url, CrawlError> {
    let invalid = |reason: &str| CrawlError::InvalidUrl {
        url: url.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(url.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(parsed)
}

/// Crawler fetching pages over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpProductCrawler {
    http: reqwest::Client,
}

impl HttpProductCrawler {
    /// Create a crawler with the configured user agent and timeout.
    pub fn new(config: &Config) -> crate::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.crawl_user_agent.clone())
            .timeout(Duration::from_secs(config.crawl_timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http })
    }

    async fn fetch(&self, url: &Url) -> Result<String, CrawlError> {
        let response = self
            .http
            .get(url.clone())
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| CrawlError::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::FetchFailed {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        Ok(response.text().await?)
    }

    /// Fill in the seller address from the seller profile page, if linked.
    async fn add_seller_address(&self, details: &mut ProductDetails) {
        if !is_seller_profile(&details.seller_url) {
            return;
        }
        let page = match Url::parse(&details.seller_url) {
            Ok(url) => self.fetch(&url).await,
            Err(e) => {
                warn!(url = %details.seller_url, error = %e, "Unparsable seller url");
                return;
            }
        };
        match page {
            Ok(html) => match extract_seller_address(&html) {
                Some(address) => details.seller_address = address,
                None => debug!(url = %details.seller_url, "No business address on seller page"),
            },
            Err(e) => warn!(error = %e, "Failed to fetch seller page"),
        }
    }
}

#[async_trait]
impl ProductCrawler for HttpProductCrawler {
    #[instrument(skip(self))]
    async fn crawl(&self, product_url: &str, platform: &str) -> Result<ProductDetails, CrawlError> {
        let url = validate_product_url(product_url)?;
        let _timer = metrics::timer_crawl();

        let html = self.fetch(&url).await?;
        debug!(bytes = html.len(), "Fetched product page");

        let mut details = extract_product_details(&html, product_url, platform)?;
        self.add_seller_address(&mut details).await;
        info!(title = %details.product_title, asin = %details.asin, "Product details extracted");
        Ok(details)
    }
}

/// Crawler returning canned pages, for tests.
#[derive(Debug, Clone, Default)]
pub struct MockProductCrawler {
    pages: Arc<Mutex<HashMap<String, String>>>,
    delay: Option<Duration>,
}

impl MockProductCrawler {
    /// Crawler with no pages; every URL fails to fetch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(url.into(), html.into());
        self
    }

    fn page(&self, url: &str) -> Option<String> {
        self.pages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(url)
            .cloned()
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ProductCrawler for MockProductCrawler {
    async fn crawl(&self, product_url: &str, platform: &str) -> Result<ProductDetails, CrawlError> {
        validate_product_url(product_url)?;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let html = self.page(product_url).ok_or_else(|| CrawlError::FetchFailed {
            url: product_url.to_string(),
            reason: "HTTP 404 Not Found".to_string(),
        })?;

        let mut details = extract_product_details(&html, product_url, platform)?;
        if is_seller_profile(&details.seller_url) {
            if let Some(address) = self
                .page(&details.seller_url)
                .and_then(|seller| extract_seller_address(&seller))
            {
                details.seller_address = address;
            }
        }
        Ok(details)
    }
}
