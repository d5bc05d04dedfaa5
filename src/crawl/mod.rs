//! Product crawling.
//!
//! This module handles:
//! - Fetching product pages and extracting product details
//! - The asynchronous crawl job registry behind `/api/products/crawl`

pub mod crawler;
pub mod extract;
pub mod jobs;
pub mod types;

pub use crawler::{validate_product_url, HttpProductCrawler, MockProductCrawler, ProductCrawler};
pub use extract::{extract_product_details, extract_seller_address, is_seller_profile};
pub use jobs::JobStore;
pub use types::{CrawlJob, JobResult, JobStatus, ProductDetails};
