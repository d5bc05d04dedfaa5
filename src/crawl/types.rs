//! Crawl job and product detail types.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use time::OffsetDateTime;
use utoipa::ToSchema;

/// Value used for fields the product page did not provide.
pub const NOT_AVAILABLE: &str = "N/A";

/// Crawl job lifecycle state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    /// Accepted, not started yet.
    Pending,
    /// Crawl in progress.
    Running,
    /// Finished with product details.
    Completed,
    /// Finished with an error.
    Failed,
}

impl JobStatus {
    /// Whether the job reached a final state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Product details scraped from a product page.
///
/// Every field is a display string; missing values are `"N/A"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProductDetails {
    pub platform: String,
    pub product_url: String,
    pub product_title: String,
    pub asin: String,
    pub price: String,
    pub rating: String,
    /// Digits only, `"0"` when absent.
    pub review_count: String,
    /// Units bought last month, e.g. `"1000+"`.
    pub monthly_sales: String,
    pub availability: String,
    /// Defaults to `"Amazon"`.
    pub seller: String,
    pub seller_url: String,
    /// Business address from the seller profile page.
    pub seller_address: String,
    pub image_url: String,
    /// Bullet points joined with `" | "`.
    pub features: String,
    /// At most 2000 characters.
    pub description: String,
    pub brand_name: String,
    pub listing_date: String,
    pub bsr_rank_full_text: String,
    pub bsr_top_category_rank: String,
}

impl ProductDetails {
    /// Details with every field at its default.
    pub fn empty(product_url: &str, platform: &str) -> Self {
        let na = || NOT_AVAILABLE.to_string();
        Self {
            platform: platform.to_string(),
            product_url: product_url.to_string(),
            product_title: na(),
            asin: na(),
            price: na(),
            rating: na(),
            review_count: "0".to_string(),
            monthly_sales: na(),
            availability: na(),
            seller: "Amazon".to_string(),
            seller_url: na(),
            seller_address: na(),
            image_url: na(),
            features: na(),
            description: na(),
            brand_name: na(),
            listing_date: na(),
            bsr_rank_full_text: na(),
            bsr_top_category_rank: na(),
        }
    }
}

/// Result attached to a finished job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum JobResult {
    /// Successful crawl.
    Product(ProductDetails),
    /// Failed crawl.
    Failure {
        error: String,
        product_url: String,
        platform: String,
    },
}

/// Snapshot of a crawl job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CrawlJob {
    #[serde(rename = "jobId")]
    pub job_id: String,
    pub status: JobStatus,
    pub url: String,
    pub platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: OffsetDateTime,
}

impl CrawlJob {
    /// New pending job.
    pub fn pending(job_id: String, url: String, platform: String) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            job_id,
            status: JobStatus::Pending,
            url,
            platform,
            message: None,
            result: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to `status`, refreshing `updated_at`.
    pub fn transition(&mut self, status: JobStatus) {
        self.status = status;
        self.updated_at = OffsetDateTime::now_utc();
    }
}
