//! Crossborder LLM API.
//!
//! An HTTP service for cross-border e-commerce teams: it crawls product
//! pages, and drives an LLM workflow that tags products, profiles
//! influencers from their platform content, matches them to products,
//! writes outreach emails and classifies replies.
//!
//! ```text
//! product -> platforms -> profiles -> match -> filter -> [emails]
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`api`]: HTTP routes, handlers and OpenAPI document
//! - [`crawl`]: Product page crawling and crawl jobs
//! - [`llm`]: Chat model trait, Azure OpenAI client and prompts
//! - [`workflow`]: Marketing workflow nodes and pipelines
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod crawl;
pub mod error;
pub mod llm;
pub mod metrics;
pub mod utils;
pub mod workflow;

pub use config::Config;
pub use error::{AppError, Result};
