//! LLM-driven influencer marketing workflow.
//!
//! This module handles:
//! - Workflow data types and state
//! - The individual nodes (product tagging, platform analysis, profiling,
//!   matching, filtering, email generation, reply intent)
//! - Pipelines composing the nodes

pub mod nodes;
pub mod pipelines;
pub mod state;

pub use nodes::{filter_matches, should_generate_emails, Workflow};
pub use state::{
    GeneratedEmail, InfluencerInput, InfluencerProfile, IntentAnalysis, MarketingState,
    MatchResult, PlatformAnalysis, PlatformAnalysisMap, PlatformContent, ProductInfo, ProductTags,
    DEFAULT_MATCH_THRESHOLD,
};
