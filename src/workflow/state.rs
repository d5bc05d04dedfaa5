//! Workflow data types and the state threaded through the pipelines.
//!
//! JSON field names follow the public API, hence the mix of camelCase,
//! PascalCase and snake_case keys.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// Free-form product description (crawl output or caller supplied).
pub type ProductInfo = Map<String, Value>;

/// Default match threshold in percent.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 80.0;

/// One piece of content an influencer published on a platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PlatformContent {
    pub content_title: Option<String>,
    pub promo_category: Option<String>,
    pub enhanced_tag: Option<String>,
    pub cover_image_url: Option<String>,
    pub content_url: Option<String>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub publish_date: Option<String>,
}

/// An influencer and their recent content, keyed by platform name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfluencerInput {
    pub influencer_id: String,
    pub influencer_name: String,
    #[serde(default)]
    pub platforms: BTreeMap<String, Vec<PlatformContent>>,
}

/// LLM analysis of one influencer on one platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct PlatformAnalysis {
    pub audience_gender: String,
    pub audience_age: String,
    pub region_country: String,
    pub language: String,
    pub content_format: Vec<String>,
    pub recent_content_summary: String,
    pub video_style: String,
    pub content_tone: String,
    pub category_depth: String,
    pub promotion_ability: String,
    pub brand_repetition_rate: String,
    pub content_scene: Vec<String>,
    pub platform: String,
}

/// Cross-platform influencer profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfluencerProfile {
    pub influencer_id: String,
    pub influencer_name: String,
    pub core_content_direction: Vec<String>,
    pub overall_persona_and_style: String,
    pub main_audience: String,
    #[serde(default)]
    pub commercial_degree: String,
    #[serde(default)]
    pub cross_platform_consist: String,
    #[serde(default)]
    pub potential_brand_type: Vec<String>,
    #[serde(default)]
    pub influencer_eval: String,
    #[serde(default)]
    pub goods_carry_rating: String,
}

/// Profile fields as returned by the model, before the influencer's
/// identity is attached.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileDraft {
    pub core_content_direction: Vec<String>,
    pub overall_persona_and_style: String,
    pub main_audience: String,
    pub commercial_degree: String,
    pub cross_platform_consist: String,
    pub potential_brand_type: Vec<String>,
    pub influencer_eval: String,
    pub goods_carry_rating: String,
}

impl ProfileDraft {
    /// Attach the influencer identity.
    pub fn into_profile(self, influencer_id: &str, influencer_name: &str) -> InfluencerProfile {
        InfluencerProfile {
            influencer_id: influencer_id.to_string(),
            influencer_name: influencer_name.to_string(),
            core_content_direction: self.core_content_direction,
            overall_persona_and_style: self.overall_persona_and_style,
            main_audience: self.main_audience,
            commercial_degree: self.commercial_degree,
            cross_platform_consist: self.cross_platform_consist,
            potential_brand_type: self.potential_brand_type,
            influencer_eval: self.influencer_eval,
            goods_carry_rating: self.goods_carry_rating,
        }
    }
}

/// Marketing tags generated for a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProductTags {
    pub feature_tags: Vec<String>,
    pub audience_tags: Vec<String>,
    pub usage_scenario_tags: Vec<String>,
}

impl ProductTags {
    /// Whether the model returned no tags at all.
    pub fn is_empty(&self) -> bool {
        self.feature_tags.is_empty()
            && self.audience_tags.is_empty()
            && self.usage_scenario_tags.is_empty()
    }
}

/// Match between the product and one influencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct MatchResult {
    #[serde(rename = "influencerId")]
    pub influencer_id: String,
    #[serde(rename = "influencerName")]
    pub influencer_name: String,
    /// Percentage such as `"88%"`.
    #[serde(deserialize_with = "string_or_number")]
    pub match_score: String,
    pub match_rationale: String,
}

impl MatchResult {
    /// Numeric score in percent, if the score string parses.
    pub fn score_percent(&self) -> Option<f64> {
        self.match_score
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|score| score.is_finite())
    }
}

/// Outreach email for one influencer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeneratedEmail {
    #[serde(rename = "influencerId")]
    pub influencer_id: String,
    #[serde(rename = "influencerName")]
    pub influencer_name: String,
    pub email_subject: String,
    pub email_body: String,
}

/// Classification of an influencer's reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct IntentAnalysis {
    pub cooperation_intent: String,
    pub key_points: Vec<String>,
    pub suggested_next_step: String,
    pub sentiment: String,
    pub is_urgent: bool,
    pub notification_summary: String,
}

/// Per-influencer, per-platform analysis.
pub type PlatformAnalysisMap = BTreeMap<String, BTreeMap<String, PlatformAnalysis>>;

/// State threaded through the marketing workflow nodes.
#[derive(Debug, Clone, Default)]
pub struct MarketingState {
    pub product_info: ProductInfo,
    pub influencer_data: Vec<InfluencerInput>,
    pub product_tags: Option<ProductTags>,
    pub platform_analysis: PlatformAnalysisMap,
    pub influencer_profiles: BTreeMap<String, InfluencerProfile>,
    pub match_results: Vec<MatchResult>,
    pub selected_influencers: Vec<MatchResult>,
    pub generated_emails: Vec<GeneratedEmail>,
    /// Errors collected by the nodes, in execution order.
    pub errors: Vec<String>,
    /// Minimum score in percent.
    pub match_threshold: f64,
}

impl MarketingState {
    /// New state for the given inputs.
    pub fn new(
        product_info: ProductInfo,
        influencer_data: Vec<InfluencerInput>,
        match_threshold: f64,
    ) -> Self {
        Self {
            product_info,
            influencer_data,
            match_threshold,
            ..Self::default()
        }
    }

    /// Display name for an influencer id.
    pub fn influencer_name(&self, influencer_id: &str) -> String {
        self.influencer_data
            .iter()
            .find(|inf| inf.influencer_id == influencer_id)
            .map(|inf| inf.influencer_name.clone())
            .or_else(|| {
                self.influencer_profiles
                    .get(influencer_id)
                    .map(|p| p.influencer_name.clone())
            })
            .unwrap_or_else(|| format!("Unknown ID: {influencer_id}"))
    }

    /// Product info merged with the generated tags, as sent to prompts.
    pub fn product_with_tags(&self) -> ProductInfo {
        let mut merged = self.product_info.clone();
        if let Some(tags) = &self.product_tags {
            if let Ok(Value::Object(tag_map)) = serde_json::to_value(tags) {
                merged.extend(tag_map);
            }
        }
        merged
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(format!("{n}%")),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
