//! Workflow endpoints: product tagging, influencer profiling and matching,
//! outreach emails and reply intent.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use super::handlers::AppState;
use super::response::{ApiJson, ResponseModel};
use crate::error::{ApiError, ErrorBody};
use crate::workflow::{
    GeneratedEmail, InfluencerInput, InfluencerProfile, IntentAnalysis, MarketingState,
    MatchResult, PlatformAnalysisMap, ProductInfo, ProductTags,
};

/// Profiling request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InfluencerAnalysisRequest {
    pub influencer_data: Vec<InfluencerInput>,
}

/// Profiling result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InfluencerAnalysisData {
    pub influencer_profiles: BTreeMap<String, InfluencerProfile>,
    /// Per-platform analysis keyed by influencer id, then platform.
    pub influencer_details: PlatformAnalysisMap,
    pub workflow_errors: Vec<String>,
}

/// Matching request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecommendationRequest {
    #[serde(default)]
    #[schema(value_type = Object)]
    pub product_info: ProductInfo,
    pub product_tags: ProductTags,
    /// Profiles keyed by influencer id.
    pub influencer_profiles_input: BTreeMap<String, InfluencerProfile>,
    /// Minimum score in percent (0-100).
    pub match_threshold: Option<f64>,
}

/// Matching result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecommendationData {
    pub match_results: Vec<MatchResult>,
    pub selected_influencers: Vec<MatchResult>,
    pub workflow_errors: Vec<String>,
}

/// Outreach email request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OutreachRequest {
    pub selected_influencers: Vec<MatchResult>,
    #[schema(value_type = Object)]
    pub product_info: ProductInfo,
    #[serde(default)]
    pub product_tags: Option<ProductTags>,
    /// Profiles keyed by influencer id.
    pub influencer_profiles: BTreeMap<String, InfluencerProfile>,
}

/// Outreach email result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OutreachData {
    pub generated_emails: Vec<GeneratedEmail>,
    pub workflow_errors: Vec<String>,
}

/// Reply intent request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct IntentRequest {
    #[serde(default)]
    pub email_subject: Option<String>,
    pub email_body: String,
}

/// Full workflow request.
#[derive(Debug, Deserialize, ToSchema)]
pub struct MarketingRequest {
    #[schema(value_type = Object)]
    pub product_info: ProductInfo,
    pub influencer_data: Vec<InfluencerInput>,
    /// Minimum score in percent (0-100).
    pub match_threshold: Option<f64>,
}

/// Full workflow result.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MarketingData {
    pub product_tags: Option<ProductTags>,
    pub influencer_profiles: BTreeMap<String, InfluencerProfile>,
    pub match_results: Vec<MatchResult>,
    pub selected_influencers: Vec<MatchResult>,
    pub generated_emails: Vec<GeneratedEmail>,
    pub workflow_errors: Vec<String>,
}

impl From<MarketingState> for MarketingData {
    fn from(state: MarketingState) -> Self {
        Self {
            product_tags: state.product_tags,
            influencer_profiles: state.influencer_profiles,
            match_results: state.match_results,
            selected_influencers: state.selected_influencers,
            generated_emails: state.generated_emails,
            workflow_errors: state.errors,
        }
    }
}

fn resolve_threshold(requested: Option<f64>, default: f64) -> Result<f64, ApiError> {
    match requested {
        None => Ok(default),
        Some(t) if (0.0..=100.0).contains(&t) => Ok(t),
        Some(t) => Err(ApiError::Validation(format!(
            "match_threshold must be between 0 and 100, got {t}"
        ))),
    }
}

/// Generate marketing tags for a product.
#[utoipa::path(
    post,
    path = "/api/products/analyze",
    tag = "Product",
    request_body(content = Object, description = "Product information; `product_title` is required"),
    responses(
        (status = 200, description = "Product tags", body = ResponseModel<ProductTags>),
        (status = 422, description = "Invalid body", body = ErrorBody),
        (status = 502, description = "The model produced no tags", body = ErrorBody),
        (status = 503, description = "LLM not configured", body = ErrorBody)
    )
)]
pub async fn analyze_product(
    State(state): State<AppState>,
    ApiJson(product): ApiJson<ProductInfo>,
) -> Result<Json<ResponseModel<ProductTags>>, ApiError> {
    if product.get("product_title").map_or(true, |v| v.is_null()) {
        return Err(ApiError::Validation("product_title is required".to_string()));
    }
    let workflow = state.workflow()?;

    let result = workflow.run_product_analysis(product).await;
    match result.product_tags {
        Some(tags) => Ok(Json(ResponseModel::ok("Product analysis completed.", tags))),
        None => {
            warn!(errors = ?result.errors, "Product analysis produced no tags");
            Err(ApiError::Upstream(format!(
                "Product analysis failed: {}",
                result.errors.join("; ")
            )))
        }
    }
}

/// Profile influencers from their platform content.
#[utoipa::path(
    post,
    path = "/api/influencers/analyze",
    tag = "Influencer",
    request_body = InfluencerAnalysisRequest,
    responses(
        (status = 200, description = "Influencer profiles", body = ResponseModel<InfluencerAnalysisData>),
        (status = 422, description = "Invalid body", body = ErrorBody),
        (status = 503, description = "LLM not configured", body = ErrorBody)
    )
)]
pub async fn analyze_influencers(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<InfluencerAnalysisRequest>,
) -> Result<Json<ResponseModel<InfluencerAnalysisData>>, ApiError> {
    let workflow = state.workflow()?;

    let result = workflow.run_influencer_analysis(request.influencer_data).await;
    info!(
        profiles = result.influencer_profiles.len(),
        errors = result.errors.len(),
        "Influencer analysis finished"
    );

    Ok(Json(ResponseModel::ok(
        "Influencer analysis completed.",
        InfluencerAnalysisData {
            influencer_profiles: result.influencer_profiles,
            influencer_details: result.platform_analysis,
            workflow_errors: result.errors,
        },
    )))
}

/// Match profiled influencers against a product and keep the best.
#[utoipa::path(
    post,
    path = "/api/influencers/recommend",
    tag = "Influencer",
    request_body = RecommendationRequest,
    responses(
        (status = 200, description = "Match results", body = ResponseModel<RecommendationData>),
        (status = 422, description = "Invalid body", body = ErrorBody),
        (status = 503, description = "LLM not configured", body = ErrorBody)
    )
)]
pub async fn recommend_influencers(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RecommendationRequest>,
) -> Result<Json<ResponseModel<RecommendationData>>, ApiError> {
    let threshold = resolve_threshold(request.match_threshold, state.match_threshold)?;
    let workflow = state.workflow()?;

    let result = workflow
        .run_recommendation(
            request.product_info,
            request.product_tags,
            request.influencer_profiles_input,
            threshold,
        )
        .await;

    Ok(Json(ResponseModel::ok(
        "Influencer recommendation completed.",
        RecommendationData {
            match_results: result.match_results,
            selected_influencers: result.selected_influencers,
            workflow_errors: result.errors,
        },
    )))
}

/// Write outreach emails for selected influencers.
#[utoipa::path(
    post,
    path = "/api/outreachs/create",
    tag = "Outreach",
    request_body = OutreachRequest,
    responses(
        (status = 200, description = "Generated emails", body = ResponseModel<OutreachData>),
        (status = 422, description = "Invalid body", body = ErrorBody),
        (status = 503, description = "LLM not configured", body = ErrorBody)
    )
)]
pub async fn create_outreach(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<OutreachRequest>,
) -> Result<Json<ResponseModel<OutreachData>>, ApiError> {
    let workflow = state.workflow()?;

    let result = workflow
        .run_email_creation(
            request.selected_influencers,
            request.product_info,
            request.product_tags,
            request.influencer_profiles,
        )
        .await;

    let errors = result.errors;
    let data = OutreachData {
        generated_emails: result.generated_emails,
        workflow_errors: errors.clone(),
    };

    if errors.is_empty() {
        Ok(Json(ResponseModel::ok("Email generation completed.", data)))
    } else {
        Ok(Json(ResponseModel::failed(
            "Email generation completed with some errors.",
            Some(data),
            errors,
        )))
    }
}

/// Classify an influencer's reply.
#[utoipa::path(
    post,
    path = "/api/outreachs/intent",
    tag = "Outreach",
    request_body = IntentRequest,
    responses(
        (status = 200, description = "Intent analysis; `success` is false when analysis failed", body = ResponseModel<IntentAnalysis>),
        (status = 422, description = "Invalid body", body = ErrorBody),
        (status = 503, description = "LLM not configured", body = ErrorBody)
    )
)]
pub async fn analyze_intent(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<IntentRequest>,
) -> Result<Json<ResponseModel<IntentAnalysis>>, ApiError> {
    let workflow = state.workflow()?;

    match workflow
        .analyze_intent(request.email_subject.as_deref(), &request.email_body)
        .await
    {
        Ok(analysis) => Ok(Json(ResponseModel::ok(
            "Email intent analysis completed.",
            analysis,
        ))),
        Err(error) => {
            warn!(error = %error, "Email intent analysis failed");
            Ok(Json(ResponseModel::failed(
                format!("Email intent analysis failed: {error}"),
                None,
                vec![error],
            )))
        }
    }
}

/// Run the full marketing workflow.
#[utoipa::path(
    post,
    path = "/api/marketing/run",
    tag = "Marketing",
    request_body = MarketingRequest,
    responses(
        (status = 200, description = "Workflow results", body = ResponseModel<MarketingData>),
        (status = 422, description = "Invalid body", body = ErrorBody),
        (status = 503, description = "LLM not configured", body = ErrorBody)
    )
)]
pub async fn run_marketing(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MarketingRequest>,
) -> Result<Json<ResponseModel<MarketingData>>, ApiError> {
    let threshold = resolve_threshold(request.match_threshold, state.match_threshold)?;
    let workflow = state.workflow()?;

    let initial = MarketingState::new(request.product_info, request.influencer_data, threshold);
    let result = workflow.run_marketing(initial).await;

    Ok(Json(ResponseModel::ok(
        "Marketing workflow completed.",
        MarketingData::from(result),
    )))
}
