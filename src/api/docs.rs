//! OpenAPI document and the Swagger UI / ReDoc pages.

use axum::response::Html;
use axum::Json;
use utoipa::OpenApi;

use super::handlers::{CrawlRequest, CrawlSubmitted, HealthData, VersionData};
use super::marketing::{
    InfluencerAnalysisData, InfluencerAnalysisRequest, IntentRequest, MarketingData,
    MarketingRequest, OutreachData, OutreachRequest, RecommendationData, RecommendationRequest,
};
use crate::crawl::{CrawlJob, JobResult, JobStatus, ProductDetails};
use crate::error::ErrorBody;
use crate::workflow::{
    GeneratedEmail, InfluencerInput, InfluencerProfile, IntentAnalysis, MatchResult,
    PlatformAnalysis, PlatformContent, ProductTags,
};

/// Path the schema is served from.
pub const OPENAPI_PATH: &str = "/api/openapi.json";

const SWAGGER_UI_VERSION: &str = "5.9.0";

/// OpenAPI document for the public endpoints.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Crossborder LLM API",
        description = "API service for cross-border e-commerce LLM workflows"
    ),
    paths(
        super::handlers::health,
        super::handlers::version,
        super::handlers::submit_crawl,
        super::handlers::get_crawl,
        super::marketing::analyze_product,
        super::marketing::analyze_influencers,
        super::marketing::recommend_influencers,
        super::marketing::create_outreach,
        super::marketing::analyze_intent,
        super::marketing::run_marketing
    ),
    components(schemas(
        ErrorBody,
        HealthData,
        VersionData,
        CrawlRequest,
        CrawlSubmitted,
        CrawlJob,
        JobStatus,
        JobResult,
        ProductDetails,
        PlatformContent,
        InfluencerInput,
        PlatformAnalysis,
        InfluencerProfile,
        ProductTags,
        MatchResult,
        GeneratedEmail,
        IntentAnalysis,
        InfluencerAnalysisRequest,
        InfluencerAnalysisData,
        RecommendationRequest,
        RecommendationData,
        OutreachRequest,
        OutreachData,
        IntentRequest,
        MarketingRequest,
        MarketingData
    )),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Product", description = "Product crawling and analysis"),
        (name = "Influencer", description = "Influencer profiling and matching"),
        (name = "Outreach", description = "Outreach emails and reply intent"),
        (name = "Marketing", description = "End-to-end influencer marketing workflow")
    )
)]
pub struct ApiDoc;

/// The OpenAPI document with the crate version filled in.
pub fn openapi() -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc
}

/// Serve the OpenAPI document.
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi())
}

/// Swagger UI page.
pub async fn swagger_ui() -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<link type="text/css" rel="stylesheet" href="https://cdn.jsdelivr.net/npm/swagger-ui-dist@{version}/swagger-ui.css">
<title>Crossborder LLM API - Documentation</title>
</head>
<body>
<div id="swagger-ui"></div>
<script src="https://cdn.jsdelivr.net/npm/swagger-ui-dist@{version}/swagger-ui-bundle.js"></script>
<script>
const ui = SwaggerUIBundle({{
    url: '{openapi}',
    dom_id: '#swagger-ui',
    layout: 'BaseLayout',
    deepLinking: true,
    showExtensions: true,
    showCommonExtensions: true,
    presets: [SwaggerUIBundle.presets.apis, SwaggerUIBundle.SwaggerUIStandalonePreset],
}})
</script>
</body>
</html>"#,
        version = SWAGGER_UI_VERSION,
        openapi = OPENAPI_PATH,
    ))
}

/// ReDoc page.
pub async fn redoc() -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<title>Crossborder LLM API - ReDoc</title>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1">
<style>body {{ margin: 0; padding: 0; }}</style>
</head>
<body>
<noscript>ReDoc requires Javascript to function. Please enable it to browse the documentation.</noscript>
<redoc spec-url="{openapi}"></redoc>
<script src="https://cdn.jsdelivr.net/npm/redoc@next/bundles/redoc.standalone.js"></script>
</body>
</html>"#,
        openapi = OPENAPI_PATH,
    ))
}
