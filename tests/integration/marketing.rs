//! Workflow endpoints against a scripted chat model.

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crossborder_llm::crawl::MockProductCrawler;
use crossborder_llm::llm::{MockChatModel, PromptKind};

use crate::{app, call};

const TAGS: &str = r#"{"FeatureTags":["Color accuracy"],"AudienceTags":["Photographers"],"UsageScenarioTags":["Home studio printing"]}"#;

const PLATFORM: &str = r#"```json
{"audienceGender":"mixed","audienceAge":"25-44","regionCountry":"US","language":"English",
 "contentFormat":["review"],"recentContentSummary":"Printer reviews","videoStyle":"Tutorial",
 "contentTone":"Calm","categoryDepth":"Deep","promotionAbility":"High","brandRepetitionRate":"Low",
 "contentScene":["Studio"],"platform":"youtube"}
```"#;

const PROFILE: &str = r#"{"coreContentDirection":["Photo printing"],"overallPersonaAndStyle":"Meticulous expert",
 "mainAudience":"Pro photographers","commercialDegree":"Medium","crossPlatformConsist":"High",
 "potentialBrandType":["Imaging"],"influencerEval":"Trusted","goodsCarryRating":"B"}"#;

fn product() -> Value {
    json!({
        "product_title": "Datacolor Spyder Print",
        "price": "$189.99",
        "features": "Printer calibration | Paper profiles"
    })
}

fn influencers() -> Value {
    json!([
        {
            "influencerId": "pro_01",
            "influencerName": "Pixel Perfect Prints",
            "platforms": {
                "youtube": [
                    {"content_title": "Spyder Print review", "like_count": 1850, "comment_count": 212}
                ]
            }
        },
        {
            "influencerId": "gamer_02",
            "influencerName": "LevelUp Lucy",
            "platforms": {
                "youtube": [
                    {"content_title": "Best gaming mice", "like_count": 900}
                ]
            }
        }
    ])
}

fn profile(id: &str, name: &str) -> Value {
    let mut value: Value = serde_json::from_str(PROFILE).unwrap();
    value["influencerId"] = json!(id);
    value["influencerName"] = json!(name);
    value
}

fn scripted() -> MockChatModel {
    MockChatModel::new()
        .on_prompt(PromptKind::ProductMetadata, TAGS)
        .on_prompt(PromptKind::SocialMediaAnalyst, PLATFORM)
        .on_prompt(PromptKind::InfluencerAnalysis, PROFILE)
        .on_prompt(
            PromptKind::InfluencerMatch,
            r#"[
              {"influencerId":"pro_01","influencerName":"Pixel Perfect Prints","match_score":"92%","match_rationale":"Printing niche"},
              {"influencerId":"gamer_02","influencerName":"LevelUp Lucy","match_score":"35%","match_rationale":"Gaming audience"}
            ]"#,
        )
        .on_prompt(
            PromptKind::CollabEmail,
            r#"{"email_subject":"Spyder Print x Pixel Perfect Prints","email_body":"Hi there, ..."}"#,
        )
        .on_prompt(
            PromptKind::EmailIntent,
            r#"{"cooperation_intent":"Interested","key_points":["Asks for rates"],"suggested_next_step":"Send rate card","sentiment":"Positive","is_urgent":false,"notification_summary":"Wants rates"}"#,
        )
}

#[tokio::test]
async fn product_analysis_returns_tags() {
    let app = app(Some(scripted()), MockProductCrawler::new());

    let (status, body) = call(&app, Method::POST, "/api/products/analyze", Some(product())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["AudienceTags"], json!(["Photographers"]));
    assert_eq!(body["data"]["UsageScenarioTags"], json!(["Home studio printing"]));
}

#[tokio::test]
async fn influencer_analysis_returns_profiles_and_details() {
    let app = app(Some(scripted()), MockProductCrawler::new());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/influencers/analyze",
        Some(json!({"influencer_data": influencers()})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], json!("Influencer analysis completed."));
    let data = &body["data"];
    assert_eq!(data["influencer_profiles"]["pro_01"]["influencerName"], json!("Pixel Perfect Prints"));
    assert_eq!(
        data["influencer_profiles"]["gamer_02"]["coreContentDirection"],
        json!(["Photo printing"])
    );
    assert_eq!(data["influencer_details"]["pro_01"]["youtube"]["audienceAge"], json!("25-44"));
    assert_eq!(data["workflow_errors"], json!([]));
}

#[tokio::test]
async fn influencer_analysis_requires_body_field() {
    let app = app(Some(scripted()), MockProductCrawler::new());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/influencers/analyze",
        Some(json!({"influencers": []})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["detail"].as_str().unwrap().contains("influencer_data"));
}

#[tokio::test]
async fn recommendation_applies_threshold() {
    let mock = scripted();
    let app = app(Some(mock.clone()), MockProductCrawler::new());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/influencers/recommend",
        Some(json!({
            "product_info": product(),
            "product_tags": serde_json::from_str::<Value>(TAGS).unwrap(),
            "influencer_profiles_input": {
                "pro_01": profile("pro_01", "Pixel Perfect Prints"),
                "gamer_02": profile("gamer_02", "LevelUp Lucy")
            },
            "match_threshold": 65.0
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    assert_eq!(data["match_results"].as_array().unwrap().len(), 2);
    assert_eq!(
        data["selected_influencers"],
        json!([{
            "influencerId": "pro_01",
            "influencerName": "Pixel Perfect Prints",
            "match_score": "92%",
            "match_rationale": "Printing niche"
        }])
    );
    assert_eq!(mock.calls_matching(PromptKind::InfluencerMatch.marker()), 1);
}

#[tokio::test]
async fn recommendation_rejects_out_of_range_threshold() {
    let app = app(Some(scripted()), MockProductCrawler::new());

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/influencers/recommend",
        Some(json!({
            "product_tags": serde_json::from_str::<Value>(TAGS).unwrap(),
            "influencer_profiles_input": {},
            "match_threshold": 150.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/influencers/recommend",
        Some(json!({"influencer_profiles_input": {}, "match_threshold": 70.0})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn outreach_reports_missing_profiles() {
    let app = app(Some(scripted()), MockProductCrawler::new());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/outreachs/create",
        Some(json!({
            "selected_influencers": [
                {"influencerId": "pro_01", "influencerName": "Pixel Perfect Prints", "match_score": "92%", "match_rationale": "Printing niche"},
                {"influencerId": "ghost_99", "influencerName": "Ghost", "match_score": "90%", "match_rationale": "?"}
            ],
            "product_info": product(),
            "influencer_profiles": {"pro_01": profile("pro_01", "Pixel Perfect Prints")}
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Email generation completed with some errors."));
    assert_eq!(body["errors"], json!(["Profile missing for selected influencer Ghost."]));
    let emails = body["data"]["generated_emails"].as_array().unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0]["influencerId"], json!("pro_01"));
    assert_eq!(emails[0]["email_subject"], json!("Spyder Print x Pixel Perfect Prints"));
}

#[tokio::test]
async fn intent_analysis_classifies_reply() {
    let app = app(Some(scripted()), MockProductCrawler::new());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/outreachs/intent",
        Some(json!({"email_subject": "Re: Collaboration", "email_body": "Sounds good, what are your rates?"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["cooperation_intent"], json!("Interested"));
    assert_eq!(body["data"]["key_points"], json!(["Asks for rates"]));
    assert_eq!(body["data"]["is_urgent"], json!(false));
}

#[tokio::test]
async fn marketing_run_produces_every_stage() {
    let mock = scripted();
    let app = app(Some(mock.clone()), MockProductCrawler::new());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/marketing/run",
        Some(json!({
            "product_info": product(),
            "influencer_data": influencers(),
            "match_threshold": 70
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let data = &body["data"];
    assert_eq!(data["product_tags"]["FeatureTags"], json!(["Color accuracy"]));
    assert_eq!(data["influencer_profiles"].as_object().unwrap().len(), 2);
    assert_eq!(data["match_results"].as_array().unwrap().len(), 2);
    assert_eq!(data["selected_influencers"].as_array().unwrap().len(), 1);
    assert_eq!(data["generated_emails"][0]["influencerName"], json!("Pixel Perfect Prints"));
    assert_eq!(data["workflow_errors"], json!([]));
    // product + 2 platforms + 2 profiles + match + 1 email
    assert_eq!(mock.call_count(), 7);
}

#[tokio::test]
async fn marketing_run_without_influencers_skips_matching() {
    let mock = scripted();
    let app = app(Some(mock.clone()), MockProductCrawler::new());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/marketing/run",
        Some(json!({"product_info": product(), "influencer_data": []})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    let data = &body["data"];
    assert_eq!(data["influencer_profiles"], json!({}));
    assert_eq!(data["match_results"], json!([]));
    assert_eq!(data["generated_emails"], json!([]));
    let errors: Vec<&str> = data["workflow_errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(errors.iter().any(|e| e.starts_with("Cannot match")));
    assert_eq!(mock.calls_matching(PromptKind::CollabEmail.marker()), 0);
}

#[tokio::test]
async fn workflow_endpoints_answer_503_without_model() {
    let app = app(None, MockProductCrawler::new());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/marketing/run",
        Some(json!({"product_info": product(), "influencer_data": []})),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["detail"], json!("llm backend is not configured"));
}
