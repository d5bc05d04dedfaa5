//! Workflow nodes.
//!
//! Each node reads what it needs from [`MarketingState`], writes its
//! outputs back, and appends to `state.errors` instead of failing. A
//! failing LLM call therefore only loses the item it was producing.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::state::{
    GeneratedEmail, InfluencerProfile, IntentAnalysis, MarketingState, MatchResult,
    PlatformAnalysis, PlatformContent, ProductInfo, ProductTags, ProfileDraft,
};
use crate::error::LlmError;
use crate::llm::{invoke_json, ChatModel, PromptKind};
use crate::utils::truncate_chars;

/// Runs workflow nodes against a chat model.
#[derive(Clone)]
pub struct Workflow {
    model: Arc<dyn ChatModel>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("model", &self.model.model_id())
            .finish()
    }
}

fn to_json_pretty<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, LlmError> {
    serde_json::to_string_pretty(value).map_err(|e| LlmError::OutputParse {
        reason: format!("failed to serialize prompt input: {e}"),
        preview: String::new(),
    })
}

impl Workflow {
    /// Create a workflow runner.
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Generate marketing tags for the product.
    #[instrument(skip_all)]
    pub async fn analyze_product(&self, state: &mut MarketingState) {
        if state.product_info.is_empty() {
            let msg = "Product analysis error: product_info is missing in state.".to_string();
            warn!("{msg}");
            state.product_tags = None;
            state.errors.push(msg);
            return;
        }

        let result = self.request_product_tags(state).await;

        match result {
            Ok(tags) if tags.is_empty() => {
                warn!("Product analysis returned no tags");
                state.product_tags = None;
                state
                    .errors
                    .push("Product analysis error: LLM returned no tags.".to_string());
            }
            Ok(tags) => {
                info!(
                    features = tags.feature_tags.len(),
                    audience = tags.audience_tags.len(),
                    scenarios = tags.usage_scenario_tags.len(),
                    "Product analysis successful"
                );
                state.product_tags = Some(tags);
            }
            Err(e) => {
                warn!(error = %e, "Product analysis failed");
                state.product_tags = None;
                state
                    .errors
                    .push(format!("Product analysis LLM/parsing exception: {e}."));
            }
        }
    }

    /// Analyse every influencer's content per platform.
    ///
    /// Every influencer gets an entry, possibly empty. Platforms without
    /// content are skipped.
    #[instrument(skip_all, fields(influencers = state.influencer_data.len()))]
    pub async fn analyze_influencer_platforms(&self, state: &mut MarketingState) {
        let mut all_results = BTreeMap::new();

        for influencer in &state.influencer_data {
            let mut per_platform = BTreeMap::new();

            for (platform, contents) in &influencer.platforms {
                if contents.is_empty() {
                    debug!(
                        influencer = %influencer.influencer_name,
                        platform = %platform,
                        "Skipping platform without content"
                    );
                    continue;
                }

                let result = self
                    .request_platform_analysis(&influencer.influencer_name, platform, contents)
                    .await;

                match result {
                    Ok(mut analysis) => {
                        if analysis.platform.is_empty() {
                            analysis.platform = platform.clone();
                        }
                        debug!(influencer = %influencer.influencer_name, platform = %platform, "Platform analysed");
                        per_platform.insert(platform.clone(), analysis);
                    }
                    Err(e) => {
                        warn!(influencer = %influencer.influencer_name, platform = %platform, error = %e, "Platform analysis failed");
                        state.errors.push(format!(
                            "Platform analysis error for {} - {}: {}",
                            influencer.influencer_name, platform, e
                        ));
                    }
                }
            }

            all_results.insert(influencer.influencer_id.clone(), per_platform);
        }

        info!(influencers = all_results.len(), "Platform analysis complete");
        state.platform_analysis = all_results;
    }

    /// Build one cross-platform profile per analysed influencer.
    #[instrument(skip_all)]
    pub async fn generate_influencer_profiles(&self, state: &mut MarketingState) {
        let mut profiles = BTreeMap::new();

        if state.platform_analysis.is_empty() {
            state
                .errors
                .push("Cannot generate profiles: No platform analysis data available.".to_string());
            state.influencer_profiles = profiles;
            return;
        }

        let order: Vec<String> = ordered_ids(state);
        for influencer_id in order {
            let Some(details) = state.platform_analysis.get(&influencer_id) else {
                continue;
            };
            let name = state.influencer_name(&influencer_id);

            if details.is_empty() {
                debug!(influencer = %name, "Skipping profile: no platform analysis");
                state
                    .errors
                    .push(format!("No platform data to generate profile for {name}."));
                continue;
            }

            let details_list: Vec<&PlatformAnalysis> = details.values().collect();
            let result = self
                .request_profile(&influencer_id, &name, &details_list)
                .await;

            match result {
                Ok(draft) => {
                    debug!(influencer = %name, "Profile generated");
                    profiles.insert(influencer_id.clone(), draft.into_profile(&influencer_id, &name));
                }
                Err(e) => {
                    warn!(influencer = %name, error = %e, "Profile generation failed");
                    state
                        .errors
                        .push(format!("Profile generation error for {name}: {e}"));
                }
            }
        }

        info!(profiles = profiles.len(), "Influencer profiles generated");
        state.influencer_profiles = profiles;
    }

    /// Score every profiled influencer against the product.
    #[instrument(skip_all, fields(profiles = state.influencer_profiles.len()))]
    pub async fn match_influencers(&self, state: &mut MarketingState) {
        state.match_results.clear();

        if state.product_tags.is_none() {
            state.errors.push("Cannot match: Product tags missing.".to_string());
            return;
        }
        if state.influencer_profiles.is_empty() {
            state
                .errors
                .push("Cannot match: Influencer profiles missing.".to_string());
            return;
        }

        let profiles: Vec<&InfluencerProfile> = state.influencer_profiles.values().collect();
        let result = self
            .request_matches(&state.product_with_tags(), &profiles)
            .await;

        match result {
            Ok(Value::Array(items)) => {
                info!(results = items.len(), "Matching completed");
                for item in items {
                    match serde_json::from_value::<MatchResult>(item.clone()) {
                        Ok(result) => state.match_results.push(result),
                        Err(e) => {
                            warn!(error = %e, "Invalid match result from model");
                            state
                                .errors
                                .push(format!("Matcher returned an item with invalid format: {item}"));
                        }
                    }
                }
            }
            Ok(_) => {
                warn!("Matcher did not return a list");
                state.errors.push("Matcher did not return a valid list.".to_string());
            }
            Err(e) => {
                warn!(error = %e, "Matching failed");
                state.errors.push(format!("Matcher error: {e}"));
            }
        }
    }

    /// Keep the matches whose score reaches the threshold.
    pub fn filter_matches(&self, state: &mut MarketingState) {
        filter_matches(state);
    }

    /// Write an outreach email for every selected influencer.
    #[instrument(skip_all, fields(selected = state.selected_influencers.len()))]
    pub async fn generate_emails(&self, state: &mut MarketingState) {
        state.generated_emails.clear();

        if state.selected_influencers.is_empty() {
            debug!("No selected influencers to generate emails for");
            return;
        }

        let product_json = match to_json_pretty(&state.product_with_tags()) {
            Ok(json) => json,
            Err(e) => {
                state.errors.push(format!("Email generation error: {e}"));
                return;
            }
        };

        let selected = state.selected_influencers.clone();
        for selection in selected {
            let id = &selection.influencer_id;
            let name = &selection.influencer_name;

            let Some(profile) = state.influencer_profiles.get(id) else {
                warn!(influencer = %id, "Profile not found for selected influencer");
                state
                    .errors
                    .push(format!("Profile missing for selected influencer {name}."));
                continue;
            };

            let mut profile_for_prompt = profile.clone();
            profile_for_prompt.influencer_id = id.clone();
            profile_for_prompt.influencer_name = name.clone();

            let result = self.request_email(&product_json, &profile_for_prompt).await;

            match result {
                Ok(reply) => match (
                    reply.get("email_subject").and_then(Value::as_str),
                    reply.get("email_body").and_then(Value::as_str),
                ) {
                    (Some(subject), Some(body)) => {
                        debug!(influencer = %name, "Email generated");
                        state.generated_emails.push(GeneratedEmail {
                            influencer_id: id.clone(),
                            influencer_name: name.clone(),
                            email_subject: subject.to_string(),
                            email_body: body.to_string(),
                        });
                    }
                    _ => {
                        warn!(influencer = %name, "Email reply missing subject or body");
                        state
                            .errors
                            .push(format!("Email generation failed for {name}."));
                    }
                },
                Err(e) => {
                    warn!(influencer = %name, error = %e, "Email generation failed");
                    state
                        .errors
                        .push(format!("Email generation error for {name}: {e}"));
                }
            }
        }

        info!(emails = state.generated_emails.len(), "Outreach emails generated");
    }

    /// Classify an influencer's reply. Returns the error message on failure.
    #[instrument(skip_all)]
    pub async fn analyze_intent(
        &self,
        email_subject: Option<&str>,
        email_body: &str,
    ) -> Result<IntentAnalysis, String> {
        if email_body.trim().is_empty() {
            return Err("Email body is empty.".to_string());
        }

        let subject = email_subject.filter(|s| !s.is_empty()).unwrap_or("N/A");
        let reply = invoke_json::<Value>(
            self.model.as_ref(),
            PromptKind::EmailIntent,
            &[("email_subject", subject), ("email_body", email_body)],
        )
        .await
        .map_err(|e| format!("Intent analysis LLM chain exception: {e}"))?;

        if reply.get("cooperation_intent").is_none() {
            let msg = format!(
                "Intent analysis returned invalid or incomplete format. Got: {}",
                truncate_chars(&reply.to_string(), 200)
            );
            warn!("{msg}");
            return Err(msg);
        }

        serde_json::from_value(reply).map_err(|e| {
            format!("Intent analysis returned invalid or incomplete format: {e}")
        })
    }
}

// Single LLM calls used by the nodes.
impl Workflow {
    async fn request_product_tags(&self, state: &MarketingState) -> Result<ProductTags, LlmError> {
        let product_json = to_json_pretty(&state.product_info)?;
        invoke_json(
            self.model.as_ref(),
            PromptKind::ProductMetadata,
            &[("product_data_json", &product_json)],
        )
        .await
    }

    async fn request_platform_analysis(
        &self,
        influencer_name: &str,
        platform: &str,
        contents: &[PlatformContent],
    ) -> Result<PlatformAnalysis, LlmError> {
        let content_json = to_json_pretty(contents)?;
        invoke_json(
            self.model.as_ref(),
            PromptKind::SocialMediaAnalyst,
            &[
                ("influencerName", influencer_name),
                ("platform", platform),
                ("content_list_json", &content_json),
            ],
        )
        .await
    }

    async fn request_profile(
        &self,
        influencer_id: &str,
        influencer_name: &str,
        details: &[&PlatformAnalysis],
    ) -> Result<ProfileDraft, LlmError> {
        let details_json = to_json_pretty(details)?;
        invoke_json(
            self.model.as_ref(),
            PromptKind::InfluencerAnalysis,
            &[
                ("influencerId", influencer_id),
                ("influencerName", influencer_name),
                ("platform_details_list_json", &details_json),
            ],
        )
        .await
    }

    async fn request_matches(
        &self,
        product: &ProductInfo,
        profiles: &[&InfluencerProfile],
    ) -> Result<Value, LlmError> {
        let product_json = to_json_pretty(product)?;
        let influencers_json = to_json_pretty(profiles)?;
        invoke_json(
            self.model.as_ref(),
            PromptKind::InfluencerMatch,
            &[
                ("product_info", &product_json),
                ("influencers_to_match", &influencers_json),
            ],
        )
        .await
    }

    async fn request_email(
        &self,
        product_json: &str,
        profile: &InfluencerProfile,
    ) -> Result<Value, LlmError> {
        let profile_json = to_json_pretty(profile)?;
        invoke_json(
            self.model.as_ref(),
            PromptKind::CollabEmail,
            &[
                ("product_info", product_json),
                ("influencer_profile", &profile_json),
            ],
        )
        .await
    }
}

/// Influencer ids in input order, followed by any analysed ids not in the
/// input.
fn ordered_ids(state: &MarketingState) -> Vec<String> {
    let mut ids: Vec<String> = state
        .influencer_data
        .iter()
        .map(|inf| inf.influencer_id.clone())
        .filter(|id| state.platform_analysis.contains_key(id))
        .collect();
    for id in state.platform_analysis.keys() {
        if !ids.contains(id) {
            ids.push(id.clone());
        }
    }
    ids
}

/// Keep the matches whose score (in percent) is at least the threshold.
/// Unparsable scores are reported and skipped.
pub fn filter_matches(state: &mut MarketingState) {
    let threshold = state.match_threshold;
    let mut selected = Vec::new();

    for result in &state.match_results {
        match result.score_percent() {
            Some(score) if score >= threshold => selected.push(result.clone()),
            Some(_) => {}
            None => {
                warn!(score = %result.match_score, "Could not parse match score");
                state.errors.push(format!(
                    "Invalid match score format for influencer {}: {}",
                    result.influencer_id, result.match_score
                ));
            }
        }
    }

    info!(selected = selected.len(), threshold, "Matches filtered");
    state.selected_influencers = selected;
}

/// Whether the workflow should continue to email generation.
pub fn should_generate_emails(state: &MarketingState) -> bool {
    !state.selected_influencers.is_empty()
}
