//! Pipelines composed from the workflow nodes.

use std::collections::BTreeMap;

use tracing::{info, instrument};

use super::nodes::{should_generate_emails, Workflow};
use super::state::{
    InfluencerInput, InfluencerProfile, MarketingState, MatchResult, ProductInfo, ProductTags,
};
use crate::metrics;

impl Workflow {
    /// Product tagging only.
    pub async fn run_product_analysis(&self, product_info: ProductInfo) -> MarketingState {
        metrics::inc_workflow_runs("product_analysis");
        let mut state = MarketingState::new(product_info, Vec::new(), 0.0);
        self.analyze_product(&mut state).await;
        state
    }

    /// Platform analysis followed by profile generation.
    pub async fn run_influencer_analysis(&self, influencers: Vec<InfluencerInput>) -> MarketingState {
        metrics::inc_workflow_runs("influencer_analysis");
        let mut state = MarketingState::new(ProductInfo::new(), influencers, 0.0);
        self.analyze_influencer_platforms(&mut state).await;
        self.generate_influencer_profiles(&mut state).await;
        state
    }

    /// Matching followed by threshold filtering, for caller-supplied profiles.
    pub async fn run_recommendation(
        &self,
        product_info: ProductInfo,
        product_tags: ProductTags,
        profiles: BTreeMap<String, InfluencerProfile>,
        match_threshold: f64,
    ) -> MarketingState {
        metrics::inc_workflow_runs("recommendation");
        let mut state = MarketingState::new(product_info, Vec::new(), match_threshold);
        state.product_tags = Some(product_tags);
        state.influencer_profiles = with_keyed_identity(profiles);
        self.match_influencers(&mut state).await;
        self.filter_matches(&mut state);
        state
    }

    /// Outreach emails for already selected influencers.
    pub async fn run_email_creation(
        &self,
        selected: Vec<MatchResult>,
        product_info: ProductInfo,
        product_tags: Option<ProductTags>,
        profiles: BTreeMap<String, InfluencerProfile>,
    ) -> MarketingState {
        metrics::inc_workflow_runs("email_creation");
        let mut state = MarketingState::new(product_info, Vec::new(), 0.0);
        state.product_tags = product_tags;
        state.influencer_profiles = with_keyed_identity(profiles);
        state.selected_influencers = selected;
        self.generate_emails(&mut state).await;
        state
    }

    /// The full marketing workflow:
    /// product -> platforms -> profiles -> match -> filter -> [emails].
    #[instrument(skip_all, fields(influencers = state.influencer_data.len(), threshold = state.match_threshold))]
    pub async fn run_marketing(&self, mut state: MarketingState) -> MarketingState {
        metrics::inc_workflow_runs("marketing");

        self.analyze_product(&mut state).await;
        self.analyze_influencer_platforms(&mut state).await;
        self.generate_influencer_profiles(&mut state).await;
        self.match_influencers(&mut state).await;
        self.filter_matches(&mut state);

        if should_generate_emails(&state) {
            self.generate_emails(&mut state).await;
        } else {
            info!("No influencer met the threshold, skipping email generation");
        }

        info!(
            selected = state.selected_influencers.len(),
            emails = state.generated_emails.len(),
            errors = state.errors.len(),
            "Marketing workflow finished"
        );
        state
    }
}

/// Profiles are keyed by influencer id; fill a missing id from its key.
fn with_keyed_identity(
    profiles: BTreeMap<String, InfluencerProfile>,
) -> BTreeMap<String, InfluencerProfile> {
    profiles
        .into_iter()
        .map(|(id, mut profile)| {
            if profile.influencer_id.is_empty() {
                profile.influencer_id = id.clone();
            }
            (id, profile)
        })
        .collect()
}
