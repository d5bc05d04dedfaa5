//! Prompt templates for every workflow step.
//!
//! Templates use `{name}` placeholders. Only the names passed to
//! [`render`] are substituted, so literal braces in the JSON examples are
//! left untouched.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use strum::{Display, EnumIter};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("placeholder regex is valid"));

/// The prompts used by the workflow nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum PromptKind {
    /// Per-platform content analysis of one influencer.
    SocialMediaAnalyst,
    /// Product tagging.
    ProductMetadata,
    /// Cross-platform influencer profile.
    InfluencerAnalysis,
    /// Product/influencer matching.
    InfluencerMatch,
    /// Collaboration outreach email.
    CollabEmail,
    /// Reply intent classification.
    EmailIntent,
}

impl PromptKind {
    /// Raw template text.
    pub fn template(&self) -> &'static str {
        match self {
            PromptKind::SocialMediaAnalyst => SOCIAL_MEDIA_ANALYST,
            PromptKind::ProductMetadata => PRODUCT_METADATA,
            PromptKind::InfluencerAnalysis => INFLUENCER_ANALYSIS,
            PromptKind::InfluencerMatch => INFLUENCER_MATCH,
            PromptKind::CollabEmail => COLLAB_EMAIL,
            PromptKind::EmailIntent => EMAIL_INTENT,
        }
    }

    /// First line of the template. Unique per prompt.
    pub fn marker(&self) -> &'static str {
        self.template().lines().next().unwrap_or_default()
    }

    /// Placeholder names the template expects.
    pub fn variables(&self) -> &'static [&'static str] {
        match self {
            PromptKind::SocialMediaAnalyst => &["influencerName", "platform", "content_list_json"],
            PromptKind::ProductMetadata => &["product_data_json"],
            PromptKind::InfluencerAnalysis => {
                &["influencerId", "influencerName", "platform_details_list_json"]
            }
            PromptKind::InfluencerMatch => &["product_info", "influencers_to_match"],
            PromptKind::CollabEmail => &["product_info", "influencer_profile"],
            PromptKind::EmailIntent => &["email_subject", "email_body"],
        }
    }

    /// Render this prompt with the given variables.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        render(self.template(), vars)
    }
}

/// Substitute `{name}` placeholders in a single pass.
///
/// Substituted values are never rescanned, and unknown names stay as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            vars.iter()
                .find(|(var, _)| *var == name)
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

const SOCIAL_MEDIA_ANALYST: &str = r#"You are a senior social media analyst for cross-border e-commerce brands.
Analyse the recent content that influencer "{influencerName}" published on {platform}.

Content list (JSON):
{content_list_json}

Infer the audience and the creator's style from titles, categories, tags and engagement.
Answer with a single JSON object and nothing else, using exactly these keys:
{
  "audienceGender": "e.g. 60% female",
  "audienceAge": "e.g. 18-34",
  "regionCountry": "main audience region",
  "language": "content language",
  "contentFormat": ["short video", "review"],
  "recentContentSummary": "one or two sentences",
  "videoStyle": "style description",
  "contentTone": "tone description",
  "categoryDepth": "how specialised the content is",
  "promotionAbility": "assessment of promotional reach",
  "brandRepetitionRate": "how often brands recur",
  "contentScene": ["home", "outdoor"],
  "platform": "{platform}"
}"#;

const PRODUCT_METADATA: &str = r#"You are a product marketing strategist who writes concise tags for influencer campaigns.
Read the product data below and produce marketing tags.

Product data (JSON):
{product_data_json}

Answer with a single JSON object and nothing else:
{
  "FeatureTags": ["3-6 short tags describing key features"],
  "AudienceTags": ["3-6 short tags describing target buyers"],
  "UsageScenarioTags": ["3-6 short tags describing usage scenarios"]
}"#;

const INFLUENCER_ANALYSIS: &str = r#"You are an influencer marketing consultant building a cross-platform creator profile.
Influencer: {influencerName} (id: {influencerId})

Per-platform analysis (JSON list):
{platform_details_list_json}

Summarise the creator across all platforms. Answer with a single JSON object and nothing else:
{
  "coreContentDirection": ["main content themes"],
  "overallPersonaAndStyle": "persona and style",
  "mainAudience": "main audience portrait",
  "commercialDegree": "degree of commercialisation",
  "crossPlatformConsist": "consistency of content across platforms",
  "potentialBrandType": ["brand categories that fit"],
  "influencerEval": "overall evaluation",
  "goodsCarryRating": "sales conversion rating: high / medium / low"
}"#;

const INFLUENCER_MATCH: &str = r#"You are a campaign planner matching influencers to a product.
Product (JSON, including generated tags):
{product_info}

Candidate influencer profiles (JSON list):
{influencers_to_match}

Score how well each influencer fits the product on a 0-100% scale, considering content direction,
audience overlap, persona and commercial ability. Answer with a JSON array and nothing else,
one element per influencer:
[
  {
    "influencerId": "id from the input",
    "influencerName": "name from the input",
    "match_score": "88%",
    "match_rationale": "one or two sentences"
  }
]"#;

const COLLAB_EMAIL: &str = r#"You are a brand partnerships manager writing a first-contact collaboration email.
Product (JSON, including generated tags):
{product_info}

Influencer profile (JSON):
{influencer_profile}

Write a short, personalised email in English that references the creator's content and explains
why the product suits their audience. Answer with a single JSON object and nothing else:
{
  "email_subject": "subject line",
  "email_body": "full email body"
}"#;

const EMAIL_INTENT: &str = r#"You are an assistant that triages influencer replies to collaboration emails.
Subject: {email_subject}
Body:
{email_body}

Classify the reply. Answer with a single JSON object and nothing else:
{
  "cooperation_intent": "interested | not_interested | needs_more_info | negotiating | unclear",
  "key_points": ["important points raised"],
  "suggested_next_step": "what the brand should do next",
  "sentiment": "positive | neutral | negative",
  "is_urgent": false,
  "notification_summary": "one sentence summary for the account manager"
}"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use strum::IntoEnumIterator;

    #[test]
    fn markers_are_unique() {
        let markers: HashSet<_> = PromptKind::iter().map(|k| k.marker()).collect();
        assert_eq!(markers.len(), PromptKind::iter().count());
    }

    #[test]
    fn every_variable_appears_in_its_template() {
        for kind in PromptKind::iter() {
            for var in kind.variables() {
                assert!(
                    kind.template().contains(&format!("{{{var}}}")),
                    "{kind} is missing {{{var}}}"
                );
            }
        }
    }

    #[test]
    fn render_leaves_literal_braces_alone() {
        let rendered = PromptKind::EmailIntent.render(&[
            ("email_subject", "Re: Collab"),
            ("email_body", "Sounds good"),
        ]);
        assert!(rendered.contains("Subject: Re: Collab"));
        assert!(rendered.contains("\"cooperation_intent\""));
        assert!(!rendered.contains("{email_body}"));
    }

    #[test]
    fn render_does_not_expand_placeholders_inside_values() {
        let rendered = PromptKind::EmailIntent.render(&[
            ("email_subject", "see {email_body}"),
            ("email_body", "SECRET"),
        ]);
        assert!(rendered.contains("Subject: see {email_body}"));
        assert_eq!(rendered.matches("SECRET").count(), 1);
    }

    #[test]
    fn render_keeps_unknown_placeholders() {
        assert_eq!(render("{a} and {b}", &[("a", "1")]), "1 and {b}");
    }
}
