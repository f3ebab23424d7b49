//! # Generation Parameters
//!
//! Closed variants for the platform, tone and length of a generated post, and
//! the request/response shapes exchanged with the generation service.
//!
//! Every variant maps totally onto its settings through a `match`, so adding a
//! platform or length without describing its behavior does not compile.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

use crate::models::idea::{ContentIdea, IdeaRef};
use crate::models::post::GeneratedPost;

/// Social network a post is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Linkedin,
    Instagram,
}

/// Voice of a generated post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Professional,
    Casual,
    Inspirational,
}

/// Target length of a generated post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Length {
    Short,
    #[default]
    Medium,
    Long,
}

/// Per-platform publishing constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSettings {
    /// Accepted character count
    pub characters: RangeInclusive<usize>,
    /// Ideal word count
    pub ideal_words: RangeInclusive<usize>,
    /// Recommended number of hashtags
    pub hashtags: RangeInclusive<usize>,
    pub tone_hint: &'static str,
    pub structure_hint: &'static str,
}

/// Word-count target for a platform/length pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthSpec {
    pub words: RangeInclusive<usize>,
    pub description: &'static str,
}

impl PlatformSettings {
    /// Ways `post` falls outside these constraints; empty when it fits
    pub fn deviations(&self, post: &GeneratedPost) -> Vec<String> {
        let mut deviations = Vec::new();

        let characters = post.content.chars().count();
        if !self.characters.contains(&characters) {
            deviations.push(format!(
                "{characters} characters, expected {}-{}",
                self.characters.start(),
                self.characters.end()
            ));
        }

        let hashtags = post.hashtags.len();
        if !self.hashtags.contains(&hashtags) {
            deviations.push(format!(
                "{hashtags} hashtags, expected {}-{}",
                self.hashtags.start(),
                self.hashtags.end()
            ));
        }

        deviations
    }
}

impl Platform {
    pub fn settings(&self) -> PlatformSettings {
        match self {
            Self::Linkedin => PlatformSettings {
                characters: 150..=3000,
                ideal_words: 200..=400,
                hashtags: 3..=5,
                tone_hint: "Professional, expert, inspiring",
                structure_hint: "Strong hook, valuable content, clear call to action",
            },
            Self::Instagram => PlatformSettings {
                characters: 80..=2200,
                ideal_words: 100..=200,
                hashtags: 5..=15,
                tone_hint: "Light, engaging, with emojis",
                structure_hint: "Visual hook, concise content, relevant hashtags",
            },
        }
    }

    /// Tone used when a request does not name one
    pub fn default_tone(&self) -> Tone {
        match self {
            Self::Linkedin => Tone::Professional,
            Self::Instagram => Tone::Casual,
        }
    }

    pub fn length_spec(&self, length: Length) -> LengthSpec {
        match (self, length) {
            (Self::Linkedin, Length::Short) => LengthSpec {
                words: 100..=200,
                description: "Short and punchy",
            },
            (Self::Linkedin, Length::Medium) => LengthSpec {
                words: 200..=350,
                description: "Standard and engaging",
            },
            (Self::Linkedin, Length::Long) => LengthSpec {
                words: 350..=500,
                description: "In-depth and detailed",
            },
            (Self::Instagram, Length::Short) => LengthSpec {
                words: 50..=100,
                description: "Short and punchy",
            },
            (Self::Instagram, Length::Medium) => LengthSpec {
                words: 100..=180,
                description: "Balanced",
            },
            (Self::Instagram, Length::Long) => LengthSpec {
                words: 180..=280,
                description: "Full storytelling",
            },
        }
    }

    /// Generation-log category the service files this platform under
    pub fn generation_type(&self) -> &'static str {
        match self {
            Self::Linkedin => "post_linkedin",
            Self::Instagram => "post_instagram",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linkedin => "linkedin",
            Self::Instagram => "instagram",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Tone {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Professional => "Expert and factual, data points, business insights",
            Self::Casual => "Conversational and accessible, personal storytelling, open questions",
            Self::Inspirational => "Motivating and visionary, strong call to action, lessons learned",
        }
    }
}

/// Kind of rewrite requested for an existing post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationKind {
    Shorter,
    Longer,
    MoreCasual,
    MoreProfessional,
    WithCta,
    WithQuestion,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateIdeasRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub themes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    pub id: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateIdeasResponse {
    pub ideas: Vec<ContentIdea>,
    pub generation_id: String,
    pub tokens_used: u64,
    pub duration_ms: u64,
    pub quota_used: u32,
    pub quota_remaining: u32,
    #[serde(default)]
    pub template_info: Option<TemplateInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratePostRequest {
    pub idea: IdeaRef,
    pub platform: Platform,
    pub tone: Tone,
    pub length: Length,
}

impl GeneratePostRequest {
    /// Request with the platform's default tone and medium length
    pub fn for_platform(idea: IdeaRef, platform: Platform) -> Self {
        Self {
            idea,
            platform,
            tone: platform.default_tone(),
            length: Length::default(),
        }
    }

    #[must_use]
    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    #[must_use]
    pub fn with_length(mut self, length: Length) -> Self {
        self.length = length;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationDetails {
    #[serde(default)]
    pub hook: Option<String>,
    #[serde(default)]
    pub call_to_action: Option<String>,
    #[serde(default)]
    pub word_count: Option<u32>,
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default)]
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub used: u32,
    pub remaining: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePostResponse {
    pub post: GeneratedPost,
    #[serde(default)]
    pub generation: GenerationDetails,
    #[serde(default)]
    pub quota: Option<QuotaUsage>,
    #[serde(default)]
    pub template_info: Option<TemplateInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVariantsRequest {
    pub post_id: String,
    pub variations: Vec<VariationKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostVariant {
    pub id: String,
    pub content: String,
    pub variation_type: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVariantsResponse {
    pub variants: Vec<PostVariant>,
    pub generation_id: String,
    pub tokens_used: u64,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tone_per_platform() {
        assert_eq!(Platform::Linkedin.default_tone(), Tone::Professional);
        assert_eq!(Platform::Instagram.default_tone(), Tone::Casual);
    }

    #[test]
    fn test_length_specs_grow_with_length() {
        for platform in [Platform::Linkedin, Platform::Instagram] {
            let short = platform.length_spec(Length::Short);
            let medium = platform.length_spec(Length::Medium);
            let long = platform.length_spec(Length::Long);
            assert!(short.words.end() <= medium.words.start());
            assert!(medium.words.end() <= long.words.start());
        }
    }

    fn post(platform: Platform, content: String, hashtags: usize) -> GeneratedPost {
        serde_json::from_value(serde_json::json!({
            "id": "post-1",
            "platform": platform.as_str(),
            "content": content,
            "hashtags": (0..hashtags).map(|i| format!("#tag{i}")).collect::<Vec<_>>(),
            "createdAt": "2026-10-01T09:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_platform_settings_flag_out_of_range_posts() {
        let linkedin = Platform::Linkedin.settings();
        assert!(linkedin
            .deviations(&post(Platform::Linkedin, "a".repeat(1200), 4))
            .is_empty());

        let deviations = linkedin.deviations(&post(Platform::Linkedin, "Too short".into(), 0));
        assert_eq!(
            deviations,
            vec![
                "9 characters, expected 150-3000".to_string(),
                "0 hashtags, expected 3-5".to_string()
            ]
        );

        // The same post fits Instagram's character range but not its hashtags
        let instagram = Platform::Instagram.settings();
        let deviations = instagram.deviations(&post(Platform::Instagram, "a".repeat(100), 4));
        assert_eq!(deviations, vec!["4 hashtags, expected 5-15".to_string()]);
        assert_eq!(instagram.ideal_words, 100..=200);
    }

    #[test]
    fn test_generation_type_and_tone_descriptions() {
        assert_eq!(Platform::Linkedin.generation_type(), "post_linkedin");
        assert_eq!(Platform::Instagram.generation_type(), "post_instagram");

        let tones = [Tone::Professional, Tone::Casual, Tone::Inspirational];
        for tone in tones {
            assert!(!tone.description().is_empty());
        }
        assert_ne!(Tone::Casual.description(), Tone::Professional.description());
    }

    #[test]
    fn test_request_serializes_with_snake_case_variants() {
        let request = GeneratePostRequest::for_platform(
            IdeaRef {
                id: None,
                title: "Title".to_string(),
                description: "Description".to_string(),
                category: None,
            },
            Platform::Instagram,
        )
        .with_length(Length::Short);

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["platform"], "instagram");
        assert_eq!(json["tone"], "casual");
        assert_eq!(json["length"], "short");
    }

    #[test]
    fn test_variation_kind_wire_names() {
        let json = serde_json::to_string(&VariationKind::MoreProfessional).unwrap();
        assert_eq!(json, "\"more_professional\"");
    }
}
