use serde::{Deserialize, Serialize};

/// Platform an idea is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPlatform {
    Linkedin,
    Instagram,
    #[default]
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimatedEngagement {
    Low,
    #[default]
    Medium,
    High,
}

/// A content idea proposed by the generation service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentIdea {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub target_platform: TargetPlatform,
    #[serde(default)]
    pub estimated_engagement: EstimatedEngagement,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub suggested_hashtags: Vec<String>,
}

impl ContentIdea {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: description.into(),
            target_platform: TargetPlatform::default(),
            estimated_engagement: EstimatedEngagement::default(),
            category: String::new(),
            suggested_hashtags: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// The subset of fields sent along with a post generation request
    pub fn to_ref(&self) -> IdeaRef {
        IdeaRef {
            id: Some(self.id.clone()),
            title: self.title.clone(),
            description: self.description.clone(),
            category: (!self.category.is_empty()).then(|| self.category.clone()),
        }
    }
}

/// Idea fields a post is generated from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdeaRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl IdeaRef {
    /// Title and description must both carry text
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_ref_drops_empty_category() {
        let idea = ContentIdea::new("idea-1", "Title", "Description");
        assert_eq!(idea.to_ref().category, None);

        let idea = idea.with_category("conseil");
        assert_eq!(idea.to_ref().category.as_deref(), Some("conseil"));
    }

    #[test]
    fn test_deserializes_service_payload() {
        let idea: ContentIdea = serde_json::from_value(serde_json::json!({
            "id": "a1",
            "title": "AI for SMEs",
            "description": "Three quick wins",
            "targetPlatform": "linkedin",
            "estimatedEngagement": "high",
            "category": "conseil",
            "suggestedHashtags": ["#ai"]
        }))
        .unwrap();

        assert_eq!(idea.target_platform, TargetPlatform::Linkedin);
        assert_eq!(idea.estimated_engagement, EstimatedEngagement::High);
        assert_eq!(idea.suggested_hashtags, vec!["#ai".to_string()]);
    }

    #[test]
    fn test_incomplete_ref() {
        let idea = ContentIdea::new("x", "  ", "desc");
        assert!(!idea.to_ref().is_complete());
    }
}
