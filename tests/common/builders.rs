use chrono::Utc;
use post_planner::models::generation::GenerationDetails;
use post_planner::models::{
    ContentIdea, GeneratePostRequest, GeneratePostResponse, GeneratedPost, PostStatus,
};
use serde_json::{json, Value};

pub fn idea(n: usize) -> ContentIdea {
    ContentIdea::new(
        format!("idea-{n}"),
        format!("Idea {n}"),
        format!("Why idea {n} matters to our audience"),
    )
}

pub fn ideas(count: usize) -> Vec<ContentIdea> {
    (0..count).map(idea).collect()
}

/// Post the service would write for `request`
pub fn generated_post(request: &GeneratePostRequest) -> GeneratedPost {
    let idea_id = request.idea.id.clone().unwrap_or_default();
    GeneratedPost {
        id: format!("{idea_id}-{}", request.platform),
        platform: request.platform.into(),
        content: format!("{} for {}", request.idea.title, request.platform),
        hashtags: vec!["#planning".to_string()],
        status: PostStatus::Draft,
        idea_source: request.idea.id.clone(),
        ai_generated: true,
        metadata: Value::Null,
        created_at: Utc::now(),
    }
}

pub fn post_response(request: &GeneratePostRequest) -> GeneratePostResponse {
    GeneratePostResponse {
        post: generated_post(request),
        generation: GenerationDetails::default(),
        quota: None,
        template_info: None,
    }
}

/// Body of a successful generate-ideas reply
pub fn ideas_body(count: usize) -> Value {
    let ideas: Vec<Value> = (0..count)
        .map(|n| {
            json!({
                "id": format!("idea-{n}"),
                "title": format!("Idea {n}"),
                "description": "A description",
                "targetPlatform": "linkedin",
                "estimatedEngagement": "high",
                "category": "tips",
                "suggestedHashtags": ["#tips"]
            })
        })
        .collect();

    json!({
        "ideas": ideas,
        "generationId": "gen-1",
        "tokensUsed": 1200,
        "durationMs": 850,
        "quotaUsed": 1,
        "quotaRemaining": 99
    })
}

pub fn quota_body() -> Value {
    json!({
        "ideas": { "used": 10, "remaining": 90, "limit": 100 },
        "posts": { "used": 500, "remaining": 0, "limit": 500 },
        "resetsAt": "2026-11-01T00:00:00Z"
    })
}
