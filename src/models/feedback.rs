use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryScore {
    pub name: String,
    pub score: u32,
    pub comment: String,
}

/// Model output for a feedback report. Fields default so a partially valid
/// response still produces a usable report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FeedbackDraft {
    pub total_score: u32,
    pub category_scores: Vec<CategoryScore>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackDocument {
    pub interview_id: String,
    pub user_id: String,
    pub total_score: u32,
    pub category_scores: Vec<CategoryScore>,
    pub strengths: Vec<String>,
    pub areas_for_improvement: Vec<String>,
    pub final_assessment: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranscriptLine {
    pub role: String,
    pub content: String,
}

impl Default for TranscriptLine {
    fn default() -> Self {
        TranscriptLine {
            role: "user".to_string(),
            content: String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedbackRequest {
    #[validate(length(min = 1, message = "Interview ID is required"))]
    pub interview_id: String,
    #[validate(length(min = 1, message = "Transcript must not be empty"))]
    pub transcript: Vec<TranscriptLine>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveRatingRequest {
    #[validate(length(min = 1, message = "Interview ID is required"))]
    pub interview_id: String,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: u32,
}
