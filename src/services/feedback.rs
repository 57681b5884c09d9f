use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::models::feedback::{
    CreateFeedbackRequest, FeedbackDocument, FeedbackDraft, SaveRatingRequest, TranscriptLine,
};
use crate::services::generator::{GenerationError, TextGenerator};
use crate::services::parser::extract_object_candidate;
use crate::services::prompt::feedback_prompt;
use crate::services::store::{Document, DocumentStore, StoreError};
use crate::utils::logger::LOGGER;
use crate::utils::time::now_iso;

const FEEDBACK_COLLECTION: &str = "feedback";

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("Feedback not found")]
    NotFound,
    #[error("feedback response could not be parsed")]
    UnparsableResponse,
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub success: bool,
    pub feedback_id: String,
    /// Set when an existing higher score was kept over this attempt's score.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSummaryResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Value>,
    pub average_rating: f64,
    pub rating_count: u32,
}

pub fn format_transcript(transcript: &[TranscriptLine]) -> String {
    transcript
        .iter()
        .map(|line| format!("- {}: {}\n", line.role, line.content))
        .collect()
}

/// Scores completed interviews from their transcript and keeps each user's
/// best report per interview.
pub struct FeedbackService {
    store: Arc<dyn DocumentStore>,
    generator: Arc<dyn TextGenerator>,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn DocumentStore>, generator: Arc<dyn TextGenerator>) -> Self {
        FeedbackService { store, generator }
    }

    async fn find_feedback(
        &self,
        interview_id: &str,
        user_id: &str,
    ) -> Result<Option<Document>, StoreError> {
        let filters = [
            ("interviewId", json!(interview_id)),
            ("userId", json!(user_id)),
        ];
        let mut existing = self
            .store
            .query(FEEDBACK_COLLECTION, &filters, Some(1))
            .await?;
        Ok(existing.pop())
    }

    async fn generate_draft(&self, transcript: &str) -> Result<FeedbackDraft, FeedbackError> {
        let prompt = feedback_prompt(transcript);
        let started = Instant::now();
        let raw = self.generator.generate(&prompt).await?;
        LOGGER.log_generation(
            self.generator.model(),
            &prompt,
            started.elapsed().as_millis(),
            None,
        );

        let candidate = extract_object_candidate(&raw).ok_or(FeedbackError::UnparsableResponse)?;
        let value: Value =
            serde_json::from_str(candidate).map_err(|_| FeedbackError::UnparsableResponse)?;
        serde_json::from_value(value).map_err(|_| FeedbackError::UnparsableResponse)
    }

    pub async fn create_feedback(
        &self,
        user_id: &str,
        request: &CreateFeedbackRequest,
    ) -> Result<FeedbackResponse, FeedbackError> {
        let transcript = format_transcript(&request.transcript);
        let draft = self.generate_draft(&transcript).await?;

        if let Some(existing) = self.find_feedback(&request.interview_id, user_id).await? {
            let existing_score = existing.data["totalScore"].as_u64().unwrap_or(0) as u32;
            if existing_score > draft.total_score {
                // keep the better report, tell the caller what this attempt scored
                return Ok(FeedbackResponse {
                    success: true,
                    feedback_id: existing.id,
                    score: Some(draft.total_score),
                });
            }

            let patch = json!({
                "totalScore": draft.total_score,
                "categoryScores": draft.category_scores,
                "strengths": draft.strengths,
                "areasForImprovement": draft.areas_for_improvement,
                "finalAssessment": draft.final_assessment,
                "createdAt": now_iso(),
            });
            self.store
                .update(FEEDBACK_COLLECTION, &existing.id, &patch)
                .await?;
            return Ok(FeedbackResponse {
                success: true,
                feedback_id: existing.id,
                score: None,
            });
        }

        let document = FeedbackDocument {
            interview_id: request.interview_id.clone(),
            user_id: user_id.to_string(),
            total_score: draft.total_score,
            category_scores: draft.category_scores,
            strengths: draft.strengths,
            areas_for_improvement: draft.areas_for_improvement,
            final_assessment: draft.final_assessment,
            created_at: now_iso(),
        };
        let doc = serde_json::to_value(&document)
            .map_err(|error| StoreError::InvalidDocument(error.to_string()))?;
        let feedback_id = self.store.add(FEEDBACK_COLLECTION, &doc).await?;

        LOGGER.log_business_event(
            "feedback_created",
            Some(user_id),
            std::collections::HashMap::from([
                ("interview_id".to_string(), json!(request.interview_id)),
                ("total_score".to_string(), json!(document.total_score)),
            ]),
        );

        Ok(FeedbackResponse {
            success: true,
            feedback_id,
            score: None,
        })
    }

    pub async fn save_rating(
        &self,
        user_id: &str,
        request: &SaveRatingRequest,
    ) -> Result<String, FeedbackError> {
        let existing = self
            .find_feedback(&request.interview_id, user_id)
            .await?
            .ok_or(FeedbackError::NotFound)?;
        self.store
            .update(
                FEEDBACK_COLLECTION,
                &existing.id,
                &json!({"userRating": request.rating}),
            )
            .await?;
        Ok(existing.id)
    }

    /// The caller's own report plus the rating average across every user's
    /// report for the interview.
    pub async fn feedback_summary(
        &self,
        user_id: &str,
        interview_id: &str,
    ) -> Result<FeedbackSummaryResponse, FeedbackError> {
        let own = self
            .find_feedback(interview_id, user_id)
            .await?
            .map(|doc| doc.into_json());

        let all = self
            .store
            .query(
                FEEDBACK_COLLECTION,
                &[("interviewId", json!(interview_id))],
                None,
            )
            .await?;

        let mut total = 0u64;
        let mut rating_count = 0u32;
        for doc in &all {
            if let Some(rating) = doc.data.get("userRating").and_then(Value::as_u64) {
                total += rating;
                rating_count += 1;
            }
        }
        let average_rating = if rating_count > 0 {
            total as f64 / rating_count as f64
        } else {
            0.0
        };

        Ok(FeedbackSummaryResponse {
            success: true,
            feedback: own,
            average_rating,
            rating_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::generator::testing::FakeGenerator;
    use crate::services::store::MemoryStore;

    fn full_report() -> &'static str {
        r#"```json
{
  "totalScore": 78,
  "categoryScores": [{"name": "Communication Skills", "score": 80, "comment": "Clear"}],
  "strengths": ["Clear answers"],
  "areasForImprovement": ["More depth"],
  "finalAssessment": "Solid performance."
}
```"#
    }

    fn request() -> CreateFeedbackRequest {
        CreateFeedbackRequest {
            interview_id: "i1".to_string(),
            transcript: vec![
                TranscriptLine {
                    role: "assistant".to_string(),
                    content: "Tell me about Rust.".to_string(),
                },
                TranscriptLine {
                    role: "user".to_string(),
                    content: "Ownership and borrowing.".to_string(),
                },
            ],
        }
    }

    #[test]
    fn transcript_lines_format_as_dashed_entries() {
        let formatted = format_transcript(&request().transcript);
        assert_eq!(
            formatted,
            "- assistant: Tell me about Rust.\n- user: Ownership and borrowing.\n"
        );
    }

    #[tokio::test]
    async fn creates_a_feedback_document() {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(FakeGenerator::new(vec![full_report()]));
        let service = FeedbackService::new(store.clone(), generator);

        let response = service.create_feedback("u1", &request()).await.unwrap();
        assert!(response.success);
        assert!(response.score.is_none());

        let saved = store
            .get(FEEDBACK_COLLECTION, &response.feedback_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.data["interviewId"], "i1");
        assert_eq!(saved.data["userId"], "u1");
        assert_eq!(saved.data["totalScore"], 78);
        assert_eq!(saved.data["finalAssessment"], "Solid performance.");
    }

    #[tokio::test]
    async fn partially_valid_reports_fall_back_to_defaults() {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(FakeGenerator::new(vec![r#"{"totalScore": 55}"#]));
        let service = FeedbackService::new(store.clone(), generator);

        let response = service.create_feedback("u1", &request()).await.unwrap();
        let saved = store
            .get(FEEDBACK_COLLECTION, &response.feedback_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.data["totalScore"], 55);
        assert_eq!(saved.data["strengths"], json!([]));
        assert_eq!(saved.data["finalAssessment"], "");
    }

    #[tokio::test]
    async fn output_without_an_object_is_unparsable() {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(FakeGenerator::new(vec!["the candidate did fine"]));
        let service = FeedbackService::new(store, generator);

        let error = service.create_feedback("u1", &request()).await.unwrap_err();
        assert!(matches!(error, FeedbackError::UnparsableResponse));
    }

    #[tokio::test]
    async fn a_higher_existing_score_is_kept() {
        let store = Arc::new(MemoryStore::new());
        let existing = json!({
            "interviewId": "i1",
            "userId": "u1",
            "totalScore": 90,
            "finalAssessment": "Excellent.",
            "createdAt": "2024-01-01T00:00:00.000Z"
        });
        store.put(FEEDBACK_COLLECTION, "f1", &existing).await.unwrap();
        let generator = Arc::new(FakeGenerator::new(vec![full_report()]));
        let service = FeedbackService::new(store.clone(), generator);

        let response = service.create_feedback("u1", &request()).await.unwrap();
        assert_eq!(response.feedback_id, "f1");
        assert_eq!(response.score, Some(78));

        let saved = store.get(FEEDBACK_COLLECTION, "f1").await.unwrap().unwrap();
        assert_eq!(saved.data["totalScore"], 90);
        assert_eq!(saved.data["finalAssessment"], "Excellent.");
    }

    #[tokio::test]
    async fn a_lower_existing_score_is_replaced() {
        let store = Arc::new(MemoryStore::new());
        let existing = json!({
            "interviewId": "i1",
            "userId": "u1",
            "totalScore": 40,
            "createdAt": "2024-01-01T00:00:00.000Z"
        });
        store.put(FEEDBACK_COLLECTION, "f1", &existing).await.unwrap();
        let generator = Arc::new(FakeGenerator::new(vec![full_report()]));
        let service = FeedbackService::new(store.clone(), generator);

        let response = service.create_feedback("u1", &request()).await.unwrap();
        assert_eq!(response.feedback_id, "f1");
        assert!(response.score.is_none());

        let saved = store.get(FEEDBACK_COLLECTION, "f1").await.unwrap().unwrap();
        assert_eq!(saved.data["totalScore"], 78);
        assert_ne!(saved.data["createdAt"], "2024-01-01T00:00:00.000Z");
    }

    #[tokio::test]
    async fn rating_requires_existing_feedback() {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(FakeGenerator::new(Vec::new()));
        let service = FeedbackService::new(store.clone(), generator);

        let rating = SaveRatingRequest {
            interview_id: "i1".to_string(),
            rating: 4,
        };
        let error = service.save_rating("u1", &rating).await.unwrap_err();
        assert!(matches!(error, FeedbackError::NotFound));

        store
            .put(
                FEEDBACK_COLLECTION,
                "f1",
                &json!({"interviewId": "i1", "userId": "u1", "totalScore": 70}),
            )
            .await
            .unwrap();
        let feedback_id = service.save_rating("u1", &rating).await.unwrap();
        assert_eq!(feedback_id, "f1");

        let saved = store.get(FEEDBACK_COLLECTION, "f1").await.unwrap().unwrap();
        assert_eq!(saved.data["userRating"], 4);
    }

    #[tokio::test]
    async fn summary_averages_only_rated_reports() {
        let store = Arc::new(MemoryStore::new());
        for (id, doc) in [
            ("f1", json!({"interviewId": "i1", "userId": "u1", "totalScore": 70, "userRating": 4})),
            ("f2", json!({"interviewId": "i1", "userId": "u2", "totalScore": 60, "userRating": 5})),
            ("f3", json!({"interviewId": "i1", "userId": "u3", "totalScore": 50})),
        ] {
            store.put(FEEDBACK_COLLECTION, id, &doc).await.unwrap();
        }
        let generator = Arc::new(FakeGenerator::new(Vec::new()));
        let service = FeedbackService::new(store, generator);

        let summary = service.feedback_summary("u1", "i1").await.unwrap();
        assert_eq!(summary.average_rating, 4.5);
        assert_eq!(summary.rating_count, 2);
        let own = summary.feedback.unwrap();
        assert_eq!(own["id"], "f1");
        assert_eq!(own["totalScore"], 70);

        let summary = service.feedback_summary("nobody", "i1").await.unwrap();
        assert!(summary.feedback.is_none());
    }
}
