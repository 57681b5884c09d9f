use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

use crate::models::instance::{InterviewInstance, ProfileSnapshot, Status, TakeInterviewRequest};
use crate::models::profile::ProfileInput;
use crate::models::structure::{Category, InterviewStructure};
use crate::services::generator::{GenerationError, TextGenerator};
use crate::services::parser::parse_question_object;
use crate::services::prompt::personalized_questions_prompt;
use crate::services::reconcile::reconcile_count;
use crate::services::store::{Document, DocumentStore, StoreError};
use crate::utils::logger::LOGGER;
use crate::utils::time::now_iso;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Structure ID and User ID are required")]
    MissingIdentifiers,
    #[error("interviews can only be generated for the authenticated user")]
    UserMismatch,
    #[error("Interview structure not found")]
    StructureNotFound,
    #[error("invalid interview structure data: {0}")]
    InvalidStructure(String),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TakeInterviewResponse {
    pub success: bool,
    pub interview_id: String,
    pub pre_generated_questions: Vec<String>,
    pub personalized_questions: Vec<String>,
    pub duplicate: bool,
    pub message: String,
    pub request_id: String,
}

fn question_list(data: &Value, field: &str) -> Vec<String> {
    data.get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn duplicate_response(existing: Document, request_id: &str) -> TakeInterviewResponse {
    TakeInterviewResponse {
        success: true,
        interview_id: existing.id,
        pre_generated_questions: question_list(&existing.data, "preGeneratedQuestions"),
        personalized_questions: question_list(&existing.data, "personalizedQuestions"),
        duplicate: true,
        message: "Interview already exists for this structure".to_string(),
        request_id: request_id.to_string(),
    }
}

/// Drives interview generation end to end: structure lookup, profile fetch,
/// question generation, count reconciliation and the conditional insert that
/// keeps one interview per user and structure.
pub struct GenerationService {
    store: Arc<dyn DocumentStore>,
    generator: Arc<dyn TextGenerator>,
}

impl GenerationService {
    pub fn new(store: Arc<dyn DocumentStore>, generator: Arc<dyn TextGenerator>) -> Self {
        GenerationService { store, generator }
    }

    async fn fetch_profile(&self, user_id: &str) -> Option<ProfileInput> {
        match self.store.get("profiles", user_id).await {
            Ok(Some(doc)) => match serde_json::from_value::<ProfileInput>(doc.data) {
                Ok(profile) => Some(profile),
                Err(error) => {
                    LOGGER.log_error(
                        &format!("Stored profile failed to deserialize: {}", error),
                        HashMap::from([("user_id".to_string(), json!(user_id))]),
                    );
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                LOGGER.log_error(
                    &format!("Error fetching user profile: {}", error),
                    HashMap::from([("user_id".to_string(), json!(user_id))]),
                );
                None
            }
        }
    }

    async fn resolve_structure(
        &self,
        structure_id: &str,
    ) -> Result<(InterviewStructure, Category), WorkflowError> {
        let mut category = Category::Mock;
        let mut doc = self
            .store
            .get(category.structure_collection(), structure_id)
            .await?;
        if doc.is_none() {
            category = Category::Job;
            doc = self
                .store
                .get(category.structure_collection(), structure_id)
                .await?;
        }
        let doc = doc.ok_or(WorkflowError::StructureNotFound)?;
        let structure = serde_json::from_value(doc.data)
            .map_err(|error| WorkflowError::InvalidStructure(error.to_string()))?;
        Ok((structure, category))
    }

    async fn generate_personalized(
        &self,
        structure: &InterviewStructure,
        category: Category,
        profile: Option<&ProfileInput>,
        resume: Option<&str>,
    ) -> Result<Vec<String>, GenerationError> {
        let expected = structure.personalized_questions as usize;
        if expected == 0 {
            return Ok(Vec::new());
        }

        let prompt = personalized_questions_prompt(structure, category, profile, resume);
        let started = Instant::now();
        let raw = self.generator.generate(&prompt).await?;
        let parsed = parse_question_object(&raw);
        LOGGER.log_generation(
            self.generator.model(),
            &prompt,
            started.elapsed().as_millis(),
            Some(parsed.len()),
        );
        reconcile_count(parsed, expected, structure)
    }

    pub async fn take_interview(
        &self,
        auth_user_id: &str,
        request: TakeInterviewRequest,
    ) -> Result<TakeInterviewResponse, WorkflowError> {
        let request_id = Uuid::new_v4().to_string();

        if request.structure_id.trim().is_empty() || request.user_id.trim().is_empty() {
            return Err(WorkflowError::MissingIdentifiers);
        }
        if request.user_id != auth_user_id {
            return Err(WorkflowError::UserMismatch);
        }

        let profile = if request.generate_personalized {
            self.fetch_profile(&request.user_id).await
        } else {
            None
        };

        let (structure, category) = self.resolve_structure(&request.structure_id).await?;
        let interviews = category.interview_collection();
        let filters = [
            ("structureId", json!(request.structure_id)),
            ("userId", json!(request.user_id)),
        ];

        // Cheap pre-check; the conditional insert below is what actually
        // guarantees uniqueness.
        match self.store.query(interviews, &filters, Some(1)).await {
            Ok(existing) => {
                if let Some(doc) = existing.into_iter().next() {
                    return Ok(duplicate_response(doc, &request_id));
                }
            }
            Err(error) => {
                LOGGER.log_error(
                    &format!("Duplicate check failed, proceeding with generation: {}", error),
                    HashMap::from([("request_id".to_string(), json!(request_id))]),
                );
            }
        }

        let personalized = self
            .generate_personalized(
                &structure,
                category,
                profile.as_ref(),
                request.resume.as_deref(),
            )
            .await?;

        let instance = InterviewInstance {
            structure_id: request.structure_id.clone(),
            user_id: request.user_id.clone(),
            pre_generated_questions: structure.questions.clone(),
            personalized_questions: personalized,
            user_profile: ProfileSnapshot::from_profile(&request.user_id, profile.as_ref()),
            role: structure.display_role().to_string(),
            level: structure.display_level().to_string(),
            interview_type: structure.display_type().to_string(),
            techstack: structure.techstack.clone(),
            created_at: now_iso(),
            status: Status::Ready,
            interview_category: category,
            finalized: true,
            request_id: request_id.clone(),
        };
        let doc = serde_json::to_value(&instance)
            .map_err(|error| StoreError::InvalidDocument(error.to_string()))?;

        let unique_key = format!("{}:{}", request.structure_id, request.user_id);
        let interview_id = match self.store.add_unique(interviews, &unique_key, &doc).await {
            Ok(id) => id,
            Err(error) => {
                // Lost a race or the write failed; if an interview now
                // exists, return it instead of the error.
                if let Ok(existing) = self.store.query(interviews, &filters, Some(1)).await {
                    if let Some(doc) = existing.into_iter().next() {
                        return Ok(duplicate_response(doc, &request_id));
                    }
                }
                return Err(error.into());
            }
        };

        let usage_patch = json!({
            "usageCount": structure.usage_count + 1,
            "lastUsed": now_iso(),
        });
        if let Err(error) = self
            .store
            .update(category.structure_collection(), &request.structure_id, &usage_patch)
            .await
        {
            LOGGER.log_error(
                &format!("Failed to update structure usage count: {}", error),
                HashMap::from([("structure_id".to_string(), json!(request.structure_id))]),
            );
        }

        LOGGER.log_business_event(
            "interview_generated",
            Some(&request.user_id),
            HashMap::from([
                ("interview_id".to_string(), json!(interview_id)),
                ("structure_id".to_string(), json!(request.structure_id)),
                ("category".to_string(), json!(category)),
                ("request_id".to_string(), json!(request_id)),
            ]),
        );

        Ok(TakeInterviewResponse {
            success: true,
            interview_id,
            pre_generated_questions: instance.pre_generated_questions,
            personalized_questions: instance.personalized_questions,
            duplicate: false,
            message: "Interview generated successfully".to_string(),
            request_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::generator::testing::FakeGenerator;
    use crate::services::store::MemoryStore;
    use tokio::sync::Barrier;

    fn seed_structure() -> Value {
        json!({
            "role": "Backend Engineer",
            "level": "mid",
            "type": "technical",
            "techstack": ["Rust", "Postgres"],
            "questions": ["Q1?", "Q2?", "Q3?"],
            "personalizedQuestions": 2,
            "compulsoryQuestions": 3,
            "userId": "author",
            "visibility": true,
            "usageCount": 0
        })
    }

    async fn seeded_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .put("mock_interview_structures", "s1", &seed_structure())
            .await
            .unwrap();
        store
    }

    fn request() -> TakeInterviewRequest {
        TakeInterviewRequest {
            structure_id: "s1".to_string(),
            user_id: "u1".to_string(),
            resume: None,
            generate_personalized: true,
        }
    }

    fn two_questions() -> &'static str {
        r#"{"questions": ["About your Rust work?", "About your Postgres work?"]}"#
    }

    fn has_null(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Array(items) => items.iter().any(has_null),
            Value::Object(map) => map.values().any(has_null),
            _ => false,
        }
    }

    #[tokio::test]
    async fn generates_and_persists_an_interview() {
        let store = seeded_store().await;
        store
            .put(
                "profiles",
                "u1",
                &json!({"currentRole": "Dev", "skills": ["Rust"]}),
            )
            .await
            .unwrap();
        let generator = Arc::new(FakeGenerator::new(vec![two_questions()]));
        let service = GenerationService::new(store.clone(), generator.clone());

        let response = service.take_interview("u1", request()).await.unwrap();
        assert!(response.success);
        assert!(!response.duplicate);
        assert_eq!(response.pre_generated_questions.len(), 3);
        assert_eq!(
            response.personalized_questions,
            vec!["About your Rust work?", "About your Postgres work?"]
        );

        let saved = store
            .get("mock_interviews", &response.interview_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(saved.data["structureId"], "s1");
        assert_eq!(saved.data["userId"], "u1");
        assert_eq!(saved.data["role"], "Backend Engineer");
        assert_eq!(saved.data["status"], "ready");
        assert_eq!(saved.data["finalized"], true);
        assert_eq!(saved.data["interviewCategory"], "mock");
        assert_eq!(saved.data["userProfile"]["currentRole"], "Dev");
        assert!(!has_null(&saved.data));

        // the profile made it into the prompt
        let prompts = generator.prompts();
        assert!(prompts[0].contains("- Current Role: Dev"));
    }

    #[tokio::test]
    async fn second_request_returns_the_existing_interview() {
        let store = seeded_store().await;
        let generator = Arc::new(FakeGenerator::new(vec![two_questions(), two_questions()]));
        let service = GenerationService::new(store.clone(), generator.clone());

        let first = service.take_interview("u1", request()).await.unwrap();
        let second = service.take_interview("u1", request()).await.unwrap();

        assert!(second.duplicate);
        assert_eq!(second.interview_id, first.interview_id);
        assert_eq!(second.message, "Interview already exists for this structure");
        assert_eq!(second.pre_generated_questions.len(), 3);
        assert_eq!(second.personalized_questions.len(), 2);
        // the duplicate path never calls the model
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn racing_requests_persist_a_single_interview() {
        let store = seeded_store().await;
        let barrier = Arc::new(Barrier::new(2));
        let generator = Arc::new(FakeGenerator::with_barrier(
            vec![two_questions(), two_questions()],
            barrier,
        ));
        let service = Arc::new(GenerationService::new(store.clone(), generator.clone()));

        let left = service.clone();
        let right = service.clone();
        let (a, b) = tokio::join!(
            left.take_interview("u1", request()),
            right.take_interview("u1", request()),
        );
        let a = a.unwrap();
        let b = b.unwrap();

        assert_eq!(a.interview_id, b.interview_id);
        assert!(a.duplicate != b.duplicate);

        let docs = store
            .query(
                "mock_interviews",
                &[("structureId", json!("s1")), ("userId", json!("u1"))],
                None,
            )
            .await
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn blank_identifiers_are_rejected() {
        let store = seeded_store().await;
        let generator = Arc::new(FakeGenerator::new(Vec::new()));
        let service = GenerationService::new(store, generator);

        let mut bad = request();
        bad.user_id = "  ".to_string();
        let error = service.take_interview("u1", bad).await.unwrap_err();
        assert!(matches!(error, WorkflowError::MissingIdentifiers));
        assert_eq!(error.to_string(), "Structure ID and User ID are required");
    }

    #[tokio::test]
    async fn requests_for_another_user_are_rejected() {
        let store = seeded_store().await;
        let generator = Arc::new(FakeGenerator::new(Vec::new()));
        let service = GenerationService::new(store, generator);

        let error = service.take_interview("someone-else", request()).await.unwrap_err();
        assert!(matches!(error, WorkflowError::UserMismatch));
    }

    #[tokio::test]
    async fn unknown_structure_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(FakeGenerator::new(Vec::new()));
        let service = GenerationService::new(store, generator);

        let error = service.take_interview("u1", request()).await.unwrap_err();
        assert!(matches!(error, WorkflowError::StructureNotFound));
    }

    #[tokio::test]
    async fn job_structures_resolve_to_job_collections() {
        let store = Arc::new(MemoryStore::new());
        let mut structure = seed_structure();
        structure["interviewCategory"] = json!("job");
        store
            .put("job_interview_structures", "s1", &structure)
            .await
            .unwrap();
        let generator = Arc::new(FakeGenerator::new(vec![two_questions()]));
        let service = GenerationService::new(store.clone(), generator);

        let response = service.take_interview("u1", request()).await.unwrap();
        let saved = store
            .get("job_interviews", &response.interview_id)
            .await
            .unwrap();
        assert!(saved.is_some());
    }

    #[tokio::test]
    async fn zero_personalized_questions_skip_the_model() {
        let store = Arc::new(MemoryStore::new());
        let mut structure = seed_structure();
        structure["personalizedQuestions"] = json!(0);
        store
            .put("mock_interview_structures", "s1", &structure)
            .await
            .unwrap();
        let generator = Arc::new(FakeGenerator::new(Vec::new()));
        let service = GenerationService::new(store.clone(), generator.clone());

        let response = service.take_interview("u1", request()).await.unwrap();
        assert!(response.personalized_questions.is_empty());
        assert_eq!(response.pre_generated_questions.len(), 3);
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn generation_failure_persists_nothing() {
        let store = seeded_store().await;
        let generator = Arc::new(FakeGenerator::failing());
        let service = GenerationService::new(store.clone(), generator);

        let error = service.take_interview("u1", request()).await.unwrap_err();
        assert!(matches!(error, WorkflowError::Generation(_)));

        let docs = store
            .query("mock_interviews", &[("userId", json!("u1"))], None)
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn short_model_output_is_padded_to_the_expected_count() {
        let store = seeded_store().await;
        let generator = Arc::new(FakeGenerator::new(vec![
            r#"{"questions": ["Only one question about Rust?"]}"#,
        ]));
        let service = GenerationService::new(store, generator);

        let response = service.take_interview("u1", request()).await.unwrap();
        assert_eq!(response.personalized_questions.len(), 2);
        assert_eq!(response.personalized_questions[0], "Only one question about Rust?");
        assert!(response.personalized_questions[1].contains("Rust"));
    }

    #[tokio::test]
    async fn prose_output_degrades_to_question_lines() {
        let store = seeded_store().await;
        let generator = Arc::new(FakeGenerator::new(vec![
            "Here are some questions for you.\n\n\
             1. Tell me about your most complex Rust service in production?\n\
             2. How would you tune a slow Postgres query under load?\n\n\
             Good luck!",
        ]));
        let service = GenerationService::new(store, generator);

        let response = service.take_interview("u1", request()).await.unwrap();
        assert_eq!(
            response.personalized_questions,
            vec![
                "Tell me about your most complex Rust service in production?",
                "How would you tune a slow Postgres query under load?",
            ]
        );
    }

    #[tokio::test]
    async fn successful_generation_bumps_the_usage_count() {
        let store = seeded_store().await;
        let generator = Arc::new(FakeGenerator::new(vec![two_questions()]));
        let service = GenerationService::new(store.clone(), generator);

        service.take_interview("u1", request()).await.unwrap();

        let structure = store
            .get("mock_interview_structures", "s1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(structure.data["usageCount"], 1);
        assert!(structure.data["lastUsed"].is_string());
    }

    #[tokio::test]
    async fn legacy_profile_shapes_are_normalized_into_the_snapshot() {
        let store = seeded_store().await;
        store
            .put(
                "profiles",
                "u1",
                &json!({
                    "skills": "Rust, SQL",
                    "education": "TU Berlin",
                    "socialLinks": {"linkedin": "", "github": "", "portfolio": "", "twitter": ""}
                }),
            )
            .await
            .unwrap();
        let generator = Arc::new(FakeGenerator::new(vec![two_questions()]));
        let service = GenerationService::new(store.clone(), generator);

        let response = service.take_interview("u1", request()).await.unwrap();
        let saved = store
            .get("mock_interviews", &response.interview_id)
            .await
            .unwrap()
            .unwrap();
        let snapshot = &saved.data["userProfile"];
        assert_eq!(snapshot["skills"], json!(["Rust", "SQL"]));
        assert_eq!(snapshot["education"][0]["institution"], "TU Berlin");
        assert_eq!(snapshot["id"], "u1");
        assert!(!has_null(&saved.data));
    }

    #[tokio::test]
    async fn profile_is_not_fetched_unless_requested() {
        let store = seeded_store().await;
        store
            .put("profiles", "u1", &json!({"currentRole": "Dev"}))
            .await
            .unwrap();
        let generator = Arc::new(FakeGenerator::new(vec![two_questions()]));
        let service = GenerationService::new(store.clone(), generator.clone());

        let mut plain = request();
        plain.generate_personalized = false;
        let response = service.take_interview("u1", plain).await.unwrap();

        let saved = store
            .get("mock_interviews", &response.interview_id)
            .await
            .unwrap()
            .unwrap();
        // snapshot stays empty and the prompt carries no profile data
        assert_eq!(saved.data["userProfile"]["currentRole"], "");
        assert!(!generator.prompts()[0].contains("USER PROFILE DATA"));
    }
}
