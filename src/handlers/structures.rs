use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use validator::Validate;

use crate::{
    middleware::auth::AuthUser,
    models::structure::{Category, CreateStructureRequest, DraftQuestionsRequest, StructureType},
    services::questions::{DraftQuestionsResponse, QuestionDraftService},
    services::store::{sort_newest_first, Document},
    utils::{errors::AppError, logger::LOGGER, time::now_iso},
    AppState,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStructureResponse {
    pub success: bool,
    pub structure_id: String,
    pub message: String,
}

fn split_techstack(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn structure_document(payload: &CreateStructureRequest, owner_id: &str) -> Value {
    let mut doc = json!({
        "role": payload.role,
        "level": payload.level,
        "type": payload.structure_type,
        "techstack": split_techstack(&payload.techstack),
        "questions": payload.questions,
        "userId": owner_id,
        "visibility": payload.visibility,
        "createdAt": now_iso(),
        "isTemplate": true,
        "compulsoryQuestions": payload.compulsory_questions,
        "personalizedQuestions": payload.personalized_questions,
        "personalizedQuestionPrompt": payload.personalized_question_prompt,
        "usageCount": 0,
        "interviewCategory": payload.interview_category,
    });

    let fields = doc.as_object_mut().unwrap();
    if let Some(categorized) = &payload.categorized_questions {
        fields.insert("categorizedQuestions".to_string(), json!(categorized));
    }
    if payload.structure_type == StructureType::Mixed {
        fields.insert(
            "technicalQuestions".to_string(),
            json!(payload.technical_questions.unwrap_or(0)),
        );
        fields.insert(
            "behavioralQuestions".to_string(),
            json!(payload.behavioral_questions.unwrap_or(0)),
        );
    }
    if payload.interview_category == Category::Job {
        for (field, value) in [
            ("jobTitle", &payload.job_title),
            ("responsibilities", &payload.responsibilities),
            ("ctc", &payload.ctc),
            ("location", &payload.location),
            ("designation", &payload.designation),
        ] {
            fields.insert(field.to_string(), json!(value.as_deref().unwrap_or_default()));
        }
    }

    doc
}

pub async fn create_structure(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateStructureRequest>,
) -> Result<Json<CreateStructureResponse>, AppError> {
    LOGGER.log_request("POST", "/structures", Some(&auth_user.user_id), 200);

    payload.validate()?;
    payload.check_counts().map_err(AppError::ValidationError)?;

    if payload.interview_category == Category::Job && !auth_user.is_recruiter() {
        return Err(AppError::Forbidden(
            "Only recruiters can create job interview structures".to_string(),
        ));
    }

    let document = structure_document(&payload, &auth_user.user_id);
    let collection = payload.interview_category.structure_collection();
    let structure_id = state.store.add(collection, &document).await?;

    let category_label = match payload.interview_category {
        Category::Job => "Job",
        Category::Mock => "Mock",
    };
    LOGGER.log_business_event(
        "structure_created",
        Some(&auth_user.user_id),
        HashMap::from([
            ("structure_id".to_string(), json!(structure_id)),
            ("category".to_string(), json!(payload.interview_category)),
        ]),
    );

    Ok(Json(CreateStructureResponse {
        success: true,
        structure_id,
        message: format!("{} interview structure created successfully!", category_label),
    }))
}

pub async fn draft_questions(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<DraftQuestionsRequest>,
) -> Result<Json<DraftQuestionsResponse>, AppError> {
    LOGGER.log_request(
        "POST",
        "/structures/questions",
        Some(&auth_user.user_id),
        200,
    );

    payload.validate()?;

    let service = QuestionDraftService::new(state.generator.clone());
    match service.draft(&payload).await {
        Ok(response) => Ok(Json(response)),
        Err(error) => {
            let mut context = HashMap::new();
            context.insert(
                "user_id".to_string(),
                Value::String(auth_user.user_id.clone()),
            );
            context.insert("role".to_string(), Value::String(payload.role.clone()));
            LOGGER.log_error(&error.to_string(), context);
            Err(AppError::InternalServerError(
                "Failed to generate questions".to_string(),
            ))
        }
    }
}

pub async fn get_structure(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    LOGGER.log_request("GET", "/structures/:id", Some(&auth_user.user_id), 200);

    for collection in ["mock_interview_structures", "job_interview_structures"] {
        if let Some(doc) = state.store.get(collection, &id).await? {
            return Ok(Json(json!({
                "success": true,
                "structure": doc.into_json(),
            })));
        }
    }

    Err(AppError::NotFound(
        "Interview structure not found".to_string(),
    ))
}

fn into_listing(mut docs: Vec<Document>) -> Vec<Value> {
    sort_newest_first(&mut docs);
    docs.into_iter().map(Document::into_json).collect()
}

/// The caller's own structures. Everyone owns mock structures; job
/// structures exist only for recruiter accounts.
pub async fn list_structures(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Value>, AppError> {
    LOGGER.log_request("GET", "/structures", Some(&auth_user.user_id), 200);

    let owner_filter = [("userId", Value::String(auth_user.user_id.clone()))];
    let mock = state
        .store
        .query("mock_interview_structures", &owner_filter, None)
        .await?;
    let job = if auth_user.is_recruiter() {
        state
            .store
            .query("job_interview_structures", &owner_filter, None)
            .await?
    } else {
        Vec::new()
    };

    Ok(Json(json!({
        "success": true,
        "mockStructures": into_listing(mock),
        "jobStructures": into_listing(job),
    })))
}
