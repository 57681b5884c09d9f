use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::{
    middleware::auth::AuthUser,
    models::instance::TakeInterviewRequest,
    services::generation::{GenerationService, TakeInterviewResponse, WorkflowError},
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

pub async fn take_interview(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<TakeInterviewRequest>,
) -> Result<Json<TakeInterviewResponse>, AppError> {
    LOGGER.log_request("POST", "/interviews/generate", Some(&auth_user.user_id), 200);

    let service = GenerationService::new(state.store.clone(), state.generator.clone());
    match service.take_interview(&auth_user.user_id, payload).await {
        Ok(response) => Ok(Json(response)),
        Err(WorkflowError::MissingIdentifiers) => Err(AppError::BadRequest(
            "Structure ID and User ID are required".to_string(),
        )),
        Err(WorkflowError::UserMismatch) => Err(AppError::Forbidden(
            "Interviews can only be generated for your own account".to_string(),
        )),
        Err(WorkflowError::StructureNotFound) => Err(AppError::NotFound(
            "Interview structure not found".to_string(),
        )),
        Err(WorkflowError::InvalidStructure(detail)) => {
            let mut context = HashMap::new();
            context.insert("detail".to_string(), Value::String(detail));
            context.insert(
                "user_id".to_string(),
                Value::String(auth_user.user_id.clone()),
            );
            LOGGER.log_error("invalid interview structure document", context);
            Err(AppError::BadRequest(
                "Invalid interview structure data".to_string(),
            ))
        }
        Err(error) => {
            let mut context = HashMap::new();
            context.insert(
                "user_id".to_string(),
                Value::String(auth_user.user_id.clone()),
            );
            LOGGER.log_error(&error.to_string(), context);
            Err(AppError::InternalServerError(
                "Failed to generate personalized interview".to_string(),
            ))
        }
    }
}

/// Looks up a generated interview in both category collections. Private
/// interviews resolve only for their owner.
pub async fn get_interview(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    LOGGER.log_request("GET", "/interviews/:id", Some(&auth_user.user_id), 200);

    for collection in ["job_interviews", "mock_interviews"] {
        let Some(doc) = state.store.get(collection, &id).await? else {
            continue;
        };

        let visible = doc
            .data
            .get("visibility")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        let owner =
            doc.data.get("userId").and_then(Value::as_str) == Some(auth_user.user_id.as_str());
        if !visible && !owner {
            break;
        }

        return Ok(Json(json!({
            "success": true,
            "interview": doc.into_json(),
        })));
    }

    Err(AppError::NotFound("Interview not found".to_string()))
}
