use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use validator::Validate;

use crate::{
    middleware::auth::AuthUser,
    models::feedback::{CreateFeedbackRequest, SaveRatingRequest},
    services::feedback::{
        FeedbackError, FeedbackResponse, FeedbackService, FeedbackSummaryResponse,
    },
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

fn log_feedback_error(error: &FeedbackError, user_id: &str, interview_id: &str) {
    let mut context = HashMap::new();
    context.insert("user_id".to_string(), Value::String(user_id.to_string()));
    context.insert(
        "interview_id".to_string(),
        Value::String(interview_id.to_string()),
    );
    LOGGER.log_error(&error.to_string(), context);
}

pub async fn create_feedback(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<CreateFeedbackRequest>,
) -> Result<Json<FeedbackResponse>, AppError> {
    LOGGER.log_request("POST", "/feedback", Some(&auth_user.user_id), 200);

    payload.validate()?;

    let service = FeedbackService::new(state.store.clone(), state.generator.clone());
    match service.create_feedback(&auth_user.user_id, &payload).await {
        Ok(response) => Ok(Json(response)),
        Err(error) => {
            log_feedback_error(&error, &auth_user.user_id, &payload.interview_id);
            Err(AppError::InternalServerError(
                "Failed to save feedback".to_string(),
            ))
        }
    }
}

pub async fn save_rating(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<SaveRatingRequest>,
) -> Result<Json<Value>, AppError> {
    LOGGER.log_request("POST", "/feedback/rating", Some(&auth_user.user_id), 200);

    payload.validate()?;

    let service = FeedbackService::new(state.store.clone(), state.generator.clone());
    match service.save_rating(&auth_user.user_id, &payload).await {
        Ok(feedback_id) => Ok(Json(json!({
            "success": true,
            "feedbackId": feedback_id,
        }))),
        Err(FeedbackError::NotFound) => {
            Err(AppError::NotFound("Feedback not found".to_string()))
        }
        Err(error) => {
            log_feedback_error(&error, &auth_user.user_id, &payload.interview_id);
            Err(AppError::InternalServerError(
                "Failed to save rating".to_string(),
            ))
        }
    }
}

pub async fn feedback_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(interview_id): Path<String>,
) -> Result<Json<FeedbackSummaryResponse>, AppError> {
    LOGGER.log_request(
        "GET",
        "/feedback/:interviewId",
        Some(&auth_user.user_id),
        200,
    );

    let service = FeedbackService::new(state.store.clone(), state.generator.clone());
    match service.feedback_summary(&auth_user.user_id, &interview_id).await {
        Ok(response) => Ok(Json(response)),
        Err(error) => {
            log_feedback_error(&error, &auth_user.user_id, &interview_id);
            Err(AppError::InternalServerError(
                "Failed to fetch feedback".to_string(),
            ))
        }
    }
}
