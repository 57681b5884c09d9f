use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::{
    middleware::auth::AuthUser,
    models::profile::ProfileInput,
    services::store::strip_nulls,
    utils::{errors::AppError, logger::LOGGER, time::now_iso},
    AppState,
};

const PROFILES_COLLECTION: &str = "profiles";

pub async fn save_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(payload): Json<ProfileInput>,
) -> Result<Json<Value>, AppError> {
    LOGGER.log_request("POST", "/profiles", Some(&auth_user.user_id), 200);

    let now = now_iso();
    let document = payload.into_document(
        &auth_user.user_id,
        auth_user.is_recruiter(),
        now.clone(),
        now,
    );
    let completion_percentage = document.completion_percentage;

    let value = serde_json::to_value(&document)
        .map_err(|_| AppError::InternalServerError("Failed to serialize profile".to_string()))?;
    state
        .store
        .put(PROFILES_COLLECTION, &auth_user.user_id, &value)
        .await?;

    LOGGER.log_business_event(
        "profile_saved",
        Some(&auth_user.user_id),
        HashMap::from([(
            "completion_percentage".to_string(),
            json!(completion_percentage),
        )]),
    );

    Ok(Json(json!({
        "success": true,
        "message": "Profile saved successfully",
        "completionPercentage": completion_percentage,
    })))
}

/// Merge-updates the caller's profile. The patch is shallow, null entries are
/// dropped, and the merged result is re-normalized so completion numbers stay
/// consistent with what is stored.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(payload): Json<Value>,
) -> Result<Json<Value>, AppError> {
    LOGGER.log_request("PUT", "/profiles/:userId", Some(&auth_user.user_id), 200);

    if user_id != auth_user.user_id {
        return Err(AppError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    let patch = strip_nulls(&payload);
    let Value::Object(patch_fields) = patch else {
        return Err(AppError::BadRequest(
            "Profile data must be a JSON object".to_string(),
        ));
    };

    let existing = state
        .store
        .get(PROFILES_COLLECTION, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let mut merged = existing.data;
    if let Value::Object(fields) = &mut merged {
        for (key, value) in patch_fields {
            fields.insert(key, value);
        }
    }

    let input: ProfileInput = serde_json::from_value(merged.clone())
        .map_err(|_| AppError::BadRequest("Invalid profile data".to_string()))?;

    let now = now_iso();
    let completed_at = merged
        .get("completedAt")
        .and_then(Value::as_str)
        .unwrap_or(&now)
        .to_string();
    let document = input.into_document(&user_id, auth_user.is_recruiter(), completed_at, now);
    let completion_percentage = document.completion_percentage;

    let value = serde_json::to_value(&document)
        .map_err(|_| AppError::InternalServerError("Failed to serialize profile".to_string()))?;
    state.store.put(PROFILES_COLLECTION, &user_id, &value).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "completionPercentage": completion_percentage,
    })))
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    LOGGER.log_request("GET", "/profiles/:userId", Some(&auth_user.user_id), 200);

    let profile = state
        .store
        .get(PROFILES_COLLECTION, &user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "profile": profile.into_json(),
    })))
}
