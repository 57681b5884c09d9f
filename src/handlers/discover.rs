use axum::{
    extract::{Extension, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    middleware::auth::AuthUser,
    services::store::{sort_newest_first, Document, DocumentStore, StoreError},
    utils::{errors::AppError, logger::LOGGER},
    AppState,
};

const DEFAULT_CATEGORY_LIMIT: usize = 20;

#[derive(Debug, Default, Deserialize)]
pub struct DiscoverParams {
    pub search: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub structure_type: Option<String>,
    pub level: Option<String>,
    pub limit: Option<usize>,
}

/// `all`, empty and missing all mean "no filter".
fn active_filter(param: &Option<String>) -> Option<String> {
    param
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty() && !value.eq_ignore_ascii_case("all"))
        .map(str::to_lowercase)
}

fn search_needle(param: &Option<String>) -> Option<String> {
    param
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_lowercase)
}

async fn public_structures(
    store: &dyn DocumentStore,
    collection: &str,
    params: &DiscoverParams,
) -> Result<Vec<Value>, StoreError> {
    let mut filters: Vec<(&str, Value)> = vec![("visibility", Value::Bool(true))];
    let type_filter = active_filter(&params.structure_type);
    if let Some(structure_type) = &type_filter {
        filters.push(("type", Value::String(structure_type.clone())));
    }
    let level_filter = active_filter(&params.level);
    if let Some(level) = &level_filter {
        filters.push(("level", Value::String(level.clone())));
    }

    let mut docs = store.query(collection, &filters, None).await?;

    if let Some(needle) = search_needle(&params.search) {
        docs.retain(|doc| {
            doc.data
                .get("role")
                .and_then(Value::as_str)
                .map(|role| role.to_lowercase().contains(&needle))
                .unwrap_or(false)
        });
    }

    sort_newest_first(&mut docs);
    docs.truncate(params.limit.unwrap_or(DEFAULT_CATEGORY_LIMIT));
    Ok(docs.into_iter().map(Document::into_json).collect())
}

/// Public catalog of visible structures from both categories, filtered by
/// role substring and exact type/level matches.
pub async fn discover_structures(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(params): Query<DiscoverParams>,
) -> Result<Json<Value>, AppError> {
    LOGGER.log_request("GET", "/discover", Some(&auth_user.user_id), 200);

    let category = active_filter(&params.category);
    let include_mock = category.as_deref() != Some("job");
    let include_job = category.as_deref() != Some("mock");

    let mock = if include_mock {
        public_structures(state.store.as_ref(), "mock_interview_structures", &params).await?
    } else {
        Vec::new()
    };
    let job = if include_job {
        public_structures(state.store.as_ref(), "job_interview_structures", &params).await?
    } else {
        Vec::new()
    };

    Ok(Json(json!({
        "success": true,
        "mockStructures": mock,
        "jobStructures": job,
        "counts": {
            "mock": mock.len(),
            "job": job.len(),
            "total": mock.len() + job.len(),
        },
    })))
}
