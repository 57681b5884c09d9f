mod handlers;
mod middleware;
mod models;
mod services;
mod utils;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use std::env;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    handlers::{discover, feedback, interviews, profiles, structures},
    middleware::auth::auth_middleware,
    services::generator::{GeminiGenerator, TextGenerator, DEFAULT_GEMINI_MODEL},
    services::store::{DocumentStore, PgStore},
    utils::database::create_pool,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub generator: Arc<dyn TextGenerator>,
    pub jwt_secret: String,
}

pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/interviews/generate", post(interviews::take_interview))
        .route("/interviews/:id", get(interviews::get_interview))
        .route("/structures", post(structures::create_structure))
        .route("/structures", get(structures::list_structures))
        .route("/structures/questions", post(structures::draft_questions))
        .route("/structures/:id", get(structures::get_structure))
        .route("/discover", get(discover::discover_structures))
        .route("/profiles", post(profiles::save_profile))
        .route("/profiles/:user_id", get(profiles::get_profile))
        .route("/profiles/:user_id", put(profiles::update_profile))
        .route("/feedback", post(feedback::create_feedback))
        .route("/feedback/rating", post(feedback::save_rating))
        .route("/feedback/:interview_id", get(feedback::feedback_summary))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .merge(protected_routes)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "interview_prep_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    let gemini_api_key = env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set");
    let gemini_model =
        env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());

    let db = create_pool(&database_url).await?;

    sqlx::migrate!("./migrations").run(&db).await?;

    let mut generator = GeminiGenerator::new(gemini_api_key, gemini_model);
    if let Ok(base_url) = env::var("GEMINI_BASE_URL") {
        generator = generator.with_base_url(base_url);
    }

    let state = AppState {
        store: Arc::new(PgStore::new(db)),
        generator: Arc::new(generator),
        jwt_secret,
    };

    let cors_origin = env::var("CORS_ALLOWED_ORIGIN")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());

    let cors = if cors_origin == "*" {
        // Allow any origin for production flexibility
        CorsLayer::new()
            .allow_origin(axum::http::header::HeaderValue::from_static("*"))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
    } else {
        // Specific origin
        CorsLayer::new()
            .allow_origin(cors_origin.parse::<HeaderValue>()?)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([
                axum::http::header::CONTENT_TYPE,
                axum::http::header::AUTHORIZATION,
            ])
    };

    let app = build_router(state)
        .layer(cors)
        .layer(DefaultBodyLimit::max(
            env::var("MAX_REQUEST_BODY_MB")
                .unwrap_or_else(|_| "2".to_string())
                .parse::<usize>()
                .unwrap_or(2)
                * 1024
                * 1024,
        ));

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
    tracing::info!("Server running on http://0.0.0.0:8000");

    axum::serve(listener, app).await?;

    Ok(())
}
