use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use tracing::{error, info, warn};

#[derive(Debug)]
pub struct StructuredLogger;

impl StructuredLogger {
    pub fn log_request(&self, method: &str, path: &str, user_id: Option<&str>, status: u16) {
        let log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "http_request",
            "method": method,
            "path": path,
            "user_id": user_id,
            "status_code": status,
            "service": "interview-prep-backend"
        });

        info!("{}", log_entry);
    }

    pub fn log_generation(
        &self,
        model: &str,
        prompt: &str,
        duration_ms: u128,
        question_count: Option<usize>,
    ) {
        let preview: String = prompt.chars().take(100).collect();
        let log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "model_generation",
            "model": model,
            "prompt_hash": format!("{:x}", md5::compute(prompt)),
            "prompt_preview": if prompt.chars().count() > 100 {
                format!("{}...", preview)
            } else {
                preview
            },
            "duration_ms": duration_ms,
            "question_count": question_count,
            "service": "interview-prep-backend"
        });

        if duration_ms > 10_000 {
            warn!("Slow generation detected: {}", log_entry);
        } else {
            info!("{}", log_entry);
        }
    }

    pub fn log_error(&self, error: &str, context: HashMap<String, serde_json::Value>) {
        let mut log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "error",
            "error_message": error,
            "service": "interview-prep-backend"
        });

        for (key, value) in context {
            log_entry[key] = value;
        }

        error!("{}", log_entry);
    }

    pub fn log_business_event(
        &self,
        event_name: &str,
        user_id: Option<&str>,
        metadata: HashMap<String, serde_json::Value>,
    ) {
        let mut log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "business_event",
            "event_name": event_name,
            "user_id": user_id,
            "service": "interview-prep-backend"
        });

        for (key, value) in metadata {
            log_entry[key] = value;
        }

        info!("{}", log_entry);
    }
}

pub static LOGGER: StructuredLogger = StructuredLogger;
