use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

pub const MIN_TOTAL_QUESTIONS: u32 = 5;
pub const MAX_TOTAL_QUESTIONS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Entry,
    Mid,
    Senior,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Entry => "entry",
            Level::Mid => "mid",
            Level::Senior => "senior",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureType {
    Technical,
    Behavioral,
    Mixed,
}

/// Which catalog a structure lives in. Job postings carry employer details,
/// mock structures are practice templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Mock,
    Job,
}

impl Category {
    pub fn structure_collection(&self) -> &'static str {
        match self {
            Category::Mock => "mock_interview_structures",
            Category::Job => "job_interview_structures",
        }
    }

    pub fn interview_collection(&self) -> &'static str {
        match self {
            Category::Mock => "mock_interviews",
            Category::Job => "job_interviews",
        }
    }
}

/// Per-category breakdown of a mixed structure's compulsory questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorizedQuestions {
    pub behavioral: Vec<String>,
    pub technical: Vec<String>,
}

/// Tolerant read model for stored structures. Older documents miss fields, so
/// everything defaults and the display accessors patch in fallbacks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InterviewStructure {
    pub role: String,
    pub level: String,
    #[serde(rename = "type")]
    pub structure_type: String,
    pub techstack: Vec<String>,
    pub questions: Vec<String>,
    pub personalized_questions: u32,
    pub personalized_question_prompt: String,
    pub job_title: String,
    pub responsibilities: String,
    pub ctc: String,
    pub location: String,
    pub designation: String,
    pub user_id: String,
    pub visibility: bool,
    pub usage_count: u32,
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

impl InterviewStructure {
    pub fn display_role(&self) -> &str {
        non_empty_or(&self.role, "Interview")
    }

    pub fn display_level(&self) -> &str {
        non_empty_or(&self.level, "Entry")
    }

    pub fn display_type(&self) -> &str {
        non_empty_or(&self.structure_type, "Technical")
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStructureRequest {
    #[validate(length(min = 2, message = "Role must be at least 2 characters"))]
    pub role: String,
    pub level: Level,
    #[serde(rename = "type")]
    pub structure_type: StructureType,
    #[validate(length(min = 2, message = "Tech stack must be at least 2 characters"))]
    pub techstack: String,
    #[validate(length(min = 1, message = "At least one question is required"))]
    pub questions: Vec<String>,
    pub categorized_questions: Option<CategorizedQuestions>,
    pub compulsory_questions: u32,
    pub personalized_questions: u32,
    pub technical_questions: Option<u32>,
    pub behavioral_questions: Option<u32>,
    #[serde(default)]
    pub personalized_question_prompt: String,
    #[serde(default)]
    pub interview_category: Category,
    #[serde(default)]
    pub visibility: bool,
    pub job_title: Option<String>,
    pub responsibilities: Option<String>,
    pub ctc: Option<String>,
    pub location: Option<String>,
    pub designation: Option<String>,
}

fn missing(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

impl CreateStructureRequest {
    /// Count and cross-field rules the derive validator cannot express.
    pub fn check_counts(&self) -> Result<(), HashMap<String, Vec<String>>> {
        let mut errors: HashMap<String, Vec<String>> = HashMap::new();

        let total = self.compulsory_questions + self.personalized_questions;
        if !(MIN_TOTAL_QUESTIONS..=MAX_TOTAL_QUESTIONS).contains(&total) {
            errors.entry("compulsoryQuestions".to_string()).or_default().push(format!(
                "Total questions must be between {} and {}",
                MIN_TOTAL_QUESTIONS, MAX_TOTAL_QUESTIONS
            ));
        }

        if self.structure_type == StructureType::Mixed {
            let technical = self.technical_questions.unwrap_or(0);
            let behavioral = self.behavioral_questions.unwrap_or(0);
            if technical + behavioral != self.compulsory_questions {
                errors
                    .entry("technicalQuestions".to_string())
                    .or_default()
                    .push("Technical and behavioral counts must add up to the compulsory question count".to_string());
            }
        }

        if self.questions.len() as u32 != self.compulsory_questions {
            errors
                .entry("questions".to_string())
                .or_default()
                .push("Number of questions must match the compulsory question count".to_string());
        }

        if self.interview_category == Category::Job {
            for (field, value) in [
                ("jobTitle", &self.job_title),
                ("responsibilities", &self.responsibilities),
                ("ctc", &self.ctc),
                ("location", &self.location),
                ("designation", &self.designation),
            ] {
                if missing(value) {
                    errors
                        .entry(field.to_string())
                        .or_default()
                        .push("This field is required for job interviews".to_string());
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DraftQuestionsRequest {
    #[validate(length(min = 2, message = "Role must be at least 2 characters"))]
    pub role: String,
    pub level: Level,
    #[serde(rename = "type")]
    pub structure_type: StructureType,
    #[serde(default)]
    pub techstack: String,
    pub compulsory_questions: u32,
    #[serde(default)]
    pub personalized_questions: u32,
    pub technical_questions: Option<u32>,
    pub behavioral_questions: Option<u32>,
    #[serde(default)]
    pub interview_category: Category,
    pub job_title: Option<String>,
    pub responsibilities: Option<String>,
    pub ctc: Option<String>,
    pub location: Option<String>,
    pub designation: Option<String>,
    #[serde(default)]
    pub regenerate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn base_request() -> CreateStructureRequest {
        serde_json::from_value(json!({
            "role": "Backend Engineer",
            "level": "mid",
            "type": "technical",
            "techstack": "Rust, Postgres",
            "questions": ["Q1?", "Q2?", "Q3?"],
            "compulsoryQuestions": 3,
            "personalizedQuestions": 2
        }))
        .unwrap()
    }

    #[test]
    fn valid_request_passes() {
        assert!(base_request().check_counts().is_ok());
    }

    #[test]
    fn rejects_too_few_total_questions() {
        let mut request = base_request();
        request.personalized_questions = 1;
        let errors = request.check_counts().unwrap_err();
        assert!(errors.contains_key("compulsoryQuestions"));
    }

    #[test]
    fn rejects_too_many_total_questions() {
        let mut request = base_request();
        request.personalized_questions = 18;
        let errors = request.check_counts().unwrap_err();
        assert!(errors.contains_key("compulsoryQuestions"));
    }

    #[test]
    fn mixed_split_must_add_up() {
        let mut request = base_request();
        request.structure_type = StructureType::Mixed;
        request.technical_questions = Some(2);
        request.behavioral_questions = Some(2);
        let errors = request.check_counts().unwrap_err();
        assert!(errors.contains_key("technicalQuestions"));

        request.behavioral_questions = Some(1);
        assert!(request.check_counts().is_ok());
    }

    #[test]
    fn question_list_length_must_match() {
        let mut request = base_request();
        request.questions.pop();
        let errors = request.check_counts().unwrap_err();
        assert!(errors.contains_key("questions"));
    }

    #[test]
    fn job_category_requires_posting_fields() {
        let mut request = base_request();
        request.interview_category = Category::Job;
        request.job_title = Some("Engineer".to_string());
        request.responsibilities = Some("  ".to_string());
        let errors = request.check_counts().unwrap_err();
        assert!(!errors.contains_key("jobTitle"));
        assert!(errors.contains_key("responsibilities"));
        assert!(errors.contains_key("ctc"));
        assert!(errors.contains_key("location"));
        assert!(errors.contains_key("designation"));
    }

    #[test]
    fn category_maps_to_collections() {
        assert_eq!(
            Category::Mock.structure_collection(),
            "mock_interview_structures"
        );
        assert_eq!(Category::Job.interview_collection(), "job_interviews");
    }

    #[test]
    fn display_accessors_fall_back() {
        let structure = InterviewStructure::default();
        assert_eq!(structure.display_role(), "Interview");
        assert_eq!(structure.display_level(), "Entry");
        assert_eq!(structure.display_type(), "Technical");
    }

    #[test]
    fn stored_documents_with_missing_fields_deserialize() {
        let structure: InterviewStructure =
            serde_json::from_value(json!({"role": "Dev", "questions": ["Q?"]})).unwrap();
        assert_eq!(structure.role, "Dev");
        assert_eq!(structure.personalized_questions, 0);
        assert!(structure.techstack.is_empty());
    }
}
