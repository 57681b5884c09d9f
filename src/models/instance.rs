use serde::{Deserialize, Serialize};

use crate::models::profile::{
    Achievement, Education, ProfileInput, Project, SocialLinks, WorkExperience,
};
use crate::models::structure::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ready,
    InProgress,
    Completed,
}

/// Profile copy embedded in an interview at generation time. Every field is
/// present with a concrete default so the stored document never carries
/// nulls, whatever shape the source profile had.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSnapshot {
    pub id: String,
    pub current_role: String,
    pub experience: String,
    pub location: String,
    pub phone: String,
    pub summary: String,
    pub skills: Vec<String>,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub projects: Vec<Project>,
    pub achievements: Vec<Achievement>,
    pub languages: Vec<String>,
    pub social_links: SocialLinks,
    pub resume: String,
}

impl ProfileSnapshot {
    pub fn from_profile(user_id: &str, profile: Option<&ProfileInput>) -> Self {
        let Some(profile) = profile else {
            return ProfileSnapshot {
                id: user_id.to_string(),
                ..ProfileSnapshot::default()
            };
        };
        ProfileSnapshot {
            id: user_id.to_string(),
            current_role: profile.current_role.clone(),
            experience: profile.experience.clone(),
            location: profile.location.clone(),
            phone: profile.phone.clone(),
            summary: profile.summary.clone(),
            skills: profile.skills_list(),
            work_experience: profile.work_experience.clone(),
            education: profile.education_list(),
            projects: profile.projects.clone(),
            achievements: profile.achievements.clone(),
            languages: profile.languages_list(),
            social_links: profile.social_links.clone(),
            resume: profile.resume.clone(),
        }
    }
}

/// A generated interview, ready to be taken.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewInstance {
    pub structure_id: String,
    pub user_id: String,
    pub pre_generated_questions: Vec<String>,
    pub personalized_questions: Vec<String>,
    pub user_profile: ProfileSnapshot,
    pub role: String,
    pub level: String,
    #[serde(rename = "type")]
    pub interview_type: String,
    pub techstack: Vec<String>,
    pub created_at: String,
    pub status: Status,
    pub interview_category: Category,
    pub finalized: bool,
    pub request_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TakeInterviewRequest {
    pub structure_id: String,
    pub user_id: String,
    pub resume: Option<String>,
    pub generate_personalized: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn has_null(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::Array(items) => items.iter().any(has_null),
            Value::Object(map) => map.values().any(has_null),
            _ => false,
        }
    }

    #[test]
    fn snapshot_without_a_profile_keeps_defaults() {
        let snapshot = ProfileSnapshot::from_profile("u1", None);
        assert_eq!(snapshot.id, "u1");
        assert!(snapshot.skills.is_empty());
        assert!(snapshot.current_role.is_empty());
        assert!(!has_null(&serde_json::to_value(&snapshot).unwrap()));
    }

    #[test]
    fn snapshot_normalizes_legacy_list_fields() {
        let profile: ProfileInput = serde_json::from_value(json!({
            "skills": "Rust, SQL",
            "education": "TU Berlin"
        }))
        .unwrap();
        let snapshot = ProfileSnapshot::from_profile("u1", Some(&profile));
        assert_eq!(snapshot.skills, vec!["Rust", "SQL"]);
        assert_eq!(snapshot.education[0].institution, "TU Berlin");
    }

    #[test]
    fn instance_serializes_camel_case_without_nulls() {
        let instance = InterviewInstance {
            structure_id: "s1".to_string(),
            user_id: "u1".to_string(),
            pre_generated_questions: vec!["Q1?".to_string()],
            personalized_questions: vec![],
            user_profile: ProfileSnapshot::from_profile("u1", None),
            role: "Backend Engineer".to_string(),
            level: "mid".to_string(),
            interview_type: "technical".to_string(),
            techstack: vec!["Rust".to_string()],
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            status: Status::Ready,
            interview_category: Category::Mock,
            finalized: true,
            request_id: "r1".to_string(),
        };
        let json = serde_json::to_value(&instance).unwrap();
        assert_eq!(json["structureId"], "s1");
        assert_eq!(json["preGeneratedQuestions"][0], "Q1?");
        assert_eq!(json["type"], "technical");
        assert_eq!(json["status"], "ready");
        assert_eq!(json["interviewCategory"], "mock");
        assert!(!has_null(&json));
    }

    #[test]
    fn take_request_fields_all_default() {
        let request: TakeInterviewRequest = serde_json::from_value(json!({})).unwrap();
        assert!(request.structure_id.is_empty());
        assert!(request.resume.is_none());
        assert!(!request.generate_personalized);
    }
}
