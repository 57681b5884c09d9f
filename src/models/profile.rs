use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkExperience {
    pub company: String,
    pub position: String,
    pub location: String,
    pub start_date: String,
    pub end_date: String,
    pub description: String,
    pub is_current_job: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field_of_study: String,
    pub start_date: String,
    pub end_date: String,
    pub grade: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub live_url: String,
    pub github_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Achievement {
    pub title: String,
    pub description: String,
    pub date: String,
    pub organization: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialLinks {
    pub linkedin: String,
    pub github: String,
    pub portfolio: String,
    pub twitter: String,
}

impl SocialLinks {
    pub fn is_empty(&self) -> bool {
        self.linkedin.is_empty()
            && self.github.is_empty()
            && self.portfolio.is_empty()
            && self.twitter.is_empty()
    }
}

/// Legacy profiles stored list fields as comma-separated text. Reads accept
/// both shapes and normalize to a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringListField {
    List(Vec<String>),
    Text(String),
}

impl Default for StringListField {
    fn default() -> Self {
        StringListField::List(Vec::new())
    }
}

impl StringListField {
    pub fn to_list(&self) -> Vec<String> {
        match self {
            StringListField::List(items) => items
                .iter()
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
            StringListField::Text(text) => text
                .split(',')
                .map(|item| item.trim().to_string())
                .filter(|item| !item.is_empty())
                .collect(),
        }
    }
}

/// Education appears as a list, a single object, or free text depending on
/// the profile's age.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum EducationField {
    List(Vec<Education>),
    Single(Education),
    Text(String),
}

impl Default for EducationField {
    fn default() -> Self {
        EducationField::List(Vec::new())
    }
}

impl EducationField {
    pub fn to_list(&self) -> Vec<Education> {
        match self {
            EducationField::List(items) => items.clone(),
            EducationField::Single(entry) => vec![entry.clone()],
            EducationField::Text(text) => {
                if text.trim().is_empty() {
                    Vec::new()
                } else {
                    vec![Education {
                        institution: text.trim().to_string(),
                        ..Education::default()
                    }]
                }
            }
        }
    }
}

/// Tolerant profile input: accepts client payloads and stored documents in
/// any historical shape. `phone` and `resume` only ever arrive from old
/// documents but still feed question personalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileInput {
    pub current_role: String,
    pub experience: String,
    pub location: String,
    pub phone: String,
    pub summary: String,
    pub skills: StringListField,
    pub work_experience: Vec<WorkExperience>,
    pub education: EducationField,
    pub projects: Vec<Project>,
    pub achievements: Vec<Achievement>,
    pub languages: StringListField,
    pub social_links: SocialLinks,
    pub resume: String,
    pub company_description: String,
    pub sector: String,
    pub company_size: String,
    pub founded: String,
    pub website: String,
    pub specialties: StringListField,
}

fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

impl ProfileInput {
    pub fn skills_list(&self) -> Vec<String> {
        self.skills.to_list()
    }

    pub fn education_list(&self) -> Vec<Education> {
        self.education.to_list()
    }

    pub fn languages_list(&self) -> Vec<String> {
        self.languages.to_list()
    }

    pub fn specialties_list(&self) -> Vec<String> {
        self.specialties.to_list()
    }

    /// Section-by-section completion scoring. Recruiters are scored on the
    /// company sections, candidates on the resume sections.
    pub fn completion(&self, recruiter: bool) -> Completion {
        let mut sections = BTreeMap::new();

        if recruiter {
            let company_info = self.company_description.trim().len() >= 100
                && filled(&self.sector)
                && filled(&self.company_size)
                && filled(&self.location);
            sections.insert("companyInfo".to_string(), u32::from(company_info));
            sections.insert(
                "specialties".to_string(),
                u32::from(!self.specialties_list().is_empty()),
            );
            sections.insert(
                "socialLinks".to_string(),
                u32::from(filled(&self.social_links.linkedin)),
            );
            return Completion::from_sections(sections, 3);
        }

        let basic_info =
            filled(&self.current_role) && filled(&self.experience) && filled(&self.location);
        sections.insert("basicInfo".to_string(), u32::from(basic_info));
        sections.insert(
            "summary".to_string(),
            u32::from(self.summary.trim().len() >= 50),
        );
        sections.insert(
            "skills".to_string(),
            u32::from(!self.skills_list().is_empty()),
        );
        sections.insert(
            "workExperience".to_string(),
            u32::from(self.work_experience.iter().any(|entry| {
                filled(&entry.company)
                    && filled(&entry.position)
                    && filled(&entry.start_date)
                    && filled(&entry.description)
            })),
        );
        sections.insert(
            "education".to_string(),
            u32::from(self.education_list().iter().any(|entry| {
                filled(&entry.institution)
                    && filled(&entry.degree)
                    && filled(&entry.field_of_study)
                    && filled(&entry.start_date)
            })),
        );
        sections.insert(
            "projects".to_string(),
            u32::from(self.projects.iter().any(|entry| {
                filled(&entry.name) && filled(&entry.description) && !entry.technologies.is_empty()
            })),
        );
        sections.insert(
            "achievements".to_string(),
            u32::from(self.achievements.iter().any(|entry| {
                filled(&entry.title)
                    && filled(&entry.description)
                    && filled(&entry.date)
                    && filled(&entry.organization)
            })),
        );
        sections.insert(
            "languages".to_string(),
            u32::from(!self.languages_list().is_empty()),
        );
        sections.insert(
            "socialLinks".to_string(),
            u32::from(
                filled(&self.social_links.linkedin)
                    || filled(&self.social_links.github)
                    || filled(&self.social_links.portfolio),
            ),
        );
        Completion::from_sections(sections, 9)
    }

    /// Canonical stored document with lists normalized and scoring applied.
    pub fn into_document(
        self,
        user_id: &str,
        recruiter: bool,
        completed_at: String,
        updated_at: String,
    ) -> ProfileDocument {
        let completion = self.completion(recruiter);
        ProfileDocument {
            user_id: user_id.to_string(),
            current_role: self.current_role.trim().to_string(),
            experience: self.experience.trim().to_string(),
            location: self.location.trim().to_string(),
            phone: self.phone.trim().to_string(),
            summary: self.summary.trim().to_string(),
            skills: self.skills.to_list(),
            work_experience: self.work_experience,
            education: self.education.to_list(),
            projects: self.projects,
            achievements: self.achievements,
            languages: self.languages.to_list(),
            social_links: self.social_links,
            resume: self.resume,
            company_description: self.company_description.trim().to_string(),
            sector: self.sector.trim().to_string(),
            company_size: self.company_size.trim().to_string(),
            founded: self.founded.trim().to_string(),
            website: self.website.trim().to_string(),
            specialties: self.specialties.to_list(),
            completion_percentage: completion.percentage,
            completed_sections: completion.sections,
            completed_at,
            updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub percentage: u32,
    pub sections: BTreeMap<String, u32>,
}

impl Completion {
    fn from_sections(sections: BTreeMap<String, u32>, total: u32) -> Self {
        let completed: u32 = sections.values().sum();
        let percentage = ((completed as f64 / total as f64) * 100.0).round() as u32;
        Completion {
            percentage,
            sections,
        }
    }
}

/// Canonical stored shape. Recruiter-only and legacy fields are dropped from
/// the document when empty.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    pub user_id: String,
    pub current_role: String,
    pub experience: String,
    pub location: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
    pub summary: String,
    pub skills: Vec<String>,
    pub work_experience: Vec<WorkExperience>,
    pub education: Vec<Education>,
    pub projects: Vec<Project>,
    pub achievements: Vec<Achievement>,
    pub languages: Vec<String>,
    pub social_links: SocialLinks,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub resume: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub company_description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sector: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub company_size: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub founded: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub website: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub specialties: Vec<String>,
    pub completion_percentage: u32,
    pub completed_sections: BTreeMap<String, u32>,
    pub completed_at: String,
    pub updated_at: String,
}
