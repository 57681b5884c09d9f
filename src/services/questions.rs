use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::models::structure::{CategorizedQuestions, DraftQuestionsRequest, StructureType};
use crate::services::generator::{GenerationError, TextGenerator};
use crate::services::parser::parse_question_array;
use crate::services::prompt::{
    behavioral_draft_prompt, single_type_draft_prompt, technical_draft_prompt,
};
use crate::utils::logger::LOGGER;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftQuestionsResponse {
    pub success: bool,
    pub questions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categorized_questions: Option<CategorizedQuestions>,
    pub compulsory_count: u32,
    pub personalized_count: u32,
    pub message: String,
}

/// Drafts the compulsory question list for a structure being authored.
/// Mixed structures get one behavioral and one technical generation pass,
/// everything else a single pass.
pub struct QuestionDraftService {
    generator: Arc<dyn TextGenerator>,
}

impl QuestionDraftService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        QuestionDraftService { generator }
    }

    async fn generate_list(
        &self,
        prompt: &str,
        expected: u32,
    ) -> Result<Vec<String>, GenerationError> {
        let started = Instant::now();
        let raw = self.generator.generate(prompt).await?;
        let questions = parse_question_array(&raw);
        LOGGER.log_generation(
            self.generator.model(),
            prompt,
            started.elapsed().as_millis(),
            Some(questions.len()),
        );
        if questions.is_empty() && expected > 0 {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(questions)
    }

    pub async fn draft(
        &self,
        request: &DraftQuestionsRequest,
    ) -> Result<DraftQuestionsResponse, GenerationError> {
        let total = request.compulsory_questions;

        let (questions, categorized) = if request.structure_type == StructureType::Mixed {
            let behavioral_count = request
                .behavioral_questions
                .filter(|&count| count > 0)
                .unwrap_or((total + 1) / 2);
            let technical_count = request
                .technical_questions
                .filter(|&count| count > 0)
                .unwrap_or(total / 2);

            let behavioral = self
                .generate_list(&behavioral_draft_prompt(request, behavioral_count), behavioral_count)
                .await?;
            let technical = self
                .generate_list(&technical_draft_prompt(request, technical_count), technical_count)
                .await?;

            let mut combined = behavioral.clone();
            combined.extend(technical.clone());
            (
                combined,
                Some(CategorizedQuestions {
                    behavioral,
                    technical,
                }),
            )
        } else {
            let questions = self
                .generate_list(&single_type_draft_prompt(request, total), total)
                .await?;
            (questions, None)
        };

        let personalized = request.personalized_questions;
        let mut message = format!("Generated {} compulsory questions", total);
        if personalized > 0 {
            message.push_str(&format!(
                " ({} personalized questions will be generated during interview)",
                personalized
            ));
        }

        Ok(DraftQuestionsResponse {
            success: true,
            questions,
            categorized_questions: categorized,
            compulsory_count: total,
            personalized_count: personalized,
            message,
        })
    }
}
