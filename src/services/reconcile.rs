use crate::models::structure::InterviewStructure;
use crate::services::generator::GenerationError;

fn stack_entry(structure: &InterviewStructure, index: usize) -> Option<&str> {
    if structure.techstack.is_empty() {
        return None;
    }
    let entry = structure.techstack[index % structure.techstack.len()].trim();
    if entry.is_empty() {
        None
    } else {
        Some(entry)
    }
}

fn fallback_question(structure: &InterviewStructure, index: usize) -> String {
    match index % 5 {
        0 => format!(
            "Tell me about your experience with {} relevant to this {} role.",
            stack_entry(structure, index).unwrap_or("the technologies"),
            structure.display_role(),
        ),
        1 => format!(
            "How would you approach a challenging project as a {} at the {} level?",
            structure.display_role(),
            structure.display_level(),
        ),
        2 => "Describe a situation where you had to learn a new technology quickly. \
              How did you handle it?"
            .to_string(),
        3 => format!(
            "What interests you most about working as a {}?",
            structure.display_role(),
        ),
        _ => format!(
            "How do you stay updated with the latest developments in {}?",
            stack_entry(structure, 0).unwrap_or("technology"),
        ),
    }
}

/// Forces the question list to exactly `expected` entries: short lists are
/// padded with generic questions built from the structure, long lists are
/// truncated.
pub fn reconcile_count(
    mut questions: Vec<String>,
    expected: usize,
    structure: &InterviewStructure,
) -> Result<Vec<String>, GenerationError> {
    if questions.len() < expected {
        let mut index = 0;
        while questions.len() < expected {
            questions.push(fallback_question(structure, index));
            index += 1;
        }
    } else if questions.len() > expected {
        questions.truncate(expected);
    }

    if questions.len() != expected {
        return Err(GenerationError::CountMismatch {
            expected,
            actual: questions.len(),
        });
    }
    Ok(questions)
}
