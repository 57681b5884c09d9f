use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

fn numbered_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.").expect("static pattern compiles"))
}

fn numbered_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\.\s*").expect("static pattern compiles"))
}

/// Removes a markdown code fence wrapper plus any stray leading `json` tag.
fn strip_code_fences(text: &str) -> &str {
    let mut cleaned = text.trim();
    if let Some(rest) = cleaned.strip_prefix("```json") {
        cleaned = rest;
    } else if let Some(rest) = cleaned.strip_prefix("```") {
        cleaned = rest;
    }
    cleaned = cleaned.trim();
    if let Some(rest) = cleaned.strip_suffix("```") {
        cleaned = rest.trim();
    }
    cleaned.strip_prefix("json").map_or(cleaned, str::trim)
}

/// Slices out the outermost JSON object embedded in model output, tolerating
/// prose and markdown around it.
pub fn extract_object_candidate(raw: &str) -> Option<&str> {
    let cleaned = strip_code_fences(raw);
    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&cleaned[start..=end])
}

/// Parses question lists shaped as `{"questions": [...]}`. A parseable
/// object with a missing or malformed `questions` field yields an empty
/// list; unparseable output falls back to line extraction over the raw text.
pub fn parse_question_object(raw: &str) -> Vec<String> {
    let parsed = extract_object_candidate(raw)
        .and_then(|candidate| serde_json::from_str::<Value>(candidate).ok());
    match parsed {
        Some(value) => value
            .get("questions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        None => extract_question_lines(raw),
    }
}

/// Parses question lists shaped as a bare JSON array of strings. Output
/// without a parseable array falls back to line extraction over the raw text.
pub fn parse_question_array(raw: &str) -> Vec<String> {
    let cleaned = strip_code_fences(raw);
    let candidate = match (cleaned.find('['), cleaned.rfind(']')) {
        (Some(start), Some(end)) if start <= end => &cleaned[start..=end],
        _ => return extract_question_lines(raw),
    };
    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => extract_question_lines(raw),
    }
}

fn looks_like_question(line: &str) -> bool {
    if line.len() <= 20 {
        return false;
    }
    let lowered = line.to_lowercase();
    line.contains('?')
        || numbered_line().is_match(line)
        || lowered.contains("tell me")
        || lowered.contains("describe")
        || lowered.contains("explain")
        || lowered.contains("how would you")
        || lowered.contains("can you")
}

fn strip_decorations(line: &str) -> String {
    let stripped = numbered_prefix().replace(line, "");
    let stripped = stripped
        .trim_start_matches('-')
        .trim_start()
        .trim_start_matches('"')
        .trim_start();
    stripped.trim_end().trim_end_matches('"').trim().to_string()
}

/// Last-resort extraction: pick lines that read like interview questions
/// from free-form model output.
pub fn extract_question_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| looks_like_question(line))
        .map(strip_decorations)
        .filter(|line| line.len() > 20 && !line.contains('{') && !line.contains('}'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_clean_object() {
        let questions = parse_question_object(r#"{"questions": ["What is ownership in Rust?"]}"#);
        assert_eq!(questions, vec!["What is ownership in Rust?"]);
    }

    #[test]
    fn parses_a_fenced_object_with_prose_around_it() {
        let raw = "Sure! Here are your questions:\n```json\n{\"questions\": [\"A?\", \"B?\"]}\n```";
        assert_eq!(parse_question_object(raw), vec!["A?", "B?"]);
    }

    #[test]
    fn missing_questions_field_yields_empty() {
        assert!(parse_question_object(r#"{"items": ["A?"]}"#).is_empty());
        assert!(parse_question_object(r#"{"questions": "not a list"}"#).is_empty());
    }

    #[test]
    fn unparseable_output_falls_back_to_line_extraction() {
        let raw = "Here are some questions:\n\
                   1. Tell me about a project you are proud of and why it mattered.\n\
                   2. How would you design a rate limiter for a public API?\n\
                   Short line?\n\
                   This line has no question markers at all";
        let questions = parse_question_object(raw);
        assert_eq!(
            questions,
            vec![
                "Tell me about a project you are proud of and why it mattered.",
                "How would you design a rate limiter for a public API?",
            ]
        );
    }

    #[test]
    fn line_extraction_strips_decorations() {
        let raw = "- \"Describe a production incident you handled end to end.\"";
        assert_eq!(
            extract_question_lines(raw),
            vec!["Describe a production incident you handled end to end."]
        );
    }

    #[test]
    fn line_extraction_drops_lines_with_braces() {
        let raw = "{\"questions\": means the parse already failed somewhere?\n\
                   Can you walk me through your debugging process for flaky tests?";
        assert_eq!(
            extract_question_lines(raw),
            vec!["Can you walk me through your debugging process for flaky tests?"]
        );
    }

    #[test]
    fn parses_bare_arrays_with_fences() {
        let raw = "```json\n[\"What is a lifetime?\", \"What is Send?\"]\n```";
        assert_eq!(
            parse_question_array(raw),
            vec!["What is a lifetime?", "What is Send?"]
        );
        assert!(parse_question_array("no array here").is_empty());
        assert!(parse_question_array("[not json").is_empty());
    }

    #[test]
    fn array_parse_failure_falls_back_to_line_extraction() {
        let raw = "1. Explain how connection pooling changes under high concurrency.\n\
                   2. Can you compare optimistic and pessimistic locking approaches?";
        assert_eq!(
            parse_question_array(raw),
            vec![
                "Explain how connection pooling changes under high concurrency.",
                "Can you compare optimistic and pessimistic locking approaches?",
            ]
        );
    }

    #[test]
    fn object_candidate_requires_braces_in_order() {
        assert_eq!(extract_object_candidate("x {\"a\": 1} y"), Some("{\"a\": 1}"));
        assert!(extract_object_candidate("} {").is_none());
        assert!(extract_object_candidate("no braces").is_none());
    }
}
