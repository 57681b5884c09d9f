use crate::models::profile::{EducationField, ProfileInput};
use crate::models::structure::{Category, DraftQuestionsRequest, InterviewStructure, StructureType};

/// Personalization directive applied when a structure does not carry its own.
pub const DEFAULT_PERSONALIZATION_DIRECTIVE: &str = "Focus on the candidate's specific \
     experience, skills mentioned in their profile, and practical scenarios related to their \
     background.";

const PERSONALIZATION_GUIDELINES: &str = "\
PERSONALIZATION GUIDELINES:
1. Reference specific projects, achievements, or experiences from their profile
2. Ask about technologies they've actually worked with based on their work experience
3. Connect their past roles and responsibilities to the target position
4. Leverage their educational background for relevant technical or domain questions
5. Use their professional summary to understand their career trajectory and goals
6. Ask about specific skills they've listed and how they've applied them
7. Reference their achievements to understand their impact and problem-solving abilities
8. Consider their experience level when framing question complexity
9. Use their location, current role, and career progression for context-appropriate questions
10. Build questions that assess both technical competency and cultural fit based on their background
";

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}

fn experience_unit(experience: &str) -> &'static str {
    if experience.trim().is_empty() {
        return "";
    }
    if matches!(experience.trim().parse::<u32>(), Ok(1)) {
        " year"
    } else {
        " years"
    }
}

fn profile_block(profile: &ProfileInput) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "USER PROFILE DATA:\n\
         - Current Role: {}\n\
         - Experience: {}{}\n\
         - Location: {}\n\
         - Phone: {}\n\n",
        or_placeholder(&profile.current_role, "Not specified"),
        or_placeholder(&profile.experience, "Not specified"),
        experience_unit(&profile.experience),
        or_placeholder(&profile.location, "Not specified"),
        or_placeholder(&profile.phone, "Not specified"),
    ));

    block.push_str(&format!(
        "PROFESSIONAL SUMMARY:\n{}\n\n",
        or_placeholder(&profile.summary, "Not provided")
    ));

    let skills = profile.skills_list();
    block.push_str(&format!(
        "TECHNICAL SKILLS:\n{}\n\n",
        if skills.is_empty() {
            "Not specified".to_string()
        } else {
            skills.join(", ")
        }
    ));

    block.push_str("WORK EXPERIENCE:\n");
    if profile.work_experience.is_empty() {
        block.push_str("Not provided\n");
    } else {
        for entry in &profile.work_experience {
            let end = if entry.is_current_job {
                "Present"
            } else {
                &entry.end_date
            };
            block.push_str(&format!(
                "- {} at {} ({} - {})\n  Location: {}\n  Description: {}\n",
                entry.position,
                entry.company,
                entry.start_date,
                end,
                or_placeholder(&entry.location, "Not specified"),
                or_placeholder(&entry.description, "Not provided"),
            ));
        }
    }
    block.push('\n');

    block.push_str("EDUCATION:\n");
    match &profile.education {
        EducationField::Text(text) if !text.trim().is_empty() => {
            block.push_str(text.trim());
            block.push('\n');
        }
        _ => {
            let entries = profile.education_list();
            if entries.is_empty() {
                block.push_str("Not provided\n");
            } else {
                for entry in &entries {
                    block.push_str(&format!(
                        "- {} in {} from {} ({} - {})\n",
                        entry.degree,
                        entry.field_of_study,
                        entry.institution,
                        entry.start_date,
                        entry.end_date,
                    ));
                    if !entry.grade.trim().is_empty() {
                        block.push_str(&format!("  Grade: {}\n", entry.grade));
                    }
                }
            }
        }
    }
    block.push('\n');

    block.push_str("PROJECTS:\n");
    if profile.projects.is_empty() {
        block.push_str("Not provided\n");
    } else {
        for project in &profile.projects {
            block.push_str(&format!(
                "- {}\n  Description: {}\n  Technologies: {}\n",
                project.name,
                project.description,
                if project.technologies.is_empty() {
                    "Not specified".to_string()
                } else {
                    project.technologies.join(", ")
                }
            ));
            if !project.live_url.trim().is_empty() {
                block.push_str(&format!("  Live URL: {}\n", project.live_url));
            }
            if !project.github_url.trim().is_empty() {
                block.push_str(&format!("  GitHub: {}\n", project.github_url));
            }
        }
    }
    block.push('\n');

    block.push_str("ACHIEVEMENTS:\n");
    if profile.achievements.is_empty() {
        block.push_str("Not provided\n");
    } else {
        for achievement in &profile.achievements {
            block.push_str(&format!(
                "- {} ({})\n  Organization: {}\n  Description: {}\n",
                achievement.title,
                achievement.date,
                achievement.organization,
                achievement.description,
            ));
            if !achievement.url.trim().is_empty() {
                block.push_str(&format!("  URL: {}\n", achievement.url));
            }
        }
    }
    block.push('\n');

    let languages = profile.languages_list();
    block.push_str(&format!(
        "LANGUAGES:\n{}\n\n",
        if languages.is_empty() {
            "Not specified".to_string()
        } else {
            languages.join(", ")
        }
    ));

    block.push_str("SOCIAL LINKS:\n");
    if profile.social_links.is_empty() {
        block.push_str("Not provided\n");
    } else {
        block.push_str(&format!(
            "- LinkedIn: {}\n- GitHub: {}\n- Portfolio: {}\n- Twitter: {}\n",
            or_placeholder(&profile.social_links.linkedin, "Not provided"),
            or_placeholder(&profile.social_links.github, "Not provided"),
            or_placeholder(&profile.social_links.portfolio, "Not provided"),
            or_placeholder(&profile.social_links.twitter, "Not provided"),
        ));
    }

    if !profile.resume.trim().is_empty() {
        block.push_str(&format!("\nRESUME/BACKGROUND:\n{}\n", profile.resume));
    }

    block
}

fn job_posting_block(
    job_title: &str,
    designation: &str,
    location: &str,
    ctc: &str,
    responsibilities: &str,
    tailor_line: &str,
) -> String {
    format!(
        "This is for an actual job opening with these details:\n\
         - Job Title: {}\n\
         - Designation: {}\n\
         - Location: {}\n\
         - CTC: {}\n\
         - Key Responsibilities: {}\n\n{}\n",
        job_title, designation, location, ctc, responsibilities, tailor_line
    )
}

/// Prompt for the per-candidate questions generated when an interview is
/// taken. Interpolates the structure's requirements, the personalization
/// directive, job posting details for job interviews, the candidate's
/// profile and any ad-hoc resume text.
pub fn personalized_questions_prompt(
    structure: &InterviewStructure,
    category: Category,
    profile: Option<&ProfileInput>,
    resume: Option<&str>,
) -> String {
    let count = structure.personalized_questions;
    let directive = or_placeholder(
        &structure.personalized_question_prompt,
        DEFAULT_PERSONALIZATION_DIRECTIVE,
    );

    let mut prompt = format!(
        "Generate EXACTLY {count} personalized interview questions based on the candidate's \
         comprehensive profile, resume, and the specific requirements below:\n\n\
         INTERVIEW STRUCTURE REQUIREMENTS:\n\
         - Role: {role}\n\
         - Experience Level: {level}\n\
         - Tech Stack: {techstack}\n\
         - Interview Type: {kind}\n\
         - Required Question Count: {count}\n\n\
         PERSONALIZATION REQUIREMENTS:\n{directive}\n\n",
        count = count,
        role = structure.display_role(),
        level = structure.display_level(),
        techstack = structure.techstack.join(", "),
        kind = structure.display_type(),
        directive = directive,
    );

    if category == Category::Job {
        prompt.push_str("JOB POSTING DETAILS:\n");
        prompt.push_str(&format!(
            "- Job Title: {}\n- Designation: {}\n- Location: {}\n- CTC: {}\n\
             - Key Responsibilities: {}\n\n\
             Tailor questions to assess if the candidate fits this specific job posting.\n\n",
            structure.job_title,
            structure.designation,
            structure.location,
            structure.ctc,
            structure.responsibilities,
        ));
    }

    prompt.push_str("CANDIDATE PROFILE:\n");
    if let Some(profile) = profile {
        prompt.push_str(&profile_block(profile));
    }
    prompt.push('\n');

    if let Some(resume) = resume.filter(|text| !text.trim().is_empty()) {
        prompt.push_str(&format!(
            "CANDIDATE'S RESUME/ADDITIONAL INFO:\n{}\n\n\
             Use specific details from their resume to create targeted questions.\n\n",
            resume
        ));
    }

    prompt.push_str(PERSONALIZATION_GUIDELINES);
    prompt.push('\n');

    prompt.push_str(&format!(
        "CRITICAL INSTRUCTIONS:\n\
         1. Generate EXACTLY {count} questions - no more, no less\n\
         2. Each question MUST be personalized using specific details from the candidate's profile\n\
         3. Use the personalization requirements above as your primary guide\n\
         4. Reference concrete details from their work experience, projects, skills, or achievements\n\
         5. Make questions relevant to the {role} role and {level} experience level\n\
         6. Follow the {kind} interview type approach\n\
         7. Return ONLY a valid JSON object in this exact format: {{\"questions\": [\"Question 1\", \"Question 2\", ...]}}\n\
         8. Do not include any text, markdown, explanations, or code blocks before or after the JSON\n\
         9. Do not wrap the JSON in backticks, markdown code blocks, or any other formatting\n\
         10. Your response should start with {{ and end with }} - nothing else\n\
         11. Avoid special characters that might break voice assistants (no /, *, etc.)\n\
         12. Make questions conversational and natural for voice interaction\n\
         13. Ensure questions assess both technical skills and cultural fit for the role\n\n\
         Remember: Every question should demonstrate that you've thoroughly reviewed their \
         profile and are asking about their specific experiences, skills, and background.",
        count = count,
        role = structure.display_role(),
        level = structure.display_level(),
        kind = structure.display_type(),
    ));

    prompt
}

const DRAFT_OUTRO: &str = "Please return only the questions, without any additional text.\n\
    The questions are going to be read by a voice assistant so do not use \"/\" or \"*\" or any \
    other special characters which might break the voice assistant.\n\
    Return the questions formatted like this:\n\
    [\"Question 1\", \"Question 2\", \"Question 3\"]\n\n\
    Thank you! <3\n";

fn draft_job_block(request: &DraftQuestionsRequest, tailor_line: &str) -> String {
    if request.interview_category == Category::Job {
        job_posting_block(
            request.job_title.as_deref().unwrap_or(""),
            request.designation.as_deref().unwrap_or(""),
            request.location.as_deref().unwrap_or(""),
            request.ctc.as_deref().unwrap_or(""),
            request.responsibilities.as_deref().unwrap_or(""),
            tailor_line,
        )
    } else {
        "This is a mock interview for practice purposes.\n".to_string()
    }
}

/// Behavioral half of a mixed structure draft.
pub fn behavioral_draft_prompt(request: &DraftQuestionsRequest, count: u32) -> String {
    let opening = if request.regenerate {
        "Regenerate completely new and different behavioral questions"
    } else {
        "Generate behavioral questions"
    };
    let mut prompt = format!(
        "{} for a job interview.\n\
         The job role is {}.\n\
         The job experience level is {}.\n\
         The amount of questions required is: {}.\n",
        opening, request.role, request.level.as_str(), count
    );
    prompt.push_str(&draft_job_block(
        request,
        "Please tailor the behavioral questions to be relevant to this job opening.",
    ));
    prompt.push('\n');
    if request.regenerate {
        prompt.push_str(
            "Make sure these behavioral questions are completely different from any previous set.\n\n",
        );
    }
    prompt.push_str(
        "Focus on behavioral questions that assess soft skills, past experiences, teamwork, \
         leadership, problem-solving approach, etc.\n",
    );
    prompt.push_str(DRAFT_OUTRO);
    prompt
}

/// Technical half of a mixed structure draft.
pub fn technical_draft_prompt(request: &DraftQuestionsRequest, count: u32) -> String {
    let opening = if request.regenerate {
        "Regenerate completely new and different technical questions"
    } else {
        "Generate technical questions"
    };
    let mut prompt = format!(
        "{} for a job interview.\n\
         The job role is {}.\n\
         The job experience level is {}.\n\
         The tech stack used in the job is: {}.\n\
         The amount of questions required is: {}.\n",
        opening,
        request.role,
        request.level.as_str(),
        request.techstack,
        count
    );
    prompt.push_str(&draft_job_block(
        request,
        "Please tailor the technical questions to be specific to this job opening and its tech stack.",
    ));
    prompt.push('\n');
    if request.regenerate {
        prompt.push_str(
            "Make sure these technical questions are completely different from any previous set.\n\n",
        );
    }
    prompt.push_str(
        "Focus on technical questions related to the specified tech stack, coding problems, \
         system design, technical concepts, etc.\n",
    );
    prompt.push_str(DRAFT_OUTRO);
    prompt
}

/// Draft for a purely technical or purely behavioral structure.
pub fn single_type_draft_prompt(request: &DraftQuestionsRequest, count: u32) -> String {
    let opening = if request.regenerate {
        "Regenerate completely new and different questions"
    } else {
        "Generate questions"
    };
    let mut prompt = format!(
        "{} for a job interview.\n\
         The job role is {}.\n\
         The job experience level is {}.\n",
        opening,
        request.role,
        request.level.as_str()
    );
    if request.structure_type == StructureType::Technical {
        prompt.push_str(&format!(
            "The tech stack used in the job is: {}.\n",
            request.techstack
        ));
    }
    prompt.push_str(&format!("The amount of questions required is: {}.\n", count));
    prompt.push_str(&draft_job_block(
        request,
        "Please tailor the questions to be specific to this job opening and its requirements.",
    ));
    prompt.push('\n');
    if request.regenerate {
        prompt.push_str(
            "Make sure these questions are completely different from any previous set of \
             questions for the same role and requirements.\n\n",
        );
    }
    prompt.push_str(if request.structure_type == StructureType::Behavioral {
        "Focus on behavioral questions that assess soft skills, past experiences, teamwork, \
         leadership, problem-solving approach, etc.\n"
    } else {
        "Focus on technical questions related to the specified tech stack, coding problems, \
         system design, technical concepts, etc.\n"
    });
    prompt.push_str(DRAFT_OUTRO);
    prompt
}

/// Scoring prompt for a completed interview transcript.
pub fn feedback_prompt(formatted_transcript: &str) -> String {
    format!(
        "You are an AI interviewer analyzing a mock interview. Your task is to evaluate the \
         candidate based on structured categories. Be thorough and detailed in your analysis. \
         Don't be lenient with the candidate. If there are mistakes or areas for improvement, \
         point them out.\n\
         Transcript:\n{}\n\n\
         Please score the candidate from 0 to 100 in the following areas. Do not add categories \
         other than the ones provided:\n\
         - **Communication Skills**: Clarity, articulation, structured responses.\n\
         - **Technical Knowledge**: Understanding of key concepts for the role.\n\
         - **Problem-Solving**: Ability to analyze problems and propose solutions.\n\
         - **Cultural & Role Fit**: Alignment with company values and job role.\n\
         - **Confidence & Clarity**: Confidence in responses, engagement, and clarity.\n\n\
         Return ONLY a valid JSON object in this exact format, with no markdown or extra text:\n\
         {{\"totalScore\": 0, \"categoryScores\": [{{\"name\": \"Communication Skills\", \
         \"score\": 0, \"comment\": \"\"}}], \"strengths\": [\"\"], \
         \"areasForImprovement\": [\"\"], \"finalAssessment\": \"\"}}",
        formatted_transcript
    )
}
