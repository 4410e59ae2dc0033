use db::{Difficulty, Resource, Submission, TimeSpent};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};
use services::{QuestionnaireAnswers, SubmissionStats};
use validator::{Validate, ValidationError};

const MAX_ANSWER_CHARS: usize = 5000;

#[derive(Debug, Deserialize, Validate)]
pub struct QuestionnaireRequest {
    pub time_spent: TimeSpent,
    pub difficulty: Difficulty,
    #[validate(length(min = 1, message = "Select at least one resource (or \"none\")"))]
    #[serde(default)]
    pub resources_used: Vec<Resource>,
    #[validate(custom(
        function = "validate_answer_text",
        message = "challenges is required (max 5000 characters)"
    ))]
    pub challenges: String,
    #[validate(custom(
        function = "validate_answer_text",
        message = "learnings is required (max 5000 characters)"
    ))]
    pub learnings: String,
}

/// Free-text answers are judged after trimming, the form they are stored in.
fn validate_answer_text(text: &str) -> Result<(), ValidationError> {
    let len = text.trim().chars().count();
    if len == 0 || len > MAX_ANSWER_CHARS {
        return Err(ValidationError::new("answer_text")
            .with_message("Answer must be between 1 and 5000 characters".into()));
    }
    Ok(())
}

impl QuestionnaireRequest {
    pub fn into_answers(self) -> QuestionnaireAnswers {
        let mut resources = self.resources_used;
        resources.sort();
        resources.dedup();
        QuestionnaireAnswers {
            time_spent: self.time_spent,
            difficulty: self.difficulty,
            resources_used: resources,
            challenges: self.challenges.trim().to_string(),
            learnings: self.learnings.trim().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct GradeRequest {
    #[validate(range(min = 0.0, max = 10.0, message = "Score must be between 0 and 10"))]
    pub score: f64,
    #[validate(length(max = 5000, message = "Feedback is limited to 5000 characters"))]
    #[serde(default)]
    pub feedback: String,
}

#[derive(Debug, Serialize, Default)]
pub struct SubmissionListResponse {
    pub submissions: Vec<Submission>,
    /// Present for instructors only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<SubmissionStats>,
}

/// RFC 5987 `attr-char`: everything else is percent-encoded in `filename*`.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// `Content-Disposition` value for a download (RFC 6266).
///
/// `filename` carries an ASCII fallback with quotes, backslashes, control
/// and non-ASCII characters replaced by `_`; `filename*` carries the exact
/// UTF-8 name.
pub fn attachment_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c == '"' || c == '\\' || c.is_control() || !c.is_ascii() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let encoded = utf8_percent_encode(file_name, ATTR_CHAR);
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
