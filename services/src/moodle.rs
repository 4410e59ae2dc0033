//! Client for the Moodle REST web-service API.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

pub const REST_PATH: &str = "/webservice/rest/server.php";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum MoodleError {
    #[error("Moodle web services are not configured")]
    NotConfigured,
    #[error("request to Moodle failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Moodle error: {message} ({exception}, {errorcode})")]
    Api {
        message: String,
        exception: String,
        errorcode: String,
    },
    #[error("{0}")]
    NotFound(String),
}

#[derive(Debug, Clone)]
pub struct MoodleConfig {
    pub url: String,
    pub token: String,
    pub accept_invalid_certs: bool,
}

impl MoodleConfig {
    /// Reads the LMS settings from the global `AppConfig`; `None` when either
    /// the URL or the token is missing.
    pub fn from_app_config() -> Option<Self> {
        let url = util::config::moodle_url();
        let token = util::config::moodle_token();
        if url.trim().is_empty() || token.trim().is_empty() {
            return None;
        }
        Some(Self {
            url: url.trim_end_matches('/').to_string(),
            token,
            accept_invalid_certs: util::config::moodle_accept_invalid_certs(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{}", self.url, REST_PATH)
    }
}

/// What `/api/lms/config` reports; never includes the full token.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConfigSummary {
    pub moodle_url: String,
    pub token_configured: bool,
    pub token_preview: Option<String>,
    pub endpoint: String,
}

pub fn config_summary(url: &str, token: &str) -> ConfigSummary {
    let url = url.trim_end_matches('/');
    ConfigSummary {
        moodle_url: url.to_string(),
        token_configured: !token.is_empty(),
        token_preview: (!token.is_empty())
            .then(|| format!("{}...", token.chars().take(8).collect::<String>())),
        endpoint: format!("{url}{REST_PATH}"),
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CourseAssignment {
    pub id: i64,
    pub cmid: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubmissionFile {
    pub filename: String,
    pub fileurl: String,
}

/// One row of an assignment's submissions, joined with the user record.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AssignmentSubmission {
    pub submission_id: Value,
    pub user_id: i64,
    pub user_fullname: String,
    pub user_email: String,
    pub status: Value,
    pub grade: Value,
    pub files: Vec<SubmissionFile>,
}

#[derive(Clone)]
pub struct MoodleClient {
    client: reqwest::Client,
    config: MoodleConfig,
}

impl MoodleClient {
    pub fn new(config: MoodleConfig) -> Result<Self, MoodleError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &MoodleConfig {
        &self.config
    }

    pub fn summary(&self) -> ConfigSummary {
        config_summary(&self.config.url, &self.config.token)
    }

    /// Invokes a web-service function and returns its JSON result.
    pub async fn call(&self, wsfunction: &str, params: &[(String, String)]) -> Result<Value, MoodleError> {
        debug!(wsfunction, "Calling Moodle web service");
        let body: Value = self
            .client
            .get(self.config.endpoint())
            .query(&[
                ("wstoken", self.config.token.as_str()),
                ("wsfunction", wsfunction),
                ("moodlewsrestformat", "json"),
            ])
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = api_error(&body) {
            error!(wsfunction, error = %err, "Moodle web service returned an error");
            return Err(err);
        }
        Ok(body)
    }

    pub async fn site_info(&self) -> Result<Value, MoodleError> {
        self.call("core_webservice_get_site_info", &[]).await
    }

    pub async fn assignments(&self, course_ids: &[i64]) -> Result<Value, MoodleError> {
        let params = indexed("courseids", course_ids);
        self.call("mod_assign_get_assignments", &params).await
    }

    pub async fn course_assignments(&self, course_id: i64) -> Result<Vec<CourseAssignment>, MoodleError> {
        let body = self.assignments(&[course_id]).await?;
        parse_course_assignments(&body, course_id)
    }

    pub async fn assignment_submissions(&self, assignment_id: i64) -> Result<Vec<AssignmentSubmission>, MoodleError> {
        let body = self
            .call("mod_assign_get_submissions", &indexed("assignmentids", &[assignment_id]))
            .await?;
        let submissions = body["assignments"][0]["submissions"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        let mut user_ids: Vec<i64> = submissions
            .iter()
            .filter_map(|s| s["userid"].as_i64())
            .filter(|id| *id > 0)
            .collect();
        user_ids.sort_unstable();
        user_ids.dedup();

        let users = if user_ids.is_empty() {
            Vec::new()
        } else {
            let mut params = vec![("field".to_string(), "id".to_string())];
            params.extend(indexed("values", &user_ids));
            self.call("core_user_get_users_by_field", &params)
                .await?
                .as_array()
                .cloned()
                .unwrap_or_default()
        };

        Ok(merge_submissions(&submissions, &users, &self.config.token))
    }
}

/// `name[0]=a&name[1]=b` style array parameters.
fn indexed(name: &str, values: &[i64]) -> Vec<(String, String)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("{name}[{i}]"), v.to_string()))
        .collect()
}

/// Moodle reports failures with HTTP 200 and an `exception` member.
pub fn api_error(body: &Value) -> Option<MoodleError> {
    body.get("exception")?;
    let field = |k: &str| body[k].as_str().unwrap_or_default().to_string();
    Some(MoodleError::Api {
        message: field("message"),
        exception: field("exception"),
        errorcode: field("errorcode"),
    })
}

pub fn parse_course_assignments(body: &Value, course_id: i64) -> Result<Vec<CourseAssignment>, MoodleError> {
    let course = body["courses"]
        .as_array()
        .and_then(|courses| courses.iter().find(|c| c["id"].as_i64() == Some(course_id)))
        .ok_or_else(|| MoodleError::NotFound(format!("Course {course_id} not found or has no assignments")))?;

    Ok(course["assignments"]
        .as_array()
        .map(|list| {
            list.iter()
                .map(|a| CourseAssignment {
                    id: a["id"].as_i64().unwrap_or_default(),
                    cmid: a["cmid"].as_i64().unwrap_or_default(),
                    name: a["name"].as_str().unwrap_or_default().to_string(),
                })
                .collect()
        })
        .unwrap_or_default())
}

/// Joins raw `mod_assign_get_submissions` rows with user records and
/// flattens the file plugin areas into download links carrying `token`.
pub fn merge_submissions(submissions: &[Value], users: &[Value], token: &str) -> Vec<AssignmentSubmission> {
    let by_id: HashMap<i64, &Value> = users
        .iter()
        .filter_map(|u| u["id"].as_i64().map(|id| (id, u)))
        .collect();

    submissions
        .iter()
        .map(|s| {
            let user_id = s["userid"].as_i64().unwrap_or_default();
            let user = by_id.get(&user_id);
            let text = |k: &str, fallback: &str| {
                user.and_then(|u| u[k].as_str())
                    .unwrap_or(fallback)
                    .to_string()
            };

            let files = s["plugins"]
                .as_array()
                .into_iter()
                .flatten()
                .filter(|p| p["type"] == "file")
                .flat_map(|p| p["fileareas"].as_array().into_iter().flatten())
                .flat_map(|area| area["files"].as_array().into_iter().flatten())
                .map(|f| SubmissionFile {
                    filename: f["filename"].as_str().unwrap_or_default().to_string(),
                    fileurl: match f["fileurl"].as_str() {
                        Some(url) if !url.is_empty() => format!("{url}?token={token}"),
                        _ => "URL unavailable".to_string(),
                    },
                })
                .collect();

            AssignmentSubmission {
                submission_id: s["id"].clone(),
                user_id,
                user_fullname: text("fullname", "User not found"),
                user_email: text("email", "N/A"),
                status: s["status"].clone(),
                grade: s["grade"].clone(),
                files,
            }
        })
        .collect()
}
