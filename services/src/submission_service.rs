use chrono::Utc;
use db::{
    Difficulty, Grade, Questionnaire, Resource, StoreError, Submission, SubmissionStore, TimeSpent,
    UploadedFile,
};
use rand::{Rng, distr::Alphanumeric};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// File extensions accepted for submissions (compared lowercase).
pub const ALLOWED_EXTENSIONS: [&str; 9] =
    ["pdf", "doc", "docx", "zip", "rar", "txt", "jpg", "jpeg", "png"];

const UPLOADS_DIR: &str = "uploads";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("file for submission {0} is missing on disk")]
    FileMissing(String),
    #[error("storage error: {0}")]
    Store(StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ServiceError::NotFound(format!("Submission {id} not found")),
            StoreError::SlotTaken(id) => ServiceError::Conflict(format!(
                "A submission already exists for this assignment ({id}); set replace to overwrite it"
            )),
            StoreError::DuplicateId(id) => {
                ServiceError::Conflict(format!("Submission {id} is already being stored"))
            }
            other => ServiceError::Store(other),
        }
    }
}

/// The launched user on whose behalf an operation runs.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub user_name: String,
    pub resource_link_id: String,
    pub resource_title: String,
    pub instructor: bool,
}

impl Actor {
    fn owns(&self, submission: &Submission) -> bool {
        submission.user_id == self.user_id
    }

    fn teaches(&self, submission: &Submission) -> bool {
        self.instructor && submission.resource_link_id == self.resource_link_id
    }
}

/// A file received from the student, not yet stored.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
    pub comments: String,
    /// Id of the submission this upload supersedes, if any.
    pub replace: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QuestionnaireAnswers {
    pub time_spent: TimeSpent,
    pub difficulty: Difficulty,
    pub resources_used: Vec<Resource>,
    pub challenges: String,
    pub learnings: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubmissionStats {
    pub total: usize,
    pub with_questionnaire: usize,
    pub pending_questionnaire: usize,
    pub graded: usize,
}

impl SubmissionStats {
    pub fn from_submissions(submissions: &[Submission]) -> Self {
        let with_questionnaire = submissions.iter().filter(|s| s.has_questionnaire()).count();
        Self {
            total: submissions.len(),
            with_questionnaire,
            pending_questionnaire: submissions.len() - with_questionnaire,
            graded: submissions.iter().filter(|s| s.is_graded()).count(),
        }
    }
}

/// Checks an upload against the size limit and extension allow-list and
/// returns its lowercase extension.
pub fn validate_upload(file_name: &str, size: usize, max_bytes: usize) -> Result<String, ServiceError> {
    if file_name.trim().is_empty() || size == 0 {
        return Err(ServiceError::Validation("No file uploaded".into()));
    }
    if size > max_bytes {
        return Err(ServiceError::Validation(format!(
            "File exceeds the maximum size of {}",
            util::format::format_bytes(max_bytes as u64)
        )));
    }

    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ServiceError::Validation(format!(
            "File type not allowed. Allowed: {}",
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    Ok(ext)
}

fn stored_name(ext: &str) -> String {
    let stem: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();
    format!("{stem}.{ext}")
}

/// Submission workflow on top of the store: upload, questionnaire, grading
/// and downloads, with the access rules of each.
#[derive(Clone)]
pub struct SubmissionService {
    store: Arc<SubmissionStore>,
    storage_root: PathBuf,
    max_upload_bytes: usize,
}

impl SubmissionService {
    pub fn new(store: Arc<SubmissionStore>, storage_root: impl Into<PathBuf>, max_upload_bytes: usize) -> Self {
        Self {
            store,
            storage_root: storage_root.into(),
            max_upload_bytes,
        }
    }

    pub fn store(&self) -> &SubmissionStore {
        &self.store
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Absolute location of a stored file.
    pub fn resolve(&self, file: &UploadedFile) -> PathBuf {
        self.storage_root.join(&file.file_path)
    }

    /// Stores a new submission, or replaces the actor's existing one for
    /// this resource link when `upload.replace` names it.
    pub async fn upload(&self, actor: &Actor, upload: NewUpload) -> Result<Submission, ServiceError> {
        let ext = validate_upload(&upload.file_name, upload.bytes.len(), self.max_upload_bytes)?;

        // early answer before touching the disk; insert_for_user re-checks under the lock
        self.store
            .check_slot(&actor.user_id, &actor.resource_link_id, upload.replace.as_deref())?;

        let name = stored_name(&ext);
        let dir = self.storage_root.join(UPLOADS_DIR);
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(&name);
        tokio::fs::write(&path, &upload.bytes).await?;

        let now = Utc::now();
        let submission = Submission {
            submission_id: Submission::make_id(now, &actor.user_id, &actor.resource_link_id),
            user_id: actor.user_id.clone(),
            user_name: actor.user_name.clone(),
            resource_link_id: actor.resource_link_id.clone(),
            resource_title: actor.resource_title.clone(),
            file: UploadedFile {
                file_name: upload.file_name,
                file_path: format!("{UPLOADS_DIR}/{name}"),
                file_size: upload.bytes.len() as u64,
                content_type: upload.content_type,
            },
            comments: upload.comments,
            uploaded_at: now,
            questionnaire: None,
            grade: None,
            is_replacement: false,
        };

        let (saved, previous) = match self
            .store
            .insert_for_user(submission, upload.replace.as_deref())
        {
            Ok(saved) => saved,
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(&path).await {
                    warn!(error = %rm, file = %path.display(), "Failed to remove orphaned upload");
                }
                return Err(e.into());
            }
        };

        if let Some(prev) = previous {
            let old = self.resolve(&prev.file);
            if let Err(e) = tokio::fs::remove_file(&old).await {
                warn!(error = %e, file = %old.display(), "Failed to remove replaced upload");
            }
        }

        info!(
            submission_id = %saved.submission_id,
            user_id = %saved.user_id,
            size = saved.file.file_size,
            replacement = saved.is_replacement,
            "Submission stored"
        );
        Ok(saved)
    }

    /// Records the owner's questionnaire answers. A questionnaire is answered once.
    pub fn submit_questionnaire(
        &self,
        actor: &Actor,
        submission_id: &str,
        answers: QuestionnaireAnswers,
    ) -> Result<Submission, ServiceError> {
        let updated = self.store.update(submission_id, |s| {
            if !actor.owns(s) {
                return Err(ServiceError::Forbidden(
                    "Only the author can answer the questionnaire".into(),
                ));
            }
            if s.has_questionnaire() {
                return Err(ServiceError::Conflict(
                    "The questionnaire has already been completed".into(),
                ));
            }
            s.questionnaire = Some(Questionnaire {
                time_spent: answers.time_spent,
                difficulty: answers.difficulty,
                resources_used: answers.resources_used,
                challenges: answers.challenges,
                learnings: answers.learnings,
                completed_at: Utc::now(),
            });
            Ok(s.clone())
        })?;

        info!(submission_id, user_id = %actor.user_id, "Questionnaire completed");
        Ok(updated)
    }

    /// Sets (or overwrites) the grade of a submission.
    pub fn grade(
        &self,
        actor: &Actor,
        submission_id: &str,
        score: f64,
        feedback: String,
    ) -> Result<Submission, ServiceError> {
        if !Grade::is_valid_score(score) {
            return Err(ServiceError::Validation(format!(
                "Score must be between {} and {}",
                Grade::MIN_SCORE,
                Grade::MAX_SCORE
            )));
        }

        let updated = self.store.update(submission_id, |s| {
            if !actor.teaches(s) {
                return Err(ServiceError::Forbidden(
                    "Only an instructor of this assignment can grade it".into(),
                ));
            }
            s.grade = Some(Grade {
                score,
                feedback,
                graded_by: actor.user_name.clone(),
                graded_at: Utc::now(),
            });
            Ok(s.clone())
        })?;

        info!(submission_id, score, graded_by = %actor.user_id, "Submission graded");
        Ok(updated)
    }

    /// A submission visible to the actor: their own, or any of the resource
    /// link they teach.
    pub fn get(&self, actor: &Actor, submission_id: &str) -> Result<Submission, ServiceError> {
        let submission = self
            .store
            .get(submission_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Submission {submission_id} not found")))?;
        if actor.owns(&submission) || actor.teaches(&submission) {
            Ok(submission)
        } else {
            Err(ServiceError::Forbidden(
                "You do not have access to this submission".into(),
            ))
        }
    }

    /// The submission and the on-disk path of its file.
    pub fn download(&self, actor: &Actor, submission_id: &str) -> Result<(Submission, PathBuf), ServiceError> {
        let submission = self.get(actor, submission_id)?;
        let path = self.resolve(&submission.file);
        if !path.is_file() {
            warn!(submission_id, file = %path.display(), "Stored file missing");
            return Err(ServiceError::FileMissing(submission_id.to_string()));
        }
        Ok((submission, path))
    }

    /// Instructors see every submission of their resource link, learners only their own.
    pub fn list_for(&self, actor: &Actor) -> Vec<Submission> {
        if actor.instructor {
            self.store.list_for_resource_link(&actor.resource_link_id)
        } else {
            self.store
                .find_for_user(&actor.user_id, &actor.resource_link_id)
                .into_iter()
                .collect()
        }
    }

    pub fn stats(&self, resource_link_id: &str) -> SubmissionStats {
        SubmissionStats::from_submissions(&self.store.list_for_resource_link(resource_link_id))
    }
}
