//! Submission data model and its durable, file-backed store.

pub mod models;
pub mod store;

pub use models::submission::{
    Difficulty, Grade, Questionnaire, Resource, Submission, TimeSpent, UploadedFile,
};
pub use store::{StoreConfig, StoreError, SubmissionStore};

/// Opens the submission store at the locations named by the global config.
pub fn open_store() -> Result<SubmissionStore, StoreError> {
    SubmissionStore::open(StoreConfig::from_app_config())
}
