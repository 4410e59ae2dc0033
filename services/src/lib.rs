pub mod moodle;
pub mod submission_service;

pub use moodle::{MoodleClient, MoodleConfig, MoodleError};
pub use submission_service::{
    Actor, NewUpload, QuestionnaireAnswers, ServiceError, SubmissionService, SubmissionStats,
};
