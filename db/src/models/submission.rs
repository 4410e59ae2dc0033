use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// How long the student spent on the assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
pub enum TimeSpent {
    #[serde(rename = "under-1h")]
    #[strum(serialize = "under-1h")]
    UnderOneHour,
    #[serde(rename = "1-2h")]
    #[strum(serialize = "1-2h")]
    OneToTwoHours,
    #[serde(rename = "2-4h")]
    #[strum(serialize = "2-4h")]
    TwoToFourHours,
    #[serde(rename = "over-4h")]
    #[strum(serialize = "over-4h")]
    OverFourHours,
}

impl TimeSpent {
    pub fn label(&self) -> &'static str {
        match self {
            TimeSpent::UnderOneHour => "Less than 1 hour",
            TimeSpent::OneToTwoHours => "Between 1 and 2 hours",
            TimeSpent::TwoToFourHours => "Between 2 and 4 hours",
            TimeSpent::OverFourHours => "More than 4 hours",
        }
    }
}

/// Perceived difficulty of the assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Difficulty {
    VeryEasy,
    Easy,
    Moderate,
    Hard,
    VeryHard,
}

impl Difficulty {
    pub fn label(&self) -> &'static str {
        match self {
            Difficulty::VeryEasy => "Very easy",
            Difficulty::Easy => "Easy",
            Difficulty::Moderate => "Moderate",
            Difficulty::Hard => "Hard",
            Difficulty::VeryHard => "Very hard",
        }
    }
}

/// Help the student relied on while working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Resource {
    Documentation,
    Tutorials,
    Forums,
    Peers,
    Instructor,
    None,
}

impl Resource {
    pub fn label(&self) -> &'static str {
        match self {
            Resource::Documentation => "Official documentation",
            Resource::Tutorials => "Online tutorials",
            Resource::Forums => "Forums / Stack Overflow",
            Resource::Peers => "Help from classmates",
            Resource::Instructor => "Asked the instructor",
            Resource::None => "No external resources",
        }
    }
}

/// Reflection answers recorded once per submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub time_spent: TimeSpent,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub resources_used: Vec<Resource>,
    pub challenges: String,
    pub learnings: String,
    pub completed_at: DateTime<Utc>,
}

/// Instructor's assessment of a submission, on a 0-10 scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub score: f64,
    #[serde(default)]
    pub feedback: String,
    pub graded_by: String,
    pub graded_at: DateTime<Utc>,
}

impl Grade {
    pub const MIN_SCORE: f64 = 0.0;
    pub const MAX_SCORE: f64 = 10.0;

    pub fn is_valid_score(score: f64) -> bool {
        score.is_finite() && (Self::MIN_SCORE..=Self::MAX_SCORE).contains(&score)
    }
}

/// Metadata of the file stored for a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Name as supplied by the student.
    pub file_name: String,
    /// Location on disk, relative to the storage root.
    pub file_path: String,
    pub file_size: u64,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// A student's submission for one resource link (assignment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub submission_id: String,
    pub user_id: String,
    pub user_name: String,
    pub resource_link_id: String,
    pub resource_title: String,
    pub file: UploadedFile,
    #[serde(default)]
    pub comments: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub questionnaire: Option<Questionnaire>,
    #[serde(default)]
    pub grade: Option<Grade>,
    #[serde(default)]
    pub is_replacement: bool,
}

impl Submission {
    /// Builds the identifier `sub_{unix_millis}_{user_id}_{resource_link_id}`.
    pub fn make_id(at: DateTime<Utc>, user_id: &str, resource_link_id: &str) -> String {
        format!("sub_{}_{}_{}", at.timestamp_millis(), user_id, resource_link_id)
    }

    /// A record is usable only with both identifiers present.
    pub fn is_valid(&self) -> bool {
        !self.submission_id.trim().is_empty() && !self.user_id.trim().is_empty()
    }

    pub fn has_questionnaire(&self) -> bool {
        self.questionnaire.is_some()
    }

    pub fn is_graded(&self) -> bool {
        self.grade.is_some()
    }

    pub fn belongs_to(&self, user_id: &str, resource_link_id: &str) -> bool {
        self.user_id == user_id && self.resource_link_id == resource_link_id
    }
}
