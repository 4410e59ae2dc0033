//! JSON-file-backed submission store.
//!
//! All submissions live in memory and are mirrored to a single pretty-printed
//! JSON object on disk, keyed by submission id. Every mutation goes through
//! [`SubmissionStore::commit`], which serializes writers behind one lock,
//! rotates a timestamped backup of the previous file, writes and fsyncs a
//! temp file, re-parses it, renames it into place and fsyncs the directory. The in-memory map is swapped only
//! after the rename succeeds, so a caller that receives `Ok` knows the change
//! is on disk, and a caller that receives `Err` knows nothing changed.

use crate::models::submission::Submission;
use chrono::Utc;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use util::paths;

const BACKUP_PREFIX: &str = "submissions_backup_";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("submission not found: {0}")]
    NotFound(String),
    #[error("submission already exists: {0}")]
    DuplicateId(String),
    #[error("user already has submission {0} for this resource link")]
    SlotTaken(String),
}

fn slot_available(current: Option<&str>, replace: Option<&str>) -> Result<(), StoreError> {
    match (current, replace) {
        (Some(cur), Some(id)) if cur == id => Ok(()),
        (Some(cur), _) => Err(StoreError::SlotTaken(cur.to_string())),
        (None, Some(id)) => Err(StoreError::NotFound(id.to_string())),
        (None, None) => Ok(()),
    }
}

/// Where the store keeps its data and how many backups it retains.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_file: PathBuf,
    pub backup_dir: PathBuf,
    pub max_backups: usize,
}

impl StoreConfig {
    /// Builds the store settings from the global `AppConfig`.
    pub fn from_app_config() -> Self {
        Self {
            data_file: paths::submissions_file(),
            backup_dir: paths::backup_dir(),
            max_backups: util::config::max_backups(),
        }
    }

    /// Convenience for tests and tools: everything under one directory.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            data_file: dir.join("submissions.json"),
            backup_dir: dir.join("backups"),
            max_backups: 5,
        }
    }

    fn temp_file(&self) -> PathBuf {
        let mut name = self.data_file.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

pub struct SubmissionStore {
    config: StoreConfig,
    entries: RwLock<BTreeMap<String, Submission>>,
    write_lock: Mutex<()>,
}

impl SubmissionStore {
    /// Opens the store, creating its directories and loading whatever is on
    /// disk. A corrupt data file is replaced by the newest readable backup.
    pub fn open(config: StoreConfig) -> Result<Self, StoreError> {
        paths::ensure_dir(&config.backup_dir)?;
        paths::ensure_parent_dir(&config.data_file)?;

        let entries = load_entries(&config);
        info!(count = entries.len(), file = %config.data_file.display(), "Submission store loaded");

        Ok(Self {
            config,
            entries: RwLock::new(entries),
            write_lock: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn get(&self, submission_id: &str) -> Option<Submission> {
        self.read().get(submission_id).cloned()
    }

    /// All submissions, oldest upload first.
    pub fn list(&self) -> Vec<Submission> {
        let mut all: Vec<Submission> = self.read().values().cloned().collect();
        all.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at));
        all
    }

    pub fn list_for_resource_link(&self, resource_link_id: &str) -> Vec<Submission> {
        self.list()
            .into_iter()
            .filter(|s| s.resource_link_id == resource_link_id)
            .collect()
    }

    /// The submission a user made for a resource link, if any.
    pub fn find_for_user(&self, user_id: &str, resource_link_id: &str) -> Option<Submission> {
        self.read()
            .values()
            .find(|s| s.belongs_to(user_id, resource_link_id))
            .cloned()
    }

    pub fn insert(&self, submission: Submission) -> Result<Submission, StoreError> {
        self.commit(|entries| {
            if entries.contains_key(&submission.submission_id) {
                return Err(StoreError::DuplicateId(submission.submission_id.clone()));
            }
            entries.insert(submission.submission_id.clone(), submission.clone());
            Ok(submission)
        })
    }

    /// Fails unless `replace` names the user's current submission for the
    /// link, or is `None` while the user has none.
    pub fn check_slot(
        &self,
        user_id: &str,
        resource_link_id: &str,
        replace: Option<&str>,
    ) -> Result<(), StoreError> {
        let current = self
            .find_for_user(user_id, resource_link_id)
            .map(|s| s.submission_id);
        slot_available(current.as_deref(), replace)
    }

    /// Stores `submission` as its author's only one for its resource link,
    /// displacing the record `replace` names. The slot is checked under the
    /// write lock, so concurrent uploads for one (user, link) cannot both
    /// land. Returns the saved record and the one it displaced.
    pub fn insert_for_user(
        &self,
        mut submission: Submission,
        replace: Option<&str>,
    ) -> Result<(Submission, Option<Submission>), StoreError> {
        self.commit(|entries| {
            let current = entries
                .values()
                .find(|s| s.belongs_to(&submission.user_id, &submission.resource_link_id))
                .map(|s| s.submission_id.clone());
            slot_available(current.as_deref(), replace)?;

            let previous = current.and_then(|id| entries.remove(&id));
            if entries.contains_key(&submission.submission_id) {
                return Err(StoreError::DuplicateId(submission.submission_id.clone()));
            }
            submission.is_replacement = previous.is_some();
            entries.insert(submission.submission_id.clone(), submission.clone());
            Ok((submission, previous))
        })
    }

    /// Applies `f` to one submission and persists the result.
    ///
    /// If `f` fails nothing is written.
    pub fn update<T, E, F>(&self, submission_id: &str, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Submission) -> Result<T, E>,
        E: From<StoreError>,
    {
        self.commit(|entries| {
            let entry = entries
                .get_mut(submission_id)
                .ok_or_else(|| E::from(StoreError::NotFound(submission_id.to_string())))?;
            f(entry)
        })
    }

    pub fn remove(&self, submission_id: &str) -> Result<Submission, StoreError> {
        self.commit(|entries| {
            entries
                .remove(submission_id)
                .ok_or_else(|| StoreError::NotFound(submission_id.to_string()))
        })
    }

    /// Runs `mutate` against a copy of the map and publishes the copy only
    /// once it is safely on disk.
    pub fn commit<T, E, F>(&self, mutate: F) -> Result<T, E>
    where
        F: FnOnce(&mut BTreeMap<String, Submission>) -> Result<T, E>,
        E: From<StoreError>,
    {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut next = self.read().clone();
        let out = mutate(&mut next)?;

        self.persist(&next).map_err(E::from)?;
        *self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;

        Ok(out)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<String, Submission>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, entries: &BTreeMap<String, Submission>) -> Result<(), StoreError> {
        if let Err(e) = self.create_backup() {
            warn!(error = %e, "Failed to create submissions backup");
        }

        let tmp = self.config.temp_file();
        let result = write_validated(&tmp, &self.config.data_file, entries);
        match &result {
            Ok(()) => debug!(count = entries.len(), "Submissions saved to disk"),
            Err(e) => {
                error!(error = %e, "Failed to save submissions");
                if tmp.exists() {
                    let _ = fs::remove_file(&tmp);
                }
            }
        }
        result
    }

    /// Copies the current data file into the backup directory and prunes
    /// old copies down to `max_backups`.
    fn create_backup(&self) -> Result<(), StoreError> {
        if !self.config.data_file.exists() {
            return Ok(());
        }

        let stamp = Utc::now()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let backup = self
            .config
            .backup_dir
            .join(format!("{BACKUP_PREFIX}{stamp}.json"));
        fs::copy(&self.config.data_file, &backup)?;

        let mut backups = list_backups(&self.config.backup_dir)?;
        while backups.len() > self.config.max_backups {
            let oldest = backups.remove(0);
            fs::remove_file(&oldest)?;
            debug!(file = %oldest.display(), "Old backup removed");
        }
        Ok(())
    }
}

fn write_validated(
    tmp: &Path,
    target: &Path,
    entries: &BTreeMap<String, Submission>,
) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(entries)?;
    let mut file = File::create(tmp)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    drop(file);

    let written = fs::read_to_string(tmp)?;
    serde_json::from_str::<Value>(&written)?;

    fs::rename(tmp, target)?;
    if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
        sync_directory(parent)?;
    }
    Ok(())
}

#[cfg(unix)]
fn sync_directory(path: &Path) -> std::io::Result<()> {
    File::open(path)?.sync_all()
}

#[cfg(not(unix))]
fn sync_directory(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

/// Backup files in ascending (oldest first) order.
fn list_backups(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut backups: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(BACKUP_PREFIX))
        })
        .collect();
    backups.sort();
    Ok(backups)
}

fn load_entries(config: &StoreConfig) -> BTreeMap<String, Submission> {
    if !config.data_file.exists() {
        info!("No saved submissions yet");
        return BTreeMap::new();
    }

    let parsed = fs::read_to_string(&config.data_file)
        .map_err(|e| warn!(error = %e, "Cannot read submissions file"))
        .ok()
        .and_then(|raw| parse_entries(&raw));

    match parsed {
        Some(entries) => entries,
        None => {
            warn!("Submissions file is corrupt, recovering from backup");
            recover_from_backup(config)
        }
    }
}

/// Parses a data file. `None` means the file as a whole is unusable; single
/// bad records are skipped.
fn parse_entries(raw: &str) -> Option<BTreeMap<String, Submission>> {
    let value: Value = serde_json::from_str(raw).ok()?;
    let object = value.as_object()?;

    let mut entries = BTreeMap::new();
    for (id, record) in object {
        match serde_json::from_value::<Submission>(record.clone()) {
            Ok(submission) if submission.is_valid() => {
                entries.insert(id.clone(), submission);
            }
            _ => warn!(submission_id = %id, "Skipping incomplete submission record"),
        }
    }
    Some(entries)
}

fn recover_from_backup(config: &StoreConfig) -> BTreeMap<String, Submission> {
    let backups = match list_backups(&config.backup_dir) {
        Ok(b) => b,
        Err(e) => {
            error!(error = %e, "Cannot list backups");
            return BTreeMap::new();
        }
    };

    for backup in backups.iter().rev() {
        let recovered = fs::read_to_string(backup)
            .ok()
            .and_then(|raw| parse_entries(&raw));
        if let Some(entries) = recovered {
            info!(count = entries.len(), backup = %backup.display(), "Recovered submissions from backup");
            return entries;
        }
        warn!(backup = %backup.display(), "Backup unreadable, trying an older one");
    }

    warn!("No usable backups available, starting empty");
    BTreeMap::new()
}
