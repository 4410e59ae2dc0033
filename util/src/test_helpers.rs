use crate::config::AppConfig;
use tempfile::TempDir;

/// Creates a unique temporary directory and points every storage setting
/// (`STORAGE_ROOT`, the submission file and the backup directory) at it.
///
/// Keep the returned `TempDir` in scope for as long as you need the files.
pub fn setup_test_storage_root() -> TempDir {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let abs = tmp
        .path()
        .canonicalize()
        .unwrap_or_else(|_| tmp.path().to_path_buf());

    AppConfig::set_storage_root(abs.to_string_lossy());
    AppConfig::set_submissions_file(abs.join("submissions.json").to_string_lossy());
    AppConfig::set_backup_dir(abs.join("backups").to_string_lossy());
    tmp
}
