use crate::config;
use std::{fs, io, path::{Path, PathBuf}};

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

/// Ensure the parent directory of a *file path* exists (no-op if none).
pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Resolve a possibly relative path against the current working directory.
pub fn absolute<P: AsRef<Path>>(path: P) -> PathBuf {
    let p = path.as_ref();
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(p)
    }
}

/// Global storage root (absolute), from `config::storage_root()`.
pub fn storage_root() -> PathBuf {
    absolute(config::storage_root())
}

/// The JSON file backing the submission store.
pub fn submissions_file() -> PathBuf {
    absolute(config::submissions_file())
}

/// Directory holding rotated copies of the submission file.
pub fn backup_dir() -> PathBuf {
    absolute(config::backup_dir())
}

/// The tool's key set (JWKS with private members).
pub fn keys_file() -> PathBuf {
    absolute(config::keys_file())
}
