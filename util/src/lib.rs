pub mod config;
pub mod format;
pub mod paths;
pub mod test_helpers;
