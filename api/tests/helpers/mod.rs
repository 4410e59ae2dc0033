pub mod app;
pub mod launch;

pub use app::{make_test_app, make_test_app_with_moodle};
pub use launch::{get_json_body, launch_session};
