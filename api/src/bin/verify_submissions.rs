//! Prints every submission the running server holds.
//!
//! ```text
//! cargo run --bin verify_submissions
//! ```
//!
//! Reads `BASE_URL` from the environment (or `.env`) and calls
//! `{BASE_URL}/api/debug/submissions`, which is only mounted outside production.

use db::Submission;
use serde::Deserialize;
use std::process::ExitCode;
use util::config;
use util::format::{format_bytes, format_timestamp, truncate};

const PREVIEW_LEN: usize = 50;

#[derive(Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Dump>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct Dump {
    total: usize,
    submissions: Vec<Submission>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let url = format!("{}/api/debug/submissions", config::base_url());
    println!("Checking submissions at {url}\n");

    let response = match reqwest::get(&url).await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Could not reach the server: {e}");
            eprintln!("Hint: start it with `cargo run --bin api` and check BASE_URL.");
            return ExitCode::FAILURE;
        }
    };

    let envelope: Envelope = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Unexpected response: {e}");
            eprintln!("Hint: /api/debug is not mounted when APP_ENV=production.");
            return ExitCode::FAILURE;
        }
    };

    let Some(dump) = envelope.data.filter(|_| envelope.success) else {
        eprintln!("Server reported an error: {}", envelope.message);
        return ExitCode::FAILURE;
    };

    println!("Total submissions: {}\n", dump.total);
    if dump.submissions.is_empty() {
        println!("No submissions yet.");
    }
    for (i, submission) in dump.submissions.iter().enumerate() {
        print_submission(i + 1, submission);
    }
    ExitCode::SUCCESS
}

fn print_submission(n: usize, s: &Submission) {
    println!("#{n} {}", s.submission_id);
    println!("   Student:    {} ({})", s.user_name, s.user_id);
    println!("   Assignment: {} ({})", s.resource_title, s.resource_link_id);
    println!("   File:       {} ({})", s.file.file_name, format_bytes(s.file.file_size));
    println!("   Path:       {}", s.file.file_path);
    if !s.comments.is_empty() {
        println!("   Comments:   {}", truncate(&s.comments, PREVIEW_LEN));
    }
    println!("   Uploaded:   {}", format_timestamp(&s.uploaded_at));
    if s.is_replacement {
        println!("   (replaces an earlier upload)");
    }

    match &s.questionnaire {
        Some(q) => {
            let resources: Vec<&str> = q.resources_used.iter().map(|r| r.label()).collect();
            println!("   Questionnaire:");
            println!("      Time spent: {}", q.time_spent.label());
            println!("      Difficulty: {}", q.difficulty.label());
            println!("      Resources:  {}", resources.join(", "));
            println!("      Challenges: {}", truncate(&q.challenges, PREVIEW_LEN));
            println!("      Learnings:  {}", truncate(&q.learnings, PREVIEW_LEN));
        }
        None => println!("   Questionnaire pending"),
    }

    if let Some(g) = &s.grade {
        println!("   Grade:      {:.1}/10 by {}", g.score, g.graded_by);
        if !g.feedback.is_empty() {
            println!("      Feedback: {}", truncate(&g.feedback, PREVIEW_LEN));
        }
    }
    println!();
}
