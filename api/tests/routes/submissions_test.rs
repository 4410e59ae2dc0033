#[cfg(test)]
mod tests {
    use crate::helpers::app::MAX_UPLOAD;
    use crate::helpers::launch::{INSTRUCTOR_ROLE, LEARNER_ROLE};
    use crate::helpers::{get_json_body, launch_session, make_test_app};
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use serde_json::{Value, json};
    use serial_test::serial;
    use tower::ServiceExt;

    const BOUNDARY: &str = "----lti-test-boundary";

    fn multipart_body(file_name: &str, contents: &[u8], fields: &[(&str, &str)]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
                )
                .as_bytes(),
            );
        }
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(contents);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn upload(
        app: &Router,
        token: &str,
        file_name: &str,
        contents: &[u8],
        fields: &[(&str, &str)],
    ) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/submissions")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(
                        header::CONTENT_TYPE,
                        format!("multipart/form-data; boundary={BOUNDARY}"),
                    )
                    .body(Body::from(multipart_body(file_name, contents, fields)))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Response {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        app.clone().oneshot(req.body(body).unwrap()).await.unwrap()
    }

    fn questionnaire() -> Value {
        json!({
            "time_spent": "2-4h",
            "difficulty": "moderate",
            "resources_used": ["documentation", "peers"],
            "challenges": "Finding sources",
            "learnings": "How to structure an argument"
        })
    }

    #[tokio::test]
    #[serial]
    async fn test_full_submission_workflow() {
        let (app, state, tmp) = make_test_app();
        let student = launch_session(&app, "7", LEARNER_ROLE, "rl-1").await;
        let teacher = launch_session(&app, "t1", INSTRUCTOR_ROLE, "rl-1").await;

        // upload
        let res = upload(&app, &student, "essay.pdf", b"%PDF-1.4 essay", &[("comments", "My essay")]).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let json = get_json_body(res).await;
        let id = json["data"]["submission_id"].as_str().unwrap().to_string();
        assert!(id.starts_with("sub_"));
        assert_eq!(json["data"]["user_name"], "User 7");
        assert_eq!(json["data"]["comments"], "My essay");
        assert_eq!(json["data"]["file"]["file_size"], 14);
        assert!(tmp.path().join("submissions.json").is_file());

        // questionnaire
        let res = send(&app, "POST", &format!("/api/submissions/{id}/questionnaire"), Some(&student), Some(questionnaire())).await;
        assert_eq!(res.status(), StatusCode::OK);
        let json = get_json_body(res).await;
        assert_eq!(json["data"]["questionnaire"]["time_spent"], "2-4h");

        let res = send(&app, "POST", &format!("/api/submissions/{id}/questionnaire"), Some(&student), Some(questionnaire())).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        // grade
        let res = send(&app, "POST", &format!("/api/submissions/{id}/grade"), Some(&teacher), Some(json!({ "score": 8.5, "feedback": "Solid" }))).await;
        assert_eq!(res.status(), StatusCode::OK);
        let json = get_json_body(res).await;
        assert_eq!(json["data"]["grade"]["score"], 8.5);
        assert_eq!(json["data"]["grade"]["graded_by"], "User t1");

        // instructor listing
        let res = send(&app, "GET", "/api/submissions", Some(&teacher), None).await;
        let json = get_json_body(res).await;
        assert_eq!(json["data"]["submissions"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"]["stats"]["with_questionnaire"], 1);
        assert_eq!(json["data"]["stats"]["graded"], 1);

        // learner listing has no stats
        let json = get_json_body(send(&app, "GET", "/api/submissions", Some(&student), None).await).await;
        assert_eq!(json["data"]["submissions"][0]["submission_id"], id.as_str());
        assert!(json["data"].get("stats").is_none());

        // download
        let res = send(&app, "GET", &format!("/api/submissions/{id}/download"), Some(&teacher), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"essay.pdf\""
        );
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/pdf");
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4 essay");

        // the store survived on disk
        assert_eq!(state.submissions().store().len(), 1);
    }

    #[tokio::test]
    #[serial]
    async fn test_second_upload_requires_replace() {
        let (app, _state, _tmp) = make_test_app();
        let student = launch_session(&app, "7", LEARNER_ROLE, "rl-1").await;

        let first = get_json_body(upload(&app, &student, "a.txt", b"one", &[]).await).await;
        let first_id = first["data"]["submission_id"].as_str().unwrap().to_string();

        let res = upload(&app, &student, "b.txt", b"two", &[]).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);

        let res = upload(&app, &student, "b.txt", b"two", &[("replace", first_id.as_str())]).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let json = get_json_body(res).await;
        assert_eq!(json["data"]["is_replacement"], true);
        assert_ne!(json["data"]["submission_id"], first_id.as_str());

        let res = send(&app, "GET", &format!("/api/submissions/{first_id}"), Some(&student), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn test_upload_validation() {
        let (app, _state, _tmp) = make_test_app();
        let student = launch_session(&app, "7", LEARNER_ROLE, "rl-1").await;

        let res = upload(&app, &student, "virus.exe", b"MZ", &[]).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = upload(&app, &student, "empty.pdf", b"", &[]).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let big = vec![b'a'; MAX_UPLOAD + 1];
        let res = upload(&app, &student, "big.txt", &big, &[]).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[serial]
    async fn test_authorization_rules() {
        let (app, _state, _tmp) = make_test_app();
        let student = launch_session(&app, "7", LEARNER_ROLE, "rl-1").await;
        let other = launch_session(&app, "8", LEARNER_ROLE, "rl-1").await;
        let teacher = launch_session(&app, "t1", INSTRUCTOR_ROLE, "rl-1").await;
        let other_teacher = launch_session(&app, "t2", INSTRUCTOR_ROLE, "rl-2").await;

        let json = get_json_body(upload(&app, &student, "a.pdf", b"%PDF", &[]).await).await;
        let id = json["data"]["submission_id"].as_str().unwrap().to_string();

        // no session
        let res = send(&app, "GET", "/api/submissions", None, None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let res = send(&app, "GET", "/api/submissions", Some("not-a-token"), None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        // instructors do not upload
        let res = upload(&app, &teacher, "a.pdf", b"%PDF", &[]).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        // learners do not grade
        let res = send(&app, "POST", &format!("/api/submissions/{id}/grade"), Some(&student), Some(json!({ "score": 10 }))).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        // instructors of another resource link see nothing
        let res = send(&app, "GET", &format!("/api/submissions/{id}"), Some(&other_teacher), None).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        // classmates cannot read, answer or download
        let res = send(&app, "GET", &format!("/api/submissions/{id}"), Some(&other), None).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let res = send(&app, "POST", &format!("/api/submissions/{id}/questionnaire"), Some(&other), Some(questionnaire())).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
        let res = send(&app, "GET", &format!("/api/submissions/{id}/download"), Some(&other), None).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);

        // out-of-range grade
        let res = send(&app, "POST", &format!("/api/submissions/{id}/grade"), Some(&teacher), Some(json!({ "score": 11 }))).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        // unknown submission
        let res = send(&app, "GET", "/api/submissions/sub_0_7_rl-1", Some(&teacher), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn test_invalid_questionnaire_is_rejected() {
        let (app, _state, _tmp) = make_test_app();
        let student = launch_session(&app, "7", LEARNER_ROLE, "rl-1").await;
        let json = get_json_body(upload(&app, &student, "a.pdf", b"%PDF", &[]).await).await;
        let id = json["data"]["submission_id"].as_str().unwrap().to_string();

        let mut bad = questionnaire();
        bad["difficulty"] = json!("impossible");
        let res = send(&app, "POST", &format!("/api/submissions/{id}/questionnaire"), Some(&student), Some(bad)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let mut empty = questionnaire();
        empty["learnings"] = json!("");
        let res = send(&app, "POST", &format!("/api/submissions/{id}/questionnaire"), Some(&student), Some(empty)).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json = get_json_body(res).await;
        assert!(json["message"].as_str().unwrap().contains("learnings"));
    }

    #[tokio::test]
    #[serial]
    async fn test_download_of_missing_file_is_not_found() {
        let (app, state, tmp) = make_test_app();
        let student = launch_session(&app, "7", LEARNER_ROLE, "rl-1").await;
        let json = get_json_body(upload(&app, &student, "a.pdf", b"%PDF", &[]).await).await;
        let id = json["data"]["submission_id"].as_str().unwrap().to_string();

        let stored = state.submissions().store().get(&id).unwrap();
        std::fs::remove_file(tmp.path().join(&stored.file.file_path)).unwrap();

        let res = send(&app, "GET", &format!("/api/submissions/{id}/download"), Some(&student), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn test_debug_dump_lists_everything() {
        let (app, _state, _tmp) = make_test_app();
        let a = launch_session(&app, "7", LEARNER_ROLE, "rl-1").await;
        let b = launch_session(&app, "8", LEARNER_ROLE, "rl-2").await;
        upload(&app, &a, "a.pdf", b"%PDF", &[]).await;
        upload(&app, &b, "b.pdf", b"%PDF", &[]).await;

        let json = get_json_body(send(&app, "GET", "/api/debug/submissions", None, None).await).await;
        assert_eq!(json["data"]["total"], 2);
    }
}
