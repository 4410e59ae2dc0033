#[cfg(test)]
mod tests {
    use crate::helpers::launch::{INSTRUCTOR_ROLE, LEARNER_ROLE};
    use crate::helpers::{get_json_body, launch_session, make_test_app, make_test_app_with_moodle};
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use serial_test::serial;
    use tower::ServiceExt;

    async fn get(app: &Router, uri: &str, token: &str) -> Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn test_lms_routes_need_an_instructor() {
        let (app, _state, _tmp) = make_test_app();
        let student = launch_session(&app, "7", LEARNER_ROLE, "rl-1").await;

        let res = get(&app, "/api/lms/site-info", &student).await;
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    #[serial]
    async fn test_unconfigured_lms_is_unavailable() {
        let (app, _state, _tmp) = make_test_app();
        let teacher = launch_session(&app, "t1", INSTRUCTOR_ROLE, "rl-1").await;

        let res = get(&app, "/api/lms/site-info", &teacher).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

        let res = get(&app, "/api/lms/courses/3/assignments", &teacher).await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    #[serial]
    async fn test_config_masks_the_token() {
        let (app, _state, _tmp) = make_test_app_with_moodle();
        let teacher = launch_session(&app, "t1", INSTRUCTOR_ROLE, "rl-1").await;

        let res = get(&app, "/api/lms/config", &teacher).await;
        assert_eq!(res.status(), StatusCode::OK);
        let json = get_json_body(res).await;
        assert_eq!(json["data"]["token_configured"], true);
        assert_eq!(json["data"]["token_preview"], "01234567...");
        assert_eq!(json["data"]["endpoint"], "http://127.0.0.1:9/webservice/rest/server.php");
    }

    #[tokio::test]
    #[serial]
    async fn test_unreachable_lms_is_bad_gateway() {
        let (app, _state, _tmp) = make_test_app_with_moodle();
        let teacher = launch_session(&app, "t1", INSTRUCTOR_ROLE, "rl-1").await;

        let res = get(&app, "/api/lms/site-info", &teacher).await;
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

        let res = get(&app, "/api/lms/assignments?course_ids=2,x", &teacher).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
