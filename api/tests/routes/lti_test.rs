#[cfg(test)]
mod tests {
    use crate::helpers::app::{BASE_URL, CLIENT_ID, ISSUER};
    use crate::helpers::launch::{
        INSTRUCTOR_ROLE, LEARNER_ROLE, launch_claims, post_launch, sign_platform_token,
        start_login,
    };
    use crate::helpers::{get_json_body, make_test_app};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serial_test::serial;
    use tower::ServiceExt;

    async fn get(app: &axum::Router, uri: &str) -> axum::response::Response {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    #[serial]
    async fn test_registration_and_discovery_documents() {
        let (app, _state, _tmp) = make_test_app();

        let json = get_json_body(get(&app, "/").await).await;
        assert_eq!(json["data"]["initiate_login_url"], format!("{BASE_URL}/login"));
        assert_eq!(json["data"]["redirection_uri"], format!("{BASE_URL}/launch"));
        assert_eq!(json["data"]["public_keyset_url"], format!("{BASE_URL}/jwks.json"));

        let oidc = get_json_body(get(&app, "/.well-known/openid-configuration").await).await;
        assert_eq!(oidc["issuer"], BASE_URL);
        assert_eq!(oidc["token_endpoint"], format!("{BASE_URL}/token"));
        assert_eq!(oidc["response_types_supported"][0], "id_token");
    }

    #[tokio::test]
    #[serial]
    async fn test_jwks_publishes_only_public_members() {
        let (app, _state, _tmp) = make_test_app();

        let res = get(&app, "/jwks.json").await;
        assert_eq!(res.status(), StatusCode::OK);
        let jwks = get_json_body(res).await;
        let key = &jwks["keys"][0];
        assert_eq!(key["kid"], "tool-test-key");
        assert!(key["n"].is_string());
        for private in ["d", "p", "q", "dp", "dq", "qi"] {
            assert!(key.get(private).is_none(), "{private} published");
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_login_redirects_to_platform() {
        let (app, state, _tmp) = make_test_app();

        let uri = format!(
            "/login?iss={ISSUER}&login_hint=7&target_link_uri={BASE_URL}/launch&client_id={CLIENT_ID}&lti_message_hint=abc"
        );
        let res = get(&app, &uri).await;
        assert_eq!(res.status(), StatusCode::SEE_OTHER);

        let location = res.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://moodle.example.edu/mod/lti/auth.php?"));
        assert!(location.contains("redirect_uri=https%3A%2F%2Ftool.example.edu%2Flaunch"));
        assert!(location.contains("lti_message_hint=abc"));
        assert!(location.contains("prompt=none"));
        assert_eq!(state.oidc_states().len(), 1);
    }

    #[tokio::test]
    #[serial]
    async fn test_login_post_form_is_accepted() {
        let (app, _state, _tmp) = make_test_app();

        let body = format!(
            "iss={ISSUER}&login_hint=7&target_link_uri={BASE_URL}%2Flaunch&client_id={CLIENT_ID}"
        );
        let res = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::SEE_OTHER);
    }

    #[tokio::test]
    #[serial]
    async fn test_login_missing_parameter_is_named() {
        let (app, _state, _tmp) = make_test_app();

        let res = get(&app, &format!("/login?iss={ISSUER}&login_hint=7&target_link_uri=x")).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let json = get_json_body(res).await;
        assert_eq!(json["success"], false);
        assert!(json["message"].as_str().unwrap().contains("client_id"));
    }

    #[tokio::test]
    #[serial]
    async fn test_login_from_unknown_issuer_is_refused() {
        let (app, state, _tmp) = make_test_app();

        let res = get(
            &app,
            &format!("/login?iss=https://evil.example.com&login_hint=7&target_link_uri=x&client_id={CLIENT_ID}"),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert!(state.oidc_states().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_learner_launch_returns_session() {
        let (app, state, _tmp) = make_test_app();
        let (st, nonce) = start_login(&app).await;

        let token = sign_platform_token(&launch_claims("7", LEARNER_ROLE, "rl-1", &nonce));
        let res = post_launch(&app, &token, &st).await;
        assert_eq!(res.status(), StatusCode::OK);

        let json = get_json_body(res).await;
        assert_eq!(json["success"], true);
        assert!(json["data"]["token"].as_str().unwrap().len() > 20);
        assert_eq!(json["data"]["context"]["user_id"], "7");
        assert_eq!(json["data"]["context"]["role"], "learner");
        assert_eq!(json["data"]["context"]["resource_title"], "Essay 1");
        assert_eq!(json["data"]["context"]["context_title"], "Databases");
        assert_eq!(json["data"]["view"], "learner");
        assert!(json["data"]["submission"].is_null());
        assert!(state.oidc_states().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_instructor_launch_includes_stats() {
        let (app, _state, _tmp) = make_test_app();
        let (st, nonce) = start_login(&app).await;

        let token = sign_platform_token(&launch_claims("t1", INSTRUCTOR_ROLE, "rl-1", &nonce));
        let json = get_json_body(post_launch(&app, &token, &st).await).await;

        assert_eq!(json["data"]["view"], "instructor");
        assert_eq!(json["data"]["context"]["role"], "instructor");
        assert_eq!(json["data"]["stats"]["total"], 0);
        assert!(json["data"]["submissions"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    #[serial]
    async fn test_state_is_single_use() {
        let (app, _state, _tmp) = make_test_app();
        let (st, nonce) = start_login(&app).await;
        let token = sign_platform_token(&launch_claims("7", LEARNER_ROLE, "rl-1", &nonce));

        assert_eq!(post_launch(&app, &token, &st).await.status(), StatusCode::OK);
        assert_eq!(post_launch(&app, &token, &st).await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[serial]
    async fn test_failed_launch_still_spends_state() {
        let (app, _state, _tmp) = make_test_app();
        let (st, nonce) = start_login(&app).await;

        let bad = sign_platform_token(&launch_claims("7", LEARNER_ROLE, "rl-1", "wrong-nonce"));
        assert_eq!(post_launch(&app, &bad, &st).await.status(), StatusCode::UNAUTHORIZED);

        let good = sign_platform_token(&launch_claims("7", LEARNER_ROLE, "rl-1", &nonce));
        assert_eq!(post_launch(&app, &good, &st).await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[serial]
    async fn test_launch_rejections() {
        let (app, _state, _tmp) = make_test_app();

        // unknown state
        let (_, nonce) = start_login(&app).await;
        let token = sign_platform_token(&launch_claims("7", LEARNER_ROLE, "rl-1", &nonce));
        assert_eq!(post_launch(&app, &token, "forged").await.status(), StatusCode::BAD_REQUEST);

        // missing id_token
        let (st, _) = start_login(&app).await;
        assert_eq!(post_launch(&app, "", &st).await.status(), StatusCode::BAD_REQUEST);

        // wrong audience
        let (st, nonce) = start_login(&app).await;
        let mut claims = launch_claims("7", LEARNER_ROLE, "rl-1", &nonce);
        claims["aud"] = serde_json::json!("someone-else");
        let res = post_launch(&app, &sign_platform_token(&claims), &st).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        // malformed token
        let (st, _) = start_login(&app).await;
        assert_eq!(post_launch(&app, "abc.def", &st).await.status(), StatusCode::BAD_REQUEST);
    }
}
