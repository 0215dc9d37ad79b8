mod common;

use anyhow::Result;
use common::{can_bind_localhost, endpoint, harness, profile_json, user_with_token_json};
use idgate::{
    gateway::ApiRequest,
    models::{AddFriend, CreateUser, LoginByIdentifier, UpdatePassword, UserWithToken},
    schema::registry,
    StatusClass, APP_USER_AGENT, GIT_COMMIT_HASH,
};
use serde_json::json;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn invalid_payload_is_rejected_without_network() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    let user = CreateUser {
        username: "bad name".to_string(),
        email: "not-an-email".to_string(),
        avatar: None,
        password: "ok-pass".to_string(),
    };
    let err = h.gateway.register(&user).await.unwrap_err();

    assert!(err.is(StatusClass::ClientValidation));
    let issues = err.issues().expect("validation issues");
    assert!(issues.at("username").is_some());
    assert!(issues.at("email").is_some());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}

#[tokio::test]
async fn password_outside_the_charset_never_reaches_the_server() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    let credentials = LoginByIdentifier {
        identifier: "alice".to_string(),
        password: "pass word".to_string(),
    };
    let err = h.gateway.login(&credentials).await.unwrap_err();
    assert!(err.is(StatusClass::ClientValidation));
    assert!(err.issues().is_some_and(|issues| issues.at("password").is_some()));

    let passwords = UpdatePassword {
        old_password: "secret1".to_string(),
        new_password: "s~cret2".to_string(),
    };
    let err = h.gateway.update_password(&passwords).await.unwrap_err();
    assert!(err.is(StatusClass::ClientValidation));
    assert!(err.issues().is_some_and(|issues| issues.at("newPassword").is_some()));

    assert!(server.received_requests().await.unwrap_or_default().is_empty());
    Ok(())
}

#[tokio::test]
async fn payload_without_schema_is_a_contract_violation() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    let err = h
        .gateway
        .call(ApiRequest::post("/friends").payload(json!({ "userId": 1 })))
        .await
        .unwrap_err();

    assert_eq!(err.class(), StatusClass::ClientValidation);
    assert_eq!(err.status(), 400);
    Ok(())
}

#[tokio::test]
async fn normalized_payload_is_sent() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("/")))
        .and(body_json(json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "secret1"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(profile_json(1, false)))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    let user = CreateUser {
        username: "  alice ".to_string(),
        email: " alice@example.com".to_string(),
        avatar: None,
        password: "secret1 ".to_string(),
    };
    let profile = h.gateway.register(&user).await?;

    assert_eq!(profile.id, 1);
    assert!(!h.session.is_active());
    Ok(())
}

#[tokio::test]
async fn bearer_token_is_attached_only_when_held() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint("/me")))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(7, false)))
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    h.gateway.profile().await?;

    let user: UserWithToken = serde_json::from_value(user_with_token_json(7, false, "tok-7"))?;
    h.session.login(user);
    h.gateway.profile().await?;

    let requests = server.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].headers.get("authorization").is_none());
    assert_eq!(
        requests[1]
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok()),
        Some("Bearer tok-7")
    );
    Ok(())
}

#[tokio::test]
async fn requests_carry_the_build_in_the_user_agent() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint("/me")))
        .and(header("user-agent", APP_USER_AGENT.as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_json(7, false)))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    h.gateway.profile().await?;

    assert!(APP_USER_AGENT.contains(GIT_COMMIT_HASH));
    Ok(())
}

#[tokio::test]
async fn unauthenticated_response_redirects_unless_suppressed() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid token" })),
        )
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    let err = h.gateway.profile().await.unwrap_err();
    assert!(err.is(StatusClass::Unauthenticated));
    assert_eq!(err.message(), "Invalid token");
    assert_eq!(h.redirect.paths(), vec!["/user/reset".to_string()]);

    let passwords = UpdatePassword {
        old_password: "secret1".to_string(),
        new_password: "secret2".to_string(),
    };
    let err = h.gateway.update_password(&passwords).await.unwrap_err();
    assert!(err.is(StatusClass::Unauthenticated));
    assert_eq!(h.redirect.paths().len(), 1);
    Ok(())
}

#[tokio::test]
async fn response_missing_a_field_is_a_server_error() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    let mut body = profile_json(7, false);
    if let Some(object) = body.as_object_mut() {
        object.remove("id");
    }
    Mock::given(method("GET"))
        .and(path(endpoint("/me")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    let err = h.gateway.profile().await.unwrap_err();

    assert_eq!(err.class(), StatusClass::Server);
    assert!(err.message().starts_with("Invalid response format"));
    assert!(err.issues().is_some_and(|issues| issues.at("id").is_some()));
    Ok(())
}

#[tokio::test]
async fn unparseable_body_is_a_server_error() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(endpoint("/friends")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    let err = h.gateway.friends().await.unwrap_err();

    assert_eq!(err.class(), StatusClass::Server);
    assert_eq!(err.message(), "Invalid JSON response from server");
    Ok(())
}

#[tokio::test]
async fn error_statuses_map_to_their_class() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("/")))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({ "error": "Username taken" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(endpoint("/")))
        .respond_with(ResponseTemplate::new(418).set_body_string("teapot"))
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    let user = CreateUser {
        username: "alice".to_string(),
        email: "alice@example.com".to_string(),
        avatar: None,
        password: "secret1".to_string(),
    };
    let err = h.gateway.register(&user).await.unwrap_err();
    assert_eq!(err.class(), StatusClass::Conflict);
    assert_eq!(err.message(), "Username taken");

    let err = h.gateway.users().await.unwrap_err();
    assert_eq!(err.class(), StatusClass::Server);
    assert_eq!(err.status(), 418);
    assert_eq!(err.message(), "Unknown error occurred");
    assert!(h.redirect.paths().is_empty());
    Ok(())
}

#[tokio::test]
async fn operations_without_response_schema_ignore_the_body() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("/friends")))
        .and(body_json(json!({ "userId": 9 })))
        .respond_with(ResponseTemplate::new(201).set_body_string("created"))
        .expect(1)
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    h.gateway.add_friend(&AddFriend { user_id: 9 }).await?;

    let err = h
        .gateway
        .call(
            ApiRequest::post("/friends")
                .payload(json!({ "userId": "nine" }))
                .request_schema(registry::add_friend()),
        )
        .await
        .unwrap_err();
    assert!(err.is(StatusClass::ClientValidation));
    Ok(())
}

#[tokio::test]
async fn transport_failure_is_a_server_error() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    // Nothing listens on a port released right after binding it.
    let port = std::net::TcpListener::bind("127.0.0.1:0")?
        .local_addr()?
        .port();
    let h = harness(&format!("http://127.0.0.1:{port}"));

    let err = h.gateway.profile().await.unwrap_err();

    assert_eq!(err.class(), StatusClass::Server);
    assert!(err.message().starts_with("Unable to reach the server"));
    assert!(!h.gateway.health().await);
    Ok(())
}

#[tokio::test]
async fn health_reports_reachability() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ping"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/ping"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let h = harness(&server.uri());

    assert!(h.gateway.health().await);
    assert!(!h.gateway.health().await);
    Ok(())
}

#[tokio::test]
async fn validate_session_returns_the_token_owner() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(endpoint("/validate")))
        .and(header("authorization", "Bearer tok-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "userId": 3 })))
        .mount(&server)
        .await;
    let h = harness(&server.uri());
    let user: UserWithToken = serde_json::from_value(user_with_token_json(3, false, "tok-3"))?;
    h.session.login(user);

    let check = h.gateway.validate_session().await?;

    assert_eq!(check.user_id, 3);
    Ok(())
}
