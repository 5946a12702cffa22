mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{basic, body_json, jwt_cookie, TestApp, GATEWAY_APPLID};
use mock_zos::PassTicketService;

#[tokio::test]
async fn login_with_passticket_sets_jwt_cookie() {
    let app = TestApp::new();

    let jwt = app.login("zoweuser").await;

    let claims = app.state.jwt.verify(&jwt).unwrap();
    assert_eq!(claims.sub, "ZOWEUSER");
    assert_eq!(claims.iss, "APIML");
}

#[tokio::test]
async fn login_accepts_json_credentials() {
    let app = TestApp::new();
    let ticket = app.passtickets.generate("ZOWEUSER", GATEWAY_APPLID).unwrap();

    let response = app
        .send(
            Request::post("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "username": "ZOWEUSER", "password": ticket }).to_string(),
                ))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(cookie.starts_with("apimlAuthenticationToken="));
    assert!(cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn login_with_foreign_ticket_is_unauthorized() {
    let app = TestApp::new();
    let ticket = app.passtickets.generate("ZOWEUSER", "CICSAPPL").unwrap();

    let response = app
        .send(
            Request::post("/auth/login")
                .header(header::AUTHORIZATION, basic("ZOWEUSER", &ticket))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_without_credentials_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .send(Request::post("/auth/login").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn query_returns_parsed_identity() {
    let app = TestApp::new();
    let jwt = app.login("ZOWEUSER").await;

    let response = app
        .send(
            Request::get("/auth/query")
                .header(header::COOKIE, jwt_cookie(&jwt))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["userId"], "ZOWEUSER");
    assert_eq!(json["origin"], "ZOWE");
    assert!(json["creation"].is_string());
    assert!(json["expiration"].is_string());
}

#[tokio::test]
async fn logout_invalidates_the_token() {
    let app = TestApp::new();
    let jwt = app.login("ZOWEUSER").await;

    let response = app
        .send(
            Request::post("/auth/logout")
                .header(header::COOKIE, jwt_cookie(&jwt))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .send(
            Request::get("/auth/query")
                .header(header::COOKIE, jwt_cookie(&jwt))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn query_without_credentials_is_unauthorized() {
    let app = TestApp::new();

    let response = app
        .send(Request::get("/auth/query").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn ticket_endpoint_issues_evaluable_passticket() {
    let app = TestApp::new();
    let jwt = app.login("ZOWEUSER").await;

    let response = app
        .send(
            Request::post("/auth/ticket")
                .header(header::COOKIE, jwt_cookie(&jwt))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"applicationName":"IYCICS"}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["userId"], "ZOWEUSER");
    assert_eq!(json["applicationName"], "IYCICS");
    let ticket = json["ticket"].as_str().unwrap();
    assert!(app.passtickets.evaluate("ZOWEUSER", "IYCICS", ticket).is_ok());
}

#[tokio::test]
async fn ticket_for_unknown_applid_is_bad_request() {
    let app = TestApp::new();
    let jwt = app.login("ZOWEUSER").await;

    let response = app
        .send(
            Request::post("/auth/ticket")
                .header(header::COOKIE, jwt_cookie(&jwt))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"applicationName":"XBADAPPL"}"#))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
