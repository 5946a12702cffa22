//! Shared setup for gateway integration tests: an in-memory `AppState`
//! driven through the router with `oneshot`.

#![allow(dead_code)]

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use gateway_service::{
    build_router,
    config::{Environment, GatewayConfig, JwtConfig, JwtKeys, PatConfig},
    models::RoutesDocument,
    services::{
        DisabledOidcProvider, Downstream, InMemoryInvalidationStore, JwtService, OidcProvider,
    },
    AppState,
};
use http_body_util::BodyExt;
use mock_zos::{IrrPassTicket, PassTicketService};
use secrecy::Secret;
use service_core::config::Config;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::NamedTempFile;
use tower::util::ServiceExt;

pub const COOKIE_NAME: &str = "apimlAuthenticationToken";
pub const GATEWAY_APPLID: &str = "ZOWEAPPL";
pub const JWT_SECRET: &str = "integration-test-secret";
pub const REVOCATION_ADMIN: &str = "SECADM";

const ROUTES: &str = r#"{
    "routes": [
        { "service_id": "cics", "authentication": { "scheme": "httpBasicPassTicket", "applid": "CICSAPPL" } },
        { "service_id": "zosmf", "authentication": { "scheme": "zosmf" } },
        { "service_id": "discoverable", "authentication": { "scheme": "zoweJwt" } },
        { "service_id": "public", "authentication": { "scheme": "bypass" } },
        { "service_id": "misconfigured", "authentication": { "scheme": "httpBasicPassTicket" } }
    ],
    "identity_mappings": [
        { "user_name": "Jane", "distributed_id": "jane@example.com", "mainframe_id": "jane", "registry": "okta" }
    ]
}"#;

/// Downstream that records what it received and answers `200 OK`.
#[derive(Default)]
pub struct RecordingDownstream {
    pub requests: Mutex<Vec<(String, HeaderMap)>>,
}

impl RecordingDownstream {
    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.requests
            .lock()
            .unwrap()
            .last()
            .map(|(_, headers)| headers.clone())
    }
}

#[axum::async_trait]
impl Downstream for RecordingDownstream {
    async fn forward(&self, service_id: &str, request: Request) -> Response {
        self.requests
            .lock()
            .unwrap()
            .push((service_id.to_string(), request.headers().clone()));
        StatusCode::OK.into_response()
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub passtickets: Arc<IrrPassTicket>,
    pub downstream: Arc<RecordingDownstream>,
    _routes_file: NamedTempFile,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_oidc(Arc::new(DisabledOidcProvider))
    }

    pub fn with_oidc(oidc: Arc<dyn OidcProvider>) -> Self {
        let mut routes_file = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        routes_file.write_all(ROUTES.as_bytes()).unwrap();
        routes_file.flush().unwrap();

        let routes: RoutesDocument =
            Config::load_file(routes_file.path().to_str().unwrap()).unwrap();

        let config = GatewayConfig {
            common: Config::default(),
            environment: Environment::Dev,
            service_name: "gateway-service".to_string(),
            service_version: "test".to_string(),
            log_level: "error".to_string(),
            jwt: JwtConfig {
                keys: JwtKeys::Secret(Secret::new(JWT_SECRET.to_string())),
                token_expiration_seconds: 28_800,
                cookie_name: COOKIE_NAME.to_string(),
            },
            pat: PatConfig {
                default_validity_seconds: 7_776_000,
                max_validity_seconds: 7_776_000,
            },
            redis: None,
            oidc: None,
            gateway_applid: GATEWAY_APPLID.to_string(),
            gateway_service_id: "gateway".to_string(),
            revocation_admins: vec![REVOCATION_ADMIN.to_string()],
            provider_timeout: Duration::from_secs(2),
            routes,
        };

        let jwt = JwtService::new(&config.jwt).unwrap();
        let passtickets = Arc::new(IrrPassTicket::new());
        let downstream = Arc::new(RecordingDownstream::default());

        let state = AppState::new(
            config,
            jwt,
            passtickets.clone(),
            Arc::new(InMemoryInvalidationStore::new()),
            oidc,
            downstream.clone(),
        );

        Self {
            router: build_router(state.clone()),
            state,
            passtickets,
            downstream,
            _routes_file: routes_file,
        }
    }

    pub async fn send(&self, request: axum::http::Request<Body>) -> Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    /// Gateway JWT for `user_id` obtained through `/auth/login`.
    pub async fn login(&self, user_id: &str) -> String {
        let ticket = self.passtickets.generate(user_id, GATEWAY_APPLID).unwrap();
        let response = self
            .send(
                axum::http::Request::post("/auth/login")
                    .header(header::AUTHORIZATION, basic(user_id, &ticket))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        set_cookie
            .split(';')
            .next()
            .and_then(|pair| pair.strip_prefix(&format!("{}=", COOKIE_NAME)))
            .unwrap()
            .to_string()
    }

    /// Personal access token minted through the HTTP surface.
    pub async fn personal_access_token(&self, user_id: &str, scopes: &[&str]) -> String {
        let jwt = self.login(user_id).await;
        let response = self
            .send(
                axum::http::Request::post("/auth/access-token/generate")
                    .header(header::COOKIE, jwt_cookie(&jwt))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        serde_json::json!({ "validity": 600, "scopes": scopes }).to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_text(response).await
    }
}

pub fn basic(user_id: &str, password: &str) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};
    format!("Basic {}", STANDARD.encode(format!("{}:{}", user_id, password)))
}

pub fn decode_basic(value: &str) -> (String, String) {
    use base64::{engine::general_purpose::STANDARD, Engine};
    let encoded = value.strip_prefix("Basic ").unwrap();
    let decoded = String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap();
    let (user, password) = decoded.split_once(':').unwrap();
    (user.to_string(), password.to_string())
}

pub fn jwt_cookie(jwt: &str) -> String {
    format!("{}={}", COOKIE_NAME, jwt)
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
