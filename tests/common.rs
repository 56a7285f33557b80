#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc, clippy::must_use_candidate, unreachable_pub)]

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use push_relay::adapters::memory::RegistrationRepository;
use push_relay::adapters::push::StaticToken;
use push_relay::api::{self, AppState};
use push_relay::config::{Config, FcmConfig, LogFormat, ServerConfig, TelemetryConfig};
use push_relay::services::publish_service::PublishService;
use push_relay::AppBuilder;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub const TEST_ACCESS_TOKEN: &str = "test-access-token";
pub const GATEWAY_PATH: &str = "/v1/projects/test-project/messages:send";

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("push_relay=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

/// Binds an ephemeral port and serves the router on it, returning the base url.
pub async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A url on which nothing is listening.
pub async fn unreachable_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}{GATEWAY_PATH}")
}

pub fn invalid_token_body() -> Value {
    json!({
        "error": {
            "code": 400,
            "message": "Request contains an invalid argument.",
            "status": "INVALID_ARGUMENT",
            "details": [
                {
                    "@type": "type.googleapis.com/google.firebase.fcm.v1.FcmError",
                    "errorCode": "INVALID_ARGUMENT"
                },
                {
                    "@type": "type.googleapis.com/google.rpc.BadRequest",
                    "fieldViolations": [
                        { "field": "message.token", "description": "Invalid registration token" }
                    ]
                }
            ]
        }
    })
}

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

impl RecordedRequest {
    pub fn token(&self) -> &str {
        self.body["message"]["token"].as_str().unwrap_or_default()
    }
}

#[derive(Clone, Debug)]
struct Reply {
    status: StatusCode,
    body: String,
}

#[derive(Clone, Debug, Default)]
struct GatewayState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    replies: Arc<Mutex<HashMap<String, Reply>>>,
}

/// Stand-in for the FCM send endpoint. Answers 200 unless a reply was scripted for the token.
#[derive(Clone, Debug)]
pub struct MockGateway {
    pub url: String,
    state: GatewayState,
}

impl MockGateway {
    pub async fn spawn() -> Self {
        let state = GatewayState::default();
        let router = Router::new().route(GATEWAY_PATH, post(gateway_send)).with_state(state.clone());
        let base = serve(router).await;
        Self { url: format!("{base}{GATEWAY_PATH}"), state }
    }

    pub fn reply(&self, token: &str, status: StatusCode, body: impl Into<String>) {
        self.state.replies.lock().unwrap().insert(token.to_string(), Reply { status, body: body.into() });
    }

    pub fn reply_invalid_token(&self, token: &str) {
        self.reply(token, StatusCode::BAD_REQUEST, invalid_token_body().to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.requests().iter().map(|r| r.token().to_string()).collect()
    }

    /// Polls until the gateway has seen `count` requests or the timeout expires.
    pub async fn wait_for_requests(&self, count: usize) -> bool {
        let start = std::time::Instant::now();
        while start.elapsed() < Duration::from_secs(5) {
            if self.requests().len() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        false
    }
}

async fn gateway_send(State(state): State<GatewayState>, headers: HeaderMap, body: String) -> (StatusCode, String) {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(ToString::to_string);
    let body: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let recorded =
        RecordedRequest { authorization: header("authorization"), content_type: header("content-type"), body };
    let token = recorded.token().to_string();
    state.requests.lock().unwrap().push(recorded);

    let reply = state.replies.lock().unwrap().get(&token).cloned();
    reply.map_or_else(
        || (StatusCode::OK, json!({ "name": format!("projects/test-project/messages/{token}") }).to_string()),
        |reply| (reply.status, reply.body),
    )
}

#[derive(Clone, Debug, Default)]
struct TokenState {
    assertions: Arc<Mutex<Vec<HashMap<String, String>>>>,
    expires_in: u64,
    status: Option<StatusCode>,
}

/// Stand-in for the Google OAuth2 token endpoint.
#[derive(Clone, Debug)]
pub struct MockTokenServer {
    pub url: String,
    state: TokenState,
}

impl MockTokenServer {
    pub async fn spawn(expires_in: u64) -> Self {
        Self::spawn_with(expires_in, None).await
    }

    pub async fn spawn_rejecting(status: StatusCode) -> Self {
        Self::spawn_with(3600, Some(status)).await
    }

    async fn spawn_with(expires_in: u64, status: Option<StatusCode>) -> Self {
        let state = TokenState { assertions: Arc::default(), expires_in, status };
        let router = Router::new().route("/token", post(token_exchange)).with_state(state.clone());
        let base = serve(router).await;
        Self { url: format!("{base}/token"), state }
    }

    pub fn exchanges(&self) -> Vec<HashMap<String, String>> {
        self.state.assertions.lock().unwrap().clone()
    }
}

async fn token_exchange(
    State(state): State<TokenState>,
    axum::Form(form): axum::Form<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    let count = {
        let mut assertions = state.assertions.lock().unwrap();
        assertions.push(form);
        assertions.len()
    };
    if let Some(status) = state.status {
        return (status, Json(json!({ "error": "invalid_grant" })));
    }
    (
        StatusCode::OK,
        Json(json!({ "access_token": format!("oauth-token-{count}"), "expires_in": state.expires_in, "token_type": "Bearer" })),
    )
}

pub fn test_service_account_json(token_uri: &str, project_id: Option<&str>) -> String {
    let private_key = std::fs::read_to_string(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/test_service_account_key.pem"))
        .unwrap();
    let mut key = json!({
        "type": "service_account",
        "client_email": "relay@test-project.iam.gserviceaccount.com",
        "private_key": private_key,
        "token_uri": token_uri,
    });
    if let Some(project_id) = project_id {
        key["project_id"] = json!(project_id);
    }
    key.to_string()
}

pub fn get_test_config(endpoint: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            mgmt_port: 0,
            shutdown_timeout_secs: 1,
        },
        fcm: FcmConfig {
            project_id: Some("test-project".to_string()),
            endpoint: Some(endpoint.to_string()),
            service_account_file: "service-account.json".to_string(),
            access_token: Some(TEST_ACCESS_TOKEN.to_string()),
            custom_data: vec![("CustomKey1".to_string(), "CustomValue1".to_string())],
        },
        telemetry: TelemetryConfig { log_format: LogFormat::Text, otlp_endpoint: None },
    }
}

/// Builds a publish service wired to the given gateway with a static bearer token.
pub fn publish_service(endpoint: &str, repo: &RegistrationRepository) -> PublishService {
    build_state(get_test_config(endpoint), repo).publish_service
}

pub fn build_state(config: Config, repo: &RegistrationRepository) -> AppState {
    AppBuilder::new(config)
        .with_credentials(Arc::new(StaticToken::new(TEST_ACCESS_TOKEN)))
        .with_repository(repo.clone())
        .build()
        .unwrap()
}

#[derive(Debug)]
pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
    pub repo: RegistrationRepository,
    pub gateway: MockGateway,
}

impl TestApp {
    pub async fn spawn() -> Self {
        setup_tracing();
        let gateway = MockGateway::spawn().await;
        let repo = RegistrationRepository::new();
        let state = build_state(get_test_config(&gateway.url), &repo);

        let server_url = serve(api::app_router(state)).await;
        let mgmt_url = serve(api::mgmt_router()).await;

        Self { server_url, mgmt_url, client: reqwest::Client::new(), repo, gateway }
    }

    pub async fn register(&self, platform: &str, user_id: &str, token: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/register", self.server_url))
            .json(&json!({ "platform": platform, "userId": user_id, "token": token }))
            .send()
            .await
            .unwrap()
    }

    pub async fn publish(&self, user_id: &str, title: &str, body: &str) -> reqwest::Response {
        self.client
            .post(format!("{}/publish", self.server_url))
            .json(&json!({ "userId": user_id, "title": title, "body": body }))
            .send()
            .await
            .unwrap()
    }
}
