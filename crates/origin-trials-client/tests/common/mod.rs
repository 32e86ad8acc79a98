#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
};
use origin_trials_client::{
    AccessTokenProvider, OriginTrialsClient, OriginTrialsConfig, SecretsProvider, TokenError,
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, oneshot};

pub const API_KEY: &str = "api_key_value";
pub const ACCESS_TOKEN: &str = "access_token";
pub const ADMIN_GROUP: &str = "test-group-123";
pub const MILESTONE_SCHEDULE_PATH: &str = "/fetch_milestone_schedule";
pub const SITE_URL: &str = "https://chromestatus.test/";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

#[derive(Clone, Default)]
struct StubState {
    calls: Arc<Mutex<Vec<RecordedRequest>>>,
    responses: Arc<Mutex<HashMap<String, (StatusCode, Value)>>>,
}

/// In-process HTTP server standing in for the Origin Trials API and the
/// milestone schedule. Unconfigured routes answer 404.
pub struct ApiStub {
    pub base_url: String,
    state: StubState,
    shutdown: Option<oneshot::Sender<()>>,
}

impl ApiStub {
    pub async fn spawn() -> Result<Self> {
        let state = StubState::default();
        let app = Router::new().fallback(record_request).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
            state,
            shutdown: Some(shutdown_tx),
        })
    }

    pub async fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        let mut guard = self.state.responses.lock().await;
        guard.insert(route_key(&method, path), (status, body));
    }

    pub async fn respond_with_end_date(&self, late_stable_date: &str) {
        self.respond(
            Method::GET,
            MILESTONE_SCHEDULE_PATH,
            StatusCode::OK,
            json!({"mstones": [{"late_stable_date": late_stable_date}]}),
        )
        .await;
    }

    pub async fn calls(&self) -> Vec<RecordedRequest> {
        self.state.calls.lock().await.clone()
    }

    pub async fn calls_to(&self, method: Method, path: &str) -> Vec<RecordedRequest> {
        self.calls()
            .await
            .into_iter()
            .filter(|call| call.method == method && call.path == path)
            .collect()
    }

    pub fn config(&self) -> OriginTrialsConfig {
        OriginTrialsConfig::new(self.base_url.clone())
            .with_milestone_schedule_url(format!("{}{MILESTONE_SCHEDULE_PATH}", self.base_url))
            .with_site_url(SITE_URL)
    }

    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

fn route_key(method: &Method, path: &str) -> String {
    format!("{method} {path}")
}

async fn record_request(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let path = uri.path().to_string();
    let parsed_body = if body.is_empty() {
        None
    } else {
        serde_json::from_slice::<Value>(&body).ok()
    };
    state.calls.lock().await.push(RecordedRequest {
        method: method.clone(),
        path: path.clone(),
        query,
        headers,
        body: parsed_body,
    });

    let responses = state.responses.lock().await;
    match responses.get(&route_key(&method, &path)) {
        Some((status, body)) => (*status, Json(body.clone())).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("no stub for {method} {path}")})),
        )
            .into_response(),
    }
}

/// Secrets provider that counts lookups.
#[derive(Debug, Default)]
pub struct CountingSecrets {
    api_key: Option<String>,
    admin_group: Option<String>,
    pub key_lookups: AtomicUsize,
    pub group_lookups: AtomicUsize,
}

impl CountingSecrets {
    pub fn with_key() -> Arc<Self> {
        Arc::new(Self {
            api_key: Some(API_KEY.to_string()),
            admin_group: Some(ADMIN_GROUP.to_string()),
            ..Self::default()
        })
    }

    pub fn without_key() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn key_lookups(&self) -> usize {
        self.key_lookups.load(Ordering::SeqCst)
    }
}

impl SecretsProvider for CountingSecrets {
    fn ot_api_key(&self) -> Option<String> {
        self.key_lookups.fetch_add(1, Ordering::SeqCst);
        self.api_key.clone()
    }

    fn ot_data_access_admin_group(&self) -> Option<String> {
        self.group_lookups.fetch_add(1, Ordering::SeqCst);
        self.admin_group.clone()
    }
}

/// Token provider that counts requests and can be told to fail.
#[derive(Debug)]
pub struct CountingToken {
    token: Option<String>,
    pub requests: AtomicUsize,
}

impl CountingToken {
    pub fn issuing(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: Some(token.to_string()),
            requests: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            token: None,
            requests: AtomicUsize::new(0),
        })
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccessTokenProvider for CountingToken {
    async fn access_token(&self) -> Result<String, TokenError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.token.clone().ok_or(TokenError::Empty)
    }
}

pub fn client_for(
    config: OriginTrialsConfig,
    secrets: &Arc<CountingSecrets>,
    token: &Arc<CountingToken>,
) -> Result<OriginTrialsClient> {
    let secrets: Arc<dyn SecretsProvider> = secrets.clone();
    let token: Arc<dyn AccessTokenProvider> = token.clone();
    Ok(OriginTrialsClient::new(config, secrets, token)?)
}
