//! HTTP API server.
//!
//! Each client opens a session and drives it with summarize and ask calls;
//! the session holds the current document, summary and model connection.
//! Sessions idle for longer than `server.session_idle_minutes` are dropped,
//! and at most `server.max_sessions` are held at once.

use crate::artifact::save_summary;
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::GistError;
use crate::llm::SupportedModel;
use crate::session::{Session, SessionConfig, SummaryRequest};
use crate::speech::{EspeakSynthesizer, SpeechSynthesizer};
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// A session and when a request last touched it.
struct SessionSlot {
    session: Arc<Mutex<Session>>,
    /// Unix milliseconds.
    last_used: AtomicI64,
}

impl SessionSlot {
    fn new(session: Session, now: DateTime<Utc>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            last_used: AtomicI64::new(now.timestamp_millis()),
        }
    }

    fn touch(&self, now: DateTime<Utc>) {
        self.last_used.store(now.timestamp_millis(), Ordering::Relaxed);
    }

    fn is_idle(&self, cutoff: i64) -> bool {
        self.last_used.load(Ordering::Relaxed) < cutoff
    }
}

/// Oldest `last_used` a session may have at `now` and still be kept.
fn idle_cutoff(now: DateTime<Utc>, idle: TimeDelta) -> i64 {
    now.checked_sub_signed(idle)
        .map(|t| t.timestamp_millis())
        .unwrap_or(i64::MIN)
}

/// Drop sessions unused for longer than `idle`. Returns how many were dropped.
fn expire_idle(sessions: &mut HashMap<Uuid, SessionSlot>, now: DateTime<Utc>, idle: TimeDelta) -> usize {
    let cutoff = idle_cutoff(now, idle);
    let before = sessions.len();
    sessions.retain(|_, slot| !slot.is_idle(cutoff));
    before - sessions.len()
}

/// Shared application state.
struct AppState {
    sessions: RwLock<HashMap<Uuid, SessionSlot>>,
    session_config: SessionConfig,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    default_model: SupportedModel,
    default_words: u32,
    output_dir: PathBuf,
    filename: String,
    session_idle: TimeDelta,
    max_sessions: usize,
}

impl AppState {
    fn from_settings(settings: &Settings) -> crate::error::Result<Self> {
        let idle_minutes = i64::try_from(settings.server.session_idle_minutes).unwrap_or(i64::MAX);
        Ok(Self {
            sessions: RwLock::new(HashMap::new()),
            session_config: SessionConfig::from_settings(settings)?,
            synthesizer: Arc::new(EspeakSynthesizer::new(&settings.speech, &settings.temp_dir())),
            default_model: settings.llm.model,
            default_words: settings.summary.default_words,
            output_dir: settings.output_dir(),
            filename: settings.summary.filename.clone(),
            session_idle: TimeDelta::try_minutes(idle_minutes).unwrap_or(TimeDelta::MAX),
            max_sessions: settings.server.max_sessions,
        })
    }

    /// Look up a live session and mark it as used.
    async fn session(&self, id: Uuid) -> Result<Arc<Mutex<Session>>, ApiError> {
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        match sessions.get(&id) {
            Some(slot) if !slot.is_idle(idle_cutoff(now, self.session_idle)) => {
                slot.touch(now);
                Ok(slot.session.clone())
            }
            _ => Err(ApiError::not_found(format!("Session not found: {}", id))),
        }
    }
}

/// Run the HTTP API server.
pub async fn run_serve(host: &str, port: u16, settings: Settings) -> anyhow::Result<()> {
    if let Err(e) = preflight::check(Operation::Serve, &settings) {
        Output::error(&format!("{}", e));
        Output::info("Run 'gist doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let state = Arc::new(AppState::from_settings(&settings)?);
    let app = router(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Gist API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Models", "GET    /models");
    Output::kv("New session", "POST   /sessions");
    Output::kv("Summarize", "POST   /sessions/:id/summarize");
    Output::kv("Ask", "POST   /sessions/:id/ask");
    Output::kv("Download", "GET    /sessions/:id/summary.txt");
    Output::kv("Audio", "GET    /sessions/:id/audio");
    Output::kv("End session", "DELETE /sessions/:id");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/models", get(list_models))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", delete(delete_session))
        .route("/sessions/{id}/summarize", post(summarize))
        .route("/sessions/{id}/ask", post(ask))
        .route("/sessions/{id}/summary.txt", get(download_summary))
        .route("/sessions/{id}/audio", get(audio))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Serialize)]
struct ModelsResponse {
    models: Vec<SupportedModel>,
    default: SupportedModel,
}

#[derive(Serialize)]
struct SessionResponse {
    session_id: Uuid,
}

#[derive(Deserialize)]
struct SummarizeRequest {
    url: String,
    #[serde(default)]
    words: Option<u32>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Serialize)]
struct SummarizeResponse {
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_link: Option<String>,
    source_url: String,
    source_kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    model: String,
    words: u32,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// An error rendered as a JSON body with a status code.
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(message: String) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message,
        }
    }
}

impl From<GistError> for ApiError {
    fn from(e: GistError) -> Self {
        let status = match &e {
            e if e.is_user_error() => StatusCode::BAD_REQUEST,
            GistError::ContentUnavailable(_) | GistError::Llm(_) | GistError::Http(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, "{}", self.message);
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn list_models(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ModelsResponse {
        models: SupportedModel::ALL.to_vec(),
        default: state.default_model,
    })
}

async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let now = Utc::now();
    let mut sessions = state.sessions.write().await;

    let expired = expire_idle(&mut sessions, now, state.session_idle);
    if expired > 0 {
        info!(expired, "Dropped idle sessions");
    }
    if sessions.len() >= state.max_sessions {
        return Err(ApiError {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: format!(
                "Too many active sessions (limit {}). Try again later.",
                state.max_sessions
            ),
        });
    }

    let id = Uuid::new_v4();
    sessions.insert(id, SessionSlot::new(state.session_config.open(), now));
    info!(session = %id, active = sessions.len(), "Session opened");

    Ok((StatusCode::CREATED, Json(SessionResponse { session_id: id })))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    match state.sessions.write().await.remove(&id) {
        Some(_) => Ok(StatusCode::NO_CONTENT),
        None => Err(ApiError::not_found(format!("Session not found: {}", id))),
    }
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let session = state.session(id).await?;

    let model = match req.model.as_deref() {
        Some(name) => name.parse::<SupportedModel>()?,
        None => state.default_model,
    };
    let request = SummaryRequest {
        url: req.url,
        words: req.words.unwrap_or(state.default_words),
        model,
    };

    let mut session = session.lock().await;
    let active = session.summarize(request).await?;

    // The summary is already live in the session; a failed file write only
    // costs the download link.
    let download_link = match save_summary(&active.summary, &state.output_dir, &state.filename) {
        Ok(artifact) => Some(artifact.download_link()),
        Err(e) => {
            warn!("Could not write {}: {}", state.filename, e);
            None
        }
    };

    Ok(Json(SummarizeResponse {
        summary: active.summary.clone(),
        download_link,
        source_url: active.document.source_url.clone(),
        source_kind: active.document.kind.to_string(),
        title: active.document.title.clone(),
        model: active.model.name().to_string(),
        words: active.words,
    }))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let session = state.session(id).await?;
    let session = session.lock().await;
    let answer = session.ask(&req.question).await?;
    Ok(Json(AskResponse { answer }))
}

async fn download_summary(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let session = state.session(id).await?;
    let session = session.lock().await;
    let active = session
        .active()
        .ok_or_else(|| ApiError::not_found("No summary yet".to_string()))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", state.filename),
            ),
        ],
        active.summary.clone(),
    )
        .into_response())
}

async fn audio(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let session = state.session(id).await?;
    let summary = {
        let session = session.lock().await;
        session
            .active()
            .map(|a| a.summary.clone())
            .ok_or_else(|| ApiError::not_found("No summary yet".to_string()))?
    };

    let bytes = state.synthesizer.synthesize(&summary).await?;
    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentDocument, ContentSource, SourceKind};
    use crate::error::Result;
    use crate::llm::{LanguageModel, ModelConnector};
    use crate::summarize::Summarizer;
    use async_trait::async_trait;
    use url::Url;

    struct StubContent;

    #[async_trait]
    impl ContentSource for StubContent {
        fn can_handle(&self, _url: &Url) -> bool {
            true
        }

        async fn fetch(&self, url: &Url) -> Result<ContentDocument> {
            Ok(ContentDocument {
                text: "Ferris is a crab who likes Rust.".to_string(),
                source_url: url.to_string(),
                kind: SourceKind::Web,
                title: Some("Ferris".to_string()),
            })
        }
    }

    struct StubModel(SupportedModel);

    #[async_trait]
    impl LanguageModel for StubModel {
        fn name(&self) -> &str {
            self.0.as_str()
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            if prompt.contains("Question:") {
                Ok("A crab.".to_string())
            } else {
                Ok("Ferris likes Rust.".to_string())
            }
        }
    }

    struct StubConnector;

    impl ModelConnector for StubConnector {
        fn connect(&self, model: SupportedModel, _api_key: &str) -> Result<Arc<dyn LanguageModel>> {
            Ok(Arc::new(StubModel(model)))
        }
    }

    struct StubSpeech;

    #[async_trait]
    impl SpeechSynthesizer for StubSpeech {
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
            Ok(format!("ID3{}", text.len()).into_bytes())
        }
    }

    fn test_state(output_dir: PathBuf, api_key: &str) -> AppState {
        AppState {
            sessions: RwLock::new(HashMap::new()),
            session_config: SessionConfig {
                content: Arc::new(StubContent),
                connector: Arc::new(StubConnector),
                summarizer: Summarizer::default(),
                api_key: api_key.to_string(),
                api_key_env: "GROQ_API_KEY".to_string(),
                min_words: 100,
            },
            synthesizer: Arc::new(StubSpeech),
            default_model: SupportedModel::Gemma2_9b,
            default_words: 500,
            output_dir,
            filename: "summary.txt".to_string(),
            session_idle: TimeDelta::minutes(60),
            max_sessions: 100,
        }
    }

    async fn spawn_server(output_dir: PathBuf, api_key: &str) -> String {
        spawn(test_state(output_dir, api_key)).await
    }

    async fn spawn(state: AppState) -> String {
        let state = Arc::new(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn open_session(client: &reqwest::Client, base: &str) -> String {
        let body: serde_json::Value = client
            .post(format!("{}/sessions", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_summarize_then_ask() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server(dir.path().to_path_buf(), "key").await;
        let client = reqwest::Client::new();
        let id = open_session(&client, &base).await;

        let response = client
            .post(format!("{}/sessions/{}/summarize", base, id))
            .json(&serde_json::json!({ "url": "https://example.com/ferris", "model": "llama3-8b-8192" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["summary"], "Ferris likes Rust.");
        assert_eq!(body["model"], "llama3-8b-8192");
        assert_eq!(body["words"], 500);
        assert_eq!(body["source_kind"], "web");
        assert!(body["download_link"]
            .as_str()
            .unwrap()
            .contains("download=\"summary.txt\""));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("summary.txt")).unwrap(),
            "Ferris likes Rust."
        );

        let response = client
            .post(format!("{}/sessions/{}/ask", base, id))
            .json(&serde_json::json!({ "question": "Who is Ferris?" }))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["answer"], "A crab.");

        let response = client
            .get(format!("{}/sessions/{}/summary.txt", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"summary.txt\""
        );
        assert_eq!(response.text().await.unwrap(), "Ferris likes Rust.");

        let response = client
            .get(format!("{}/sessions/{}/audio", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
        assert_eq!(response.bytes().await.unwrap().as_ref(), b"ID318");
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server(dir.path().to_path_buf(), "key").await;
        let client = reqwest::Client::new();
        let id = open_session(&client, &base).await;

        let response = client
            .post(format!("{}/sessions/{}/summarize", base, id))
            .json(&serde_json::json!({ "url": "not a url" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let response = client
            .post(format!("{}/sessions/{}/ask", base, id))
            .json(&serde_json::json!({ "question": "Anything?" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let response = client
            .get(format!("{}/sessions/{}/summary.txt", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);

        let response = client
            .post(format!("{}/sessions/{}/ask", base, Uuid::new_v4()))
            .json(&serde_json::json!({ "question": "Anything?" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 404);

        let response = client
            .delete(format!("{}/sessions/{}", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 204);
    }

    #[tokio::test]
    async fn test_blank_api_key_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server(dir.path().to_path_buf(), "").await;
        let client = reqwest::Client::new();
        let id = open_session(&client, &base).await;

        let response = client
            .post(format!("{}/sessions/{}/summarize", base, id))
            .json(&serde_json::json!({ "url": "https://example.com" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("API key"));
    }

    #[tokio::test]
    async fn test_models_and_health() {
        let dir = tempfile::tempdir().unwrap();
        let base = spawn_server(dir.path().to_path_buf(), "key").await;
        let client = reqwest::Client::new();

        let body: serde_json::Value = client
            .get(format!("{}/models", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["default"], "gemma2-9b-it");
        assert_eq!(body["models"].as_array().unwrap().len(), 3);

        let status = client.get(format!("{}/health", base)).send().await.unwrap().status();
        assert_eq!(status, 200);
    }

    #[tokio::test]
    async fn test_summary_survives_unwritable_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let not_a_dir = dir.path().join("occupied");
        std::fs::write(&not_a_dir, "file in the way").unwrap();

        let base = spawn_server(not_a_dir, "key").await;
        let client = reqwest::Client::new();
        let id = open_session(&client, &base).await;

        let response = client
            .post(format!("{}/sessions/{}/summarize", base, id))
            .json(&serde_json::json!({ "url": "https://example.com/ferris" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["summary"], "Ferris likes Rust.");
        assert!(body.get("download_link").is_none());

        let response = client
            .get(format!("{}/sessions/{}/summary.txt", base, id))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.text().await.unwrap(), "Ferris likes Rust.");
    }

    #[tokio::test]
    async fn test_session_cap() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = test_state(dir.path().to_path_buf(), "key");
        state.max_sessions = 1;
        let base = spawn(state).await;
        let client = reqwest::Client::new();

        let first = open_session(&client, &base).await;

        let response = client.post(format!("{}/sessions", base)).send().await.unwrap();
        assert_eq!(response.status(), 503);
        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("limit 1"));

        let response = client
            .delete(format!("{}/sessions/{}", base, first))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 204);

        let response = client.post(format!("{}/sessions", base)).send().await.unwrap();
        assert_eq!(response.status(), 201);
    }

    #[test]
    fn test_expire_idle() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path().to_path_buf(), "key");
        let start = Utc::now();
        let idle = TimeDelta::minutes(60);

        let mut sessions = HashMap::new();
        let stale = Uuid::new_v4();
        let fresh = Uuid::new_v4();
        sessions.insert(stale, SessionSlot::new(state.session_config.open(), start));
        sessions.insert(fresh, SessionSlot::new(state.session_config.open(), start));
        sessions[&fresh].touch(start + TimeDelta::minutes(30));

        assert_eq!(expire_idle(&mut sessions, start + TimeDelta::minutes(60), idle), 0);
        assert_eq!(expire_idle(&mut sessions, start + TimeDelta::minutes(61), idle), 1);
        assert!(sessions.contains_key(&fresh));
        assert!(!sessions.contains_key(&stale));
    }

    #[tokio::test]
    async fn test_idle_session_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path().to_path_buf(), "key");
        let id = Uuid::new_v4();
        let long_ago = Utc::now() - TimeDelta::minutes(90);
        state
            .sessions
            .write()
            .await
            .insert(id, SessionSlot::new(state.session_config.open(), long_ago));

        let err = state.session(id).await.err().unwrap();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
