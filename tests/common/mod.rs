//! A stand-in for the remote catalog API, served on an ephemeral port.
//!
//! Every request is recorded. A bearer token of `expired` gets a 401 from any
//! endpoint, the way a real backend rejects a stale token.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use skillshelf::config::AppConfig;
use skillshelf::logic::Tab;
use skillshelf::protocol::ServerWsMessage;
use skillshelf::state::AppState;

#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub auth: Option<String>,
    pub body: Option<Value>,
}

#[derive(Clone, Default)]
pub struct MockBackend {
    calls: Arc<Mutex<Vec<Recorded>>>,
}

impl MockBackend {
    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.calls().into_iter().filter(|c| c.method == method && c.path == path).collect()
    }
}

pub fn skill(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("About {title}"),
        "image": format!("https://img.example.com/{id}.png"),
        "category": [{ "id": 1, "name": "Backend" }]
    })
}

fn question(id: i64, text: &str) -> Value {
    json!({
        "id": id,
        "questionText": text,
        "optionA": "alpha",
        "optionB": "beta",
        "optionC": "gamma",
        "optionD": "delta"
    })
}

fn user_skill(id: i64, skill_id: i64, favorite: bool, rating: &str) -> Value {
    json!({
        "id": id,
        "skillId": skill_id,
        "skillName": format!("Skill {skill_id}"),
        "description": "",
        "image": "",
        "level": 2.5,
        "favorite": favorite,
        "difficultyRating": rating
    })
}

fn correct_answer(question_id: i64) -> &'static str {
    match question_id {
        11 => "B",
        12 => "C",
        _ => "A",
    }
}

async fn handle(State(mock): State<MockBackend>, req: Request) -> Response {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let auth = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_string);
    let bytes = axum::body::to_bytes(req.into_body(), usize::MAX).await.unwrap_or_default();
    let body: Option<Value> = serde_json::from_slice(&bytes).ok();

    mock.calls.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        query,
        auth: auth.clone(),
        body: body.clone(),
    });

    if auth.as_deref() == Some("Bearer expired") {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Token expired" }))).into_response();
    }

    let segs: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let field = |k: &str| body.as_ref().and_then(|b| b.get(k)).cloned().unwrap_or(Value::Null);

    match (method.as_str(), segs.as_slice()) {
        ("POST", ["auth", "login"]) | ("POST", ["auth", "register"]) => {
            if field("password") == json!("Secret1a") {
                Json(json!({ "login": field("login"), "token": "tok-1" })).into_response()
            } else if field("password") == json!("Notoken1") {
                Json(json!({ "login": field("login") })).into_response()
            } else {
                (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Bad credentials" }))).into_response()
            }
        }

        ("GET", ["category"]) => Json(json!([{ "id": 1, "name": "Backend" }, { "id": 2, "name": "Frontend" }])).into_response(),
        ("GET", ["skill", "search"]) => Json(json!({
            "content": [skill(4, "Rust")],
            "totalElements": 25,
            "totalPages": 3
        }))
        .into_response(),
        ("GET", ["skill"]) => Json(json!([skill(4, "Rust"), skill(5, "Go")])).into_response(),
        ("GET", ["skill", "4"]) => Json(skill(4, "Rust")).into_response(),
        ("GET", ["skill", _]) => (StatusCode::NOT_FOUND, Json(json!({ "message": "Skill not found" }))).into_response(),
        ("POST", ["skill"]) => StatusCode::CREATED.into_response(),
        ("PUT", ["skill", _]) | ("DELETE", ["skill", _]) => StatusCode::OK.into_response(),

        ("GET", ["questions"]) => Json(json!([question(11, "Which is B?"), question(12, "Which is C?")])).into_response(),
        ("GET", ["questions", "skill", "4"]) => {
            Json(json!([question(11, "Which is B?"), question(12, "Which is C?")])).into_response()
        }
        ("GET", ["questions", "skill", "6"]) => Json(json!([question(13, "Which one breaks?")])).into_response(),
        ("GET", ["questions", "skill", _]) => Json(json!([])).into_response(),
        ("GET", ["questions", id]) => match id.parse::<i64>() {
            Ok(n) => Json(question(n, "Loaded")).into_response(),
            Err(_) => StatusCode::BAD_REQUEST.into_response(),
        },
        ("POST", ["questions", "13", "validate"]) => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "boom" }))).into_response()
        }
        ("POST", ["questions", id, "validate"]) => {
            let n = id.parse::<i64>().unwrap_or_default();
            let correct = field("answer") == json!(correct_answer(n));
            Json(json!({ "correct": correct, "score": if correct { 1.0 } else { 0.0 }, "level": 1.0 })).into_response()
        }
        ("POST", ["questions"]) => StatusCode::CREATED.into_response(),
        ("PUT", ["questions", _]) | ("DELETE", ["questions", _]) => StatusCode::OK.into_response(),

        ("GET", ["user_skills"]) => {
            Json(json!([user_skill(1, 4, false, "médio"), user_skill(2, 5, true, "fácil")])).into_response()
        }
        ("POST", ["user_skills"]) => StatusCode::CREATED.into_response(),
        ("DELETE", ["user_skills", _]) => StatusCode::OK.into_response(),
        ("PATCH", ["user_skills", "1", "favorite"]) => Json(user_skill(1, 4, true, "médio")).into_response(),
        ("PUT", ["user_skills", "skill", sid, "difficulty"]) => {
            let sid = sid.parse::<i64>().unwrap_or_default();
            let rating = field("difficultyRating");
            Json(user_skill(1, sid, false, rating.as_str().unwrap_or("médio"))).into_response()
        }
        ("GET", ["user_skills", "skill", _, "level"]) => Json(json!({ "level": 3.0, "score": 2.0 })).into_response(),

        _ => (StatusCode::NOT_FOUND, Json(json!({ "message": "No such endpoint" }))).into_response(),
    }
}

/// Serve the mock on 127.0.0.1 and return its base URL.
pub async fn spawn_backend() -> (String, MockBackend) {
    let mock = MockBackend::default();
    let app = Router::new().fallback(handle).with_state(mock.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), mock)
}

pub fn test_config(base_url: &str) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.backend.base_url = base_url.to_string();
    cfg.backend.timeout_secs = 5;
    cfg.catalog.debounce_ms = 40;
    cfg
}

pub struct Harness {
    pub state: AppState,
    pub mock: MockBackend,
    pub tab: Tab,
    pub outbound: mpsc::UnboundedReceiver<ServerWsMessage>,
}

pub async fn harness() -> Harness {
    let (base_url, mock) = spawn_backend().await;
    let state = AppState::new(test_config(&base_url)).await.unwrap();
    let (tx, outbound) = mpsc::unbounded_channel();
    let tab = Tab::new(&state, tx);
    Harness { state, mock, tab, outbound }
}

/// Wait for the next pushed message, failing the test after a second.
pub async fn next_pushed(rx: &mut mpsc::UnboundedReceiver<ServerWsMessage>) -> ServerWsMessage {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("timed out waiting for a pushed message")
        .expect("outbound channel closed")
}

pub fn toasts(msgs: &[ServerWsMessage]) -> Vec<String> {
    msgs.iter()
        .filter_map(|m| match m {
            ServerWsMessage::Toast { message, .. } => Some(message.clone()),
            _ => None,
        })
        .collect()
}

pub fn navigations(msgs: &[ServerWsMessage]) -> Vec<String> {
    msgs.iter()
        .filter_map(|m| match m {
            ServerWsMessage::Navigate { path } => Some(path.clone()),
            _ => None,
        })
        .collect()
}
