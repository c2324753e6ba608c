//! Shared helpers: an in-process webhook endpoint and polling waits.

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use ghost_monitor::status::{CollectingStatus, StatusEvent};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

#[derive(Clone)]
struct HookState {
    received: Arc<Mutex<Vec<serde_json::Value>>>,
    status: Arc<AtomicU16>,
}

async fn receive(
    State(state): State<HookState>,
    Json(body): Json<serde_json::Value>,
) -> (StatusCode, String) {
    state.received.lock().unwrap().push(body);
    let code = StatusCode::from_u16(state.status.load(Ordering::SeqCst))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if code == StatusCode::NO_CONTENT {
        (code, String::new())
    } else {
        (code, "server said no".to_string())
    }
}

/// Webhook endpoint on `127.0.0.1` that records every JSON body it gets.
pub struct WebhookServer {
    pub url: Url,
    received: Arc<Mutex<Vec<serde_json::Value>>>,
    status: Arc<AtomicU16>,
    handle: JoinHandle<()>,
}

impl WebhookServer {
    /// Start a server answering every post with `status`.
    pub async fn start(status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let state = HookState {
            received: Arc::new(Mutex::new(Vec::new())),
            status: Arc::new(AtomicU16::new(status)),
        };
        let app = Router::new()
            .route("/hook", post(receive))
            .with_state(state.clone());
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: Url::parse(&format!("http://{addr}/hook")).unwrap(),
            received: state.received,
            status: state.status,
            handle,
        }
    }

    /// Change the status returned from now on.
    pub fn respond_with(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }

    /// Raw JSON bodies received so far.
    pub fn bodies(&self) -> Vec<serde_json::Value> {
        self.received.lock().unwrap().clone()
    }

    /// `content` field of every body received so far.
    pub fn contents(&self) -> Vec<String> {
        self.bodies()
            .iter()
            .filter_map(|b| b["content"].as_str().map(String::from))
            .collect()
    }
}

impl Drop for WebhookServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Poll `cond` every 10ms for up to 5s.
pub async fn wait_until<F: FnMut() -> bool>(mut cond: F, what: &str) {
    for _ in 0..500 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}

/// Number of collected status events matching `pred`.
pub fn count_status(status: &CollectingStatus, pred: impl Fn(&StatusEvent) -> bool) -> usize {
    status.events().iter().filter(|e| pred(e)).count()
}

/// Append text to a file, creating it if needed.
pub fn append(path: &Path, text: &str) {
    use std::io::Write;
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    f.write_all(text.as_bytes()).unwrap();
}

/// Watch context using a real webhook sink, fast polling and collected status.
pub fn context(
    templates: &Path,
    status: &Arc<CollectingStatus>,
) -> ghost_monitor::watcher::WatchContext {
    use ghost_monitor::sink::{SuccessPolicy, WebhookSink};
    use ghost_monitor::templates::TemplateStore;
    use ghost_monitor::watcher::WatchContext;

    let templates = Arc::new(TemplateStore::open(templates));
    let sink = Arc::new(WebhookSink::new(SuccessPolicy::Strict).unwrap());
    WatchContext::new(templates, sink, status.clone()).with_poll_interval(Duration::from_millis(10))
}

/// Events reporting that a watcher started tailing.
pub fn monitoring_count(status: &CollectingStatus) -> usize {
    count_status(status, |e| matches!(e, StatusEvent::Monitoring { .. }))
}
