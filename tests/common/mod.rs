#![allow(dead_code)]

use async_trait::async_trait;
use rdalle::{ClientConfig, DalleClient, DalleError, HttpRequest, HttpResponse, HttpTransport};
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE: &str = "http://dalle.test/api";

/// One scripted answer for a route.
#[derive(Clone)]
pub struct Reply {
    pub status: u16,
    pub chunks: Vec<Result<Vec<u8>, String>>,
    pub delay: Duration,
    pub fail: Option<String>,
}

impl Reply {
    pub fn bytes(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            chunks: vec![Ok(body.into())],
            delay: Duration::ZERO,
            fail: None,
        }
    }

    pub fn text(status: u16, body: &str) -> Self {
        Self::bytes(status, body.as_bytes().to_vec())
    }

    pub fn json(status: u16, body: Value) -> Self {
        Self::text(status, &body.to_string())
    }

    pub fn transport_error(message: &str) -> Self {
        Self {
            fail: Some(message.to_string()),
            ..Self::bytes(0, Vec::<u8>::new())
        }
    }

    /// 200 response whose body breaks after the first chunk.
    pub fn broken_body(first: impl Into<Vec<u8>>, error: &str) -> Self {
        Self {
            chunks: vec![Ok(first.into()), Err(error.to_string())],
            ..Self::bytes(200, Vec::<u8>::new())
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory transport: records every request and replays scripted replies
/// keyed by `"<METHOD> <path>"`. The last reply of a route repeats forever.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<HttpRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: &str, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry(format!("{} {}", method, path))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method.as_str() == method && path_of(&r.url) == path)
            .count()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| path_of(&r.url).starts_with(prefix))
            .count()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_reply(&self, key: &str) -> Reply {
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Reply::text(404, "no route"),
        }
    }
}

pub fn path_of(url: &str) -> String {
    let rest = url.strip_prefix(BASE).unwrap_or(url);
    rest.split('?').next().unwrap_or_default().to_string()
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> rdalle::Result<HttpResponse> {
        let key = format!("{} {}", request.method, path_of(&request.url));
        self.requests.lock().unwrap().push(request);
        let reply = self.next_reply(&key);

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if !reply.delay.is_zero() {
            tokio::time::sleep(reply.delay).await;
        }
        if let Some(message) = reply.fail {
            return Err(DalleError::Transport(message));
        }

        let chunks = reply
            .chunks
            .into_iter()
            .map(|chunk| chunk.map_err(DalleError::Transport))
            .collect();
        Ok(HttpResponse::from_chunks(reply.status, chunks))
    }
}

pub fn client(transport: &Arc<MockTransport>) -> DalleClient {
    let config = ClientConfig::new("sk-test").with_base_url(BASE);
    DalleClient::with_transport(config, transport.clone()).unwrap()
}

pub fn task_json(id: &str, status: &str, generation_ids: &[&str]) -> Value {
    let data: Vec<Value> = generation_ids
        .iter()
        .map(|g| {
            json!({
                "id": g,
                "object": "generation",
                "created": 1657000100,
                "generation_type": "ImageGeneration",
                "generation": {"image_path": format!("https://cdn.test/{}.webp", g)}
            })
        })
        .collect();

    json!({
        "object": "task",
        "id": id,
        "created": 1657000000,
        "task_type": "text2im",
        "status": status,
        "prompt_id": format!("prompt-{}", id),
        "prompt": {
            "id": format!("prompt-{}", id),
            "object": "prompt",
            "created": 1657000000,
            "prompt_type": "CaptionPrompt",
            "prompt": {"caption": "a red fox"},
            "parent_generation_id": null
        },
        "generations": {"object": "list", "data": data}
    })
}

pub fn task(id: &str, status: &str, generation_ids: &[&str]) -> rdalle::Task {
    serde_json::from_value(task_json(id, status, generation_ids)).unwrap()
}
