//! Test helpers: a scripted `HttpTransport` that records every call.

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpTransport};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

struct Route {
    pattern: String,
    /// Replies are consumed front to back; the last one repeats forever.
    replies: VecDeque<Result<Value, TransportError>>,
}

/// Scripted transport. GETs are answered by the first route whose pattern is a
/// substring of the request URL; unmatched URLs fail with `Connect`.
pub struct StubTransport {
    routes: Mutex<Vec<Route>>,
    head_reply: Result<u16, TransportError>,
    get_calls: AtomicUsize,
    head_calls: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
}

impl Default for StubTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl StubTransport {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            head_reply: Ok(200),
            get_calls: AtomicUsize::new(0),
            head_calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every GET with `err`.
    pub fn failing(err: TransportError) -> Self {
        Self::new().route("", Err(err))
    }

    pub fn route(self, pattern: &str, reply: Result<Value, TransportError>) -> Self {
        self.route_sequence(pattern, vec![reply])
    }

    pub fn route_sequence(self, pattern: &str, replies: Vec<Result<Value, TransportError>>) -> Self {
        self.routes.lock().unwrap().push(Route {
            pattern: pattern.to_string(),
            replies: replies.into(),
        });
        self
    }

    pub fn with_head(mut self, reply: Result<u16, TransportError>) -> Self {
        self.head_reply = reply;
        self
    }

    /// Total GET and HEAD calls.
    pub fn calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst) + self.head_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpTransport for StubTransport {
    fn get_json(&self, request: &HttpRequest) -> Result<Value, TransportError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());

        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .find(|r| request.url.contains(&r.pattern))
            .ok_or_else(|| TransportError::Connect(format!("no route for {}", request.url)))?;

        if route.replies.len() > 1 {
            route.replies.pop_front().unwrap()
        } else {
            route
                .replies
                .front()
                .cloned()
                .unwrap_or_else(|| Err(TransportError::Connect("empty route".into())))
        }
    }

    fn head(&self, _url: &str, _timeout: Duration) -> Result<u16, TransportError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        self.head_reply.clone()
    }
}
