//! Scripted in-process transport for driving the client end to end.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::future::BoxFuture;
use serde_json::json;
use tokio::time::Instant;

use realengine::prelude::*;

pub const TOKEN: &str = "test-token";
pub const ROOT: &str = "http://localhost:8080/";

/// One scripted reaction to the next request.
pub enum Step {
    Respond(HttpResponse),
    Fail(&'static str),
    /// Never answers; the call stays in flight until dropped.
    Hang,
}

/// Answers requests from a fixed script and records what it was sent.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<(Instant, HttpRequest)>>,
    dropped_in_flight: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(steps.into()),
            ..Default::default()
        })
    }

    pub fn attempts(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn sent_at(&self) -> Vec<Instant> {
        self.requests.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }

    /// Calls that were still in flight when their future was dropped.
    pub fn dropped_in_flight(&self) -> usize {
        self.dropped_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlight(Arc<AtomicUsize>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

impl Transport for ScriptedTransport {
    fn execute(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        self.requests.lock().unwrap().push((Instant::now(), request));
        let step = self.script.lock().unwrap().pop_front();
        let counter = Arc::clone(&self.dropped_in_flight);
        Box::pin(async move {
            match step {
                Some(Step::Respond(resp)) => Ok(resp),
                Some(Step::Fail(msg)) => Err(TransportError::Connection(msg.to_string())),
                Some(Step::Hang) | None => {
                    let _guard = InFlight(counter);
                    futures_util::future::pending::<()>().await;
                    unreachable!()
                }
            }
        })
    }
}

pub fn client(transport: Arc<ScriptedTransport>, max_retries: u32) -> RealEngineClient {
    RealEngineClient::builder()
        .token(TOKEN)
        .root_url(ROOT)
        .max_retries(max_retries)
        .transport(transport)
        .build()
        .expect("client should build")
}

pub fn success(data: &str) -> Step {
    Step::Respond(
        HttpResponse::new(200).with_body(json!({ "success": true, "data": data }).to_string()),
    )
}

pub fn remote_error(status: u16, id: &str, msg: &str) -> Step {
    Step::Respond(HttpResponse::new(status).with_body(
        json!({ "success": false, "error": { "id": id, "msg": msg } }).to_string(),
    ))
}

pub fn server_error(status: u16) -> Step {
    Step::Respond(HttpResponse::new(status).with_body(
        json!({ "success": false, "error": { "id": "srv", "msg": "Something went wrong" } })
            .to_string(),
    ))
}

pub fn not_ready(location: &str) -> Step {
    Step::Respond(
        HttpResponse::new(202)
            .with_header("Location", location)
            .with_body(json!({ "success": true }).to_string()),
    )
}

pub fn not_ready_after(location: &str, retry_after: &str) -> Step {
    Step::Respond(
        HttpResponse::new(202)
            .with_header("Location", location)
            .with_header("X-Retry-After", retry_after),
    )
}

pub fn query_param(req: &HttpRequest, name: &str) -> Option<String> {
    req.url
        .query_pairs()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

/// Paused-clock timer deadlines land on millisecond ticks.
pub fn assert_about(actual: std::time::Duration, expected: std::time::Duration) {
    let slack = std::time::Duration::from_millis(5);
    assert!(
        actual >= expected && actual <= expected + slack,
        "expected ~{:?}, got {:?}",
        expected,
        actual
    );
}
