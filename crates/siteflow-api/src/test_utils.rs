//! In-memory transport for exercising the client without a server.

use crate::error::TransportError;
use crate::transport::{HttpRequest, HttpResponse, Transport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<HttpResponse, String>>,
    sent: Vec<HttpRequest>,
}

/// Transport that answers from a queue of canned replies and records every request.
///
/// Clones share the same queue and log, so a test can keep a handle after
/// moving the transport into a client.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a response with the given status and body.
    pub fn reply(&self, status: u16, body: impl Into<String>) -> &Self {
        self.script()
            .replies
            .push_back(Ok(HttpResponse::new(status, body)));
        self
    }

    /// Queue a connection failure.
    pub fn fail(&self, message: impl Into<String>) -> &Self {
        self.script().replies.push_back(Err(message.into()));
        self
    }

    /// Requests sent so far, oldest first.
    pub fn sent(&self) -> Vec<HttpRequest> {
        self.script().sent.clone()
    }

    pub fn sent_count(&self) -> usize {
        self.script().sent.len()
    }

    /// URLs of the requests sent so far.
    pub fn urls(&self) -> Vec<String> {
        self.script().sent.iter().map(|r| r.url.clone()).collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut script = self.script();
        script.sent.push(request.clone());
        match script.replies.pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TransportError::Connection(message)),
            None => Err(TransportError::Connection(format!(
                "no scripted reply for {} {}",
                request.method.as_str(),
                request.url
            ))),
        }
    }
}
