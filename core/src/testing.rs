//! Scripted transport for exercising the client without a server.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Result<HttpResponse, TransportError>>,
    requests: Vec<HttpRequest>,
}

/// Replays queued replies in order and records every request it receives.
/// Clones share the same script, so a test can keep a handle after moving
/// one copy into the client.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    script: Rc<RefCell<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, status: u16, body: impl Into<String>) {
        self.script
            .borrow_mut()
            .replies
            .push_back(Ok(HttpResponse::new(status, body)));
    }

    pub fn push_failure(&self, error: TransportError) {
        self.script.borrow_mut().replies.push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.script.borrow().requests.clone()
    }

    /// Number of recorded requests using `method`.
    pub fn count(&self, method: HttpMethod) -> usize {
        self.script
            .borrow()
            .requests
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    pub fn pending_replies(&self) -> usize {
        self.script.borrow().replies.len()
    }
}

impl Transport for ScriptedTransport {
    fn execute(&mut self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut script = self.script.borrow_mut();
        script.requests.push(request);
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::NoResponse("no scripted reply left".to_string())))
    }
}
