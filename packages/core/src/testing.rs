//! Recording transport for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::client::GraphClient;
use crate::config::GraphConfig;
use crate::error::GraphError;
use crate::transport::{HttpRequest, HttpResponse, Transport};

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct StubTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every `execute`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push_json(&self, status: u16, body: &str) {
        self.push_bytes(status, body.as_bytes().to_vec());
    }

    pub fn push_bytes(&self, status: u16, body: Vec<u8>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse { status, body }));
    }

    pub fn push_failure(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for StubTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, GraphError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(GraphError::Transport(message)),
            None => Err(GraphError::Transport("no stubbed response left".into())),
        }
    }
}

/// A client on the default base URL that talks to `transport`.
pub fn client_with(transport: StubTransport) -> (GraphClient, Arc<StubTransport>) {
    let transport = Arc::new(transport);
    let client = GraphClient::with_transport(
        &GraphConfig::default(),
        Arc::clone(&transport) as Arc<dyn Transport>,
    )
    .unwrap();
    (client, transport)
}
