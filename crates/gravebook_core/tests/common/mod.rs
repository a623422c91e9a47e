//! Shared test doubles for the gateway seam.

use gravebook_core::{BackendGateway, GatewayResponse, Method, TransportError};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// One request observed by the stub.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

type Handler = Box<
    dyn Fn(&RecordedCall) -> Result<GatewayResponse, TransportError> + Send + Sync + 'static,
>;

/// In-memory gateway stub: scripted FIFO responses or a handler closure,
/// plus full call recording.
pub struct StubGateway {
    responses: Mutex<VecDeque<Result<GatewayResponse, TransportError>>>,
    handler: Option<Handler>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubGateway {
    /// Stub that answers from a FIFO script and fails `Unreachable` when
    /// the script runs dry.
    pub fn scripted() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            handler: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Stub that routes every request through `handler`.
    pub fn with_handler(
        handler: impl Fn(&RecordedCall) -> Result<GatewayResponse, TransportError>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            handler: Some(Box::new(handler)),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn enqueue_ok(&self, body: &str) {
        self.responses.lock().unwrap().push_back(Ok(GatewayResponse {
            status: 200,
            body: body.to_string(),
        }));
    }

    pub fn enqueue_err(&self, err: TransportError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl BackendGateway for StubGateway {
    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&Value>,
        _timeout_ms: u64,
    ) -> Result<GatewayResponse, TransportError> {
        let call = RecordedCall {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: body.cloned(),
        };
        self.calls.lock().unwrap().push(call.clone());

        if let Some(handler) = &self.handler {
            return handler(&call);
        }
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(TransportError::Unreachable {
                    detail: "stub script exhausted".to_string(),
                })
            })
    }
}

/// Convenience for an unreachable-network error.
pub fn unreachable() -> TransportError {
    TransportError::Unreachable {
        detail: "connection refused".to_string(),
    }
}
