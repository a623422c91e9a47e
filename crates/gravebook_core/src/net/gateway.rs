//! HTTP implementation of the backend gateway.
//!
//! # Responsibility
//! - Issue requests against the configured backend base URL with a
//!   caller-supplied timeout on every call.
//! - Decode non-2xx responses into status + message + optional server
//!   suggestion, surfacing the suggestion verbatim.
//!
//! # Invariants
//! - No retries here; callers own retry policy.
//! - Connection-level failures are reported as `Unreachable`, never mixed
//!   into HTTP-level errors.

use super::{BackendGateway, GatewayResponse, Method, TransportError, TransportResult};
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// JSON error envelope the backend uses for non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    suggestion: Option<String>,
}

/// Blocking HTTP gateway. Lives on the background worker thread; the
/// interactive thread never calls it directly.
pub struct HttpGateway {
    http: Client,
    base_url: Url,
}

impl HttpGateway {
    /// Builds a gateway for one backend base URL, e.g.
    /// `http://localhost:5000`.
    pub fn new(base_url: &str) -> TransportResult<Self> {
        let base_url = Url::parse(base_url).map_err(|err| TransportError::InvalidUrl {
            detail: format!("{base_url}: {err}"),
        })?;
        let http = Client::builder()
            .build()
            .map_err(|err| TransportError::InvalidUrl {
                detail: format!("http client setup failed: {err}"),
            })?;
        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str, query: &[(&str, &str)]) -> TransportResult<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|err| TransportError::InvalidUrl {
                detail: format!("{path}: {err}"),
            })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter().copied());
        }
        Ok(url)
    }
}

impl BackendGateway for HttpGateway {
    fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
        timeout_ms: u64,
    ) -> TransportResult<GatewayResponse> {
        let url = self.url(path, query)?;

        let mut request = match method {
            Method::Get => self.http.get(url),
            Method::Put => self.http.put(url),
            Method::Delete => self.http.delete(url),
        }
        .timeout(Duration::from_millis(timeout_ms));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|err| TransportError::Unreachable {
            detail: err.to_string(),
        })?;

        let status = response.status().as_u16();
        let body_text = response
            .text()
            .map_err(|err| TransportError::Unreachable {
                detail: format!("response body read failed: {err}"),
            })?;

        if !(200..300).contains(&status) {
            let decoded: Option<ErrorBody> = serde_json::from_str(&body_text).ok();
            let (message, suggestion) = match decoded {
                Some(body) => (
                    body.error
                        .unwrap_or_else(|| snippet(&body_text)),
                    body.suggestion,
                ),
                None => (snippet(&body_text), None),
            };
            warn!(
                "event=backend_request module=net status=http_error method={} path={path} http_status={status}",
                method.as_str()
            );
            return Err(TransportError::Http {
                status,
                message,
                suggestion,
            });
        }

        debug!(
            "event=backend_request module=net status=ok method={} path={path} http_status={status}",
            method.as_str()
        );
        Ok(GatewayResponse {
            status,
            body: body_text,
        })
    }
}

/// First part of a body for error messages; keeps logs and operator
/// dialogs bounded.
fn snippet(body: &str) -> String {
    const MAX_CHARS: usize = 200;
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty body)".to_string();
    }
    let mut out: String = trimmed.chars().take(MAX_CHARS).collect();
    if trimmed.chars().count() > MAX_CHARS {
        out.push_str("...");
    }
    out
}
