//! Address-to-coordinate geocoding client.
//!
//! # Responsibility
//! - Resolve a free-text address into exactly one best-match coordinate.
//! - Classify failures so the operator can tell "start the backend" from
//!   "check your address".
//!
//! # Invariants
//! - Empty input fails fast; no network call is issued.
//! - Only connection-level failures are retried, exactly once, with the
//!   same timeout. A malformed or empty payload is never retried.
//! - The client performs no caching; resolved coordinates are stored on
//!   the entity by the record store.

use super::{BackendGateway, GatewayResponse, Method, TransportError};
use crate::model::coordinate::Coordinate;
use log::{info, warn};
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

const GEOCODE_PATH: &str = "/api/geocode";
/// One retry after the initial attempt, connection-class failures only.
const MAX_ATTEMPTS: u32 = 2;
/// Fallback hint when the backend sends none; mirrors the hint the
/// backend gives for unresolvable addresses.
const NO_RESULTS_SUGGESTION: &str =
    "Try a more specific address, e.g. \"Cemetery Name, City, State\"";

/// Successful resolution: one best match plus operator-facing context.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    /// Canonical address string for operator confirmation.
    pub formatted_address: String,
    /// Formatted address of the second-ranked candidate, when the payload
    /// carried more than one. Informational only; never blocks.
    pub runner_up: Option<String>,
}

pub type GeocodeResult = Result<ResolvedLocation, GeocodeError>;

/// Geocoding failure, classified mutually exclusively.
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeError {
    /// Address was empty after trimming; nothing was sent.
    InvalidInput,
    /// Connection refused/reset or timed out on every attempt; the
    /// request never produced bytes.
    BackendUnreachable { attempts: u32, detail: String },
    /// A response arrived but its body is not the expected payload
    /// (covers empty and non-JSON bodies).
    MalformedResponse { detail: String },
    /// Payload decoded cleanly but held zero candidates.
    NoResultsFound { suggestion: String },
    /// HTTP-level rejection, propagated unmodified from the gateway.
    Transport(TransportError),
}

impl Display for GeocodeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput => write!(f, "geocoding needs a non-empty address"),
            Self::BackendUnreachable { attempts, detail } => write!(
                f,
                "geocoding backend unreachable after {attempts} attempts: {detail}"
            ),
            Self::MalformedResponse { detail } => {
                write!(f, "geocoding response was not a valid payload: {detail}")
            }
            Self::NoResultsFound { suggestion } => {
                write!(f, "no coordinates found for this address; {suggestion}")
            }
            Self::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl Error for GeocodeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodePayload {
    results: Vec<GeocodeCandidate>,
    #[serde(default)]
    suggestion: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeCandidate {
    lat: f64,
    lng: f64,
    formatted_address: String,
}

/// Client for the backend's geocoding endpoint.
pub struct GeocodeClient {
    gateway: Arc<dyn BackendGateway>,
}

impl GeocodeClient {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self { gateway }
    }

    /// Resolves an address into its best-match coordinate.
    ///
    /// `timeout_ms` bounds each attempt; geocoding must never hold up the
    /// session indefinitely.
    pub fn resolve(&self, address: &str, timeout_ms: u64) -> GeocodeResult {
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(GeocodeError::InvalidInput);
        }

        let response = self.request_with_retry(trimmed, timeout_ms)?;
        let location = decode_payload(&response)?;
        info!(
            "event=geocode_resolve module=net status=ok lat={} lng={}",
            location.coordinate.latitude, location.coordinate.longitude
        );
        Ok(location)
    }

    fn request_with_retry(
        &self,
        address: &str,
        timeout_ms: u64,
    ) -> Result<GatewayResponse, GeocodeError> {
        let mut last_detail = String::new();
        for attempt in 1..=MAX_ATTEMPTS {
            match self.gateway.request(
                Method::Get,
                GEOCODE_PATH,
                &[("address", address)],
                None,
                timeout_ms,
            ) {
                Ok(response) => return Ok(response),
                Err(TransportError::Unreachable { detail }) => {
                    warn!(
                        "event=geocode_resolve module=net status=unreachable attempt={attempt} error={detail}"
                    );
                    last_detail = detail;
                }
                Err(err) => return Err(GeocodeError::Transport(err)),
            }
        }
        Err(GeocodeError::BackendUnreachable {
            attempts: MAX_ATTEMPTS,
            detail: last_detail,
        })
    }
}

fn decode_payload(response: &GatewayResponse) -> GeocodeResult {
    let payload: GeocodePayload =
        serde_json::from_str(&response.body).map_err(|err| GeocodeError::MalformedResponse {
            detail: err.to_string(),
        })?;

    let mut candidates = payload.results.into_iter();
    let Some(best) = candidates.next() else {
        return Err(GeocodeError::NoResultsFound {
            suggestion: payload
                .suggestion
                .unwrap_or_else(|| NO_RESULTS_SUGGESTION.to_string()),
        });
    };

    // A candidate with out-of-range values is backend garbage, not a
    // missing result.
    let coordinate =
        Coordinate::new(best.lat, best.lng).map_err(|err| GeocodeError::MalformedResponse {
            detail: err.to_string(),
        })?;

    Ok(ResolvedLocation {
        coordinate,
        formatted_address: best.formatted_address,
        runner_up: candidates.next().map(|candidate| candidate.formatted_address),
    })
}
