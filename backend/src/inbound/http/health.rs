//! Liveness endpoint.
//!
//! The probe is stateless and never touches the store.

use actix_web::http::{StatusCode, header};
use actix_web::{HttpResponse, get, web};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::inbound::http::envelope::Envelope;
use crate::inbound::http::state::HttpState;
use crate::middleware::RequestTrace;

/// Reported service status.
pub const HEALTHY: &str = "healthy";

/// `data` payload of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthPayload {
    pub status: String,
    /// Current time in RFC 3339.
    pub timestamp: String,
    pub trace_id: String,
}

/// Report that the process is serving requests.
#[get("/health")]
pub async fn health(state: web::Data<HttpState>, trace: RequestTrace) -> HttpResponse {
    let payload = HealthPayload {
        status: HEALTHY.to_owned(),
        timestamp: state.clock.utc().to_rfc3339_opts(SecondsFormat::Secs, true),
        trace_id: trace.render(),
    };
    HttpResponse::build(StatusCode::OK)
        .insert_header((header::CACHE_CONTROL, "no-store"))
        .json(Envelope::success(trace.render(), payload))
}
