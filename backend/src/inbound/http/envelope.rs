//! Response envelope shared by every endpoint.
//!
//! Every JSON body has the shape
//! `{"trace_id": "...", "errors": [...], "data": ...}`. Successful responses
//! carry an empty `errors` list and a `data` payload; failures carry at least
//! one error and omit `data`.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::domain::Error;
use crate::middleware::RequestTrace;

/// Uniform JSON wrapper around handler results.
///
/// ## Invariants
/// - `trace_id` matches the `X-Api-Id` header of the same response.
/// - `data` is absent whenever `errors` is non-empty.
///
/// # Examples
/// ```
/// use users_api::inbound::http::envelope::Envelope;
///
/// let body = Envelope::success("abc".to_owned(), 42);
/// let json = serde_json::to_value(&body).unwrap();
/// assert_eq!(json["errors"], serde_json::json!([]));
/// assert_eq!(json["data"], 42);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub trace_id: String,
    pub errors: Vec<Error>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Wrap a successful payload.
    pub fn success(trace_id: String, data: T) -> Self {
        Self {
            trace_id,
            errors: Vec::new(),
            data: Some(data),
        }
    }

    /// Wrap a failure; `data` is omitted.
    pub fn failure(trace_id: String, error: Error) -> Self {
        Self {
            trace_id,
            errors: vec![error],
            data: None,
        }
    }
}

/// Build a successful JSON response for the current request.
pub fn respond<T: Serialize>(trace: &RequestTrace, status: StatusCode, data: T) -> HttpResponse {
    HttpResponse::build(status).json(Envelope::success(trace.render(), data))
}
