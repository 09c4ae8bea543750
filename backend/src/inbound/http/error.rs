//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while allowing Actix
//! handlers to turn failures into envelope responses with consistent status
//! codes.

use std::fmt;

use actix_web::http::StatusCode;
use actix_web::http::header::HeaderName;
use actix_web::{HttpResponse, ResponseError};

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};
use crate::inbound::http::envelope::Envelope;
use crate::middleware::RequestTrace;

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// A domain error bound to the trace of the request that produced it.
#[derive(Debug, Clone)]
pub struct ApiError {
    trace: RequestTrace,
    error: Error,
}

impl ApiError {
    /// Bind `error` to the current request's trace.
    pub fn new(trace: RequestTrace, error: Error) -> Self {
        Self { trace, error }
    }

    /// The wrapped envelope error.
    #[must_use]
    pub fn error(&self) -> &Error {
        &self.error
    }
}

/// HTTP status for an error code.
#[must_use]
pub fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest | ErrorCode::InvalidId => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::CreateFailed
        | ErrorCode::UpdateFailed
        | ErrorCode::DeleteFailed
        | ErrorCode::FetchFailed
        | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        Error::internal("Internal server error")
    } else {
        error.clone()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_for(self.error.code())
    }

    /// Render the failure envelope.
    ///
    /// The `X-Api-Id` header is set here as well, so errors that bypass the
    /// trace middleware's response path still carry it.
    fn error_response(&self) -> HttpResponse {
        let trace_id = self.trace.render();
        let body: Envelope<()> =
            Envelope::failure(trace_id.clone(), redact_if_internal(&self.error));
        HttpResponse::build(self.status_code())
            .insert_header((HeaderName::from_static(TRACE_ID_HEADER), trace_id))
            .json(body)
    }
}
