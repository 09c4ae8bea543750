//! Access logging middleware.
//!
//! Emits exactly one `request completed` event per request with method, path,
//! final status, and elapsed time. The event is written from a drop guard, so
//! it still fires when the request future is abandoned (client disconnect).
//! Downstream work runs inside an `http_request` span carrying the request
//! and trace identifiers, which correlates every nested log line.
//!
//! The event is written once the response head is ready, before the body is
//! streamed to the client. Every body this service produces is a fully
//! buffered JSON document, so the logged status and duration cover the whole
//! exchange; a streaming body would need the record moved into a body
//! wrapper.

use std::task::{Context, Poll};
use std::time::Instant;

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::StatusCode;
use actix_web::{Error, HttpMessage};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, Span, info, info_span, warn};

use crate::domain::{TraceId, render_trace_id};
use crate::middleware::request_id::RequestId;

/// Middleware recording one access log event per request.
///
/// Install it outside [`crate::middleware::Recover`] so the logged status is
/// the post-recovery one.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use users_api::middleware::AccessLog;
///
/// let app = App::new().wrap(AccessLog);
/// ```
#[derive(Clone)]
pub struct AccessLog;

impl<S, B> Transform<S, ServiceRequest> for AccessLog
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessLogMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessLogMiddleware { service }))
    }
}

/// Service wrapper produced by [`AccessLog`].
pub struct AccessLogMiddleware<S> {
    service: S,
}

/// Pending access log entry, written when dropped.
struct AccessRecord {
    span: Span,
    method: String,
    path: String,
    started: Instant,
    status: Option<StatusCode>,
}

impl AccessRecord {
    fn complete(&mut self, status: StatusCode) {
        self.status = Some(status);
    }
}

impl Drop for AccessRecord {
    fn drop(&mut self) {
        let duration_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let _entered = self.span.enter();
        match self.status {
            Some(status) => info!(
                method = %self.method,
                path = %self.path,
                status = status.as_u16(),
                duration_ms,
                "request completed"
            ),
            None => warn!(
                method = %self.method,
                path = %self.path,
                duration_ms,
                "request abandoned before a response was produced"
            ),
        }
    }
}

impl<S, B> Service<ServiceRequest> for AccessLogMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let (request_id, trace_id) = {
            let extensions = req.extensions();
            (
                extensions
                    .get::<RequestId>()
                    .map(|id| id.as_str().to_owned())
                    .unwrap_or_default(),
                render_trace_id(extensions.get::<TraceId>().copied()),
            )
        };
        let span = info_span!(
            "http_request",
            method = %req.method(),
            path = %req.path(),
            %request_id,
            %trace_id,
        );
        let mut record = AccessRecord {
            span: span.clone(),
            method: req.method().to_string(),
            path: req.path().to_owned(),
            started: Instant::now(),
            status: None,
        };

        let fut = span.in_scope(|| self.service.call(req));
        Box::pin(
            async move {
                let result = fut.await;
                match &result {
                    Ok(res) => record.complete(res.status()),
                    Err(err) => record.complete(err.as_response_error().status_code()),
                }
                drop(record);
                result
            }
            .instrument(span),
        )
    }
}
