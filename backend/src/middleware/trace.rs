//! Tracing middleware attaching a request-scoped trace identifier.
//!
//! Each incoming request receives a UUID [`TraceId`] stored in the request's
//! extensions. Handlers receive it explicitly through the [`RequestTrace`]
//! extractor, and every response mirrors it in the `X-Api-Id` header.

use std::task::{Context, Poll};

use actix_web::dev::{
    Extensions, Payload, Service, ServiceRequest, ServiceResponse, Transform,
};
use actix_web::http::header::{HeaderName, HeaderValue};
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::error;

use crate::domain::{TRACE_ID_HEADER, TraceId, render_trace_id};

/// Trace identifier of the current request, as seen by handlers.
///
/// Extraction never fails: a request that bypassed [`Trace`] yields an empty
/// context which renders as `"unknown"`.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use users_api::middleware::RequestTrace;
///
/// async fn handler(trace: RequestTrace) -> HttpResponse {
///     HttpResponse::Ok().body(trace.render())
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestTrace(Option<TraceId>);

impl RequestTrace {
    /// Wrap a known trace identifier.
    #[must_use]
    pub fn new(trace_id: TraceId) -> Self {
        Self(Some(trace_id))
    }

    /// Read the trace identifier stored by [`Trace`] in request extensions.
    #[must_use]
    pub fn from_extensions(extensions: &Extensions) -> Self {
        Self(extensions.get::<TraceId>().copied())
    }

    /// Read the trace identifier attached to a request.
    #[must_use]
    pub fn lookup(req: &HttpRequest) -> Self {
        Self::from_extensions(&req.extensions())
    }

    /// The identifier, when one was assigned.
    #[must_use]
    pub fn trace_id(&self) -> Option<TraceId> {
        self.0
    }

    /// Wire form of the identifier, or `"unknown"` when none was assigned.
    #[must_use]
    pub fn render(&self) -> String {
        render_trace_id(self.0)
    }
}

impl FromRequest for RequestTrace {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self::lookup(req)))
    }
}

/// Middleware assigning a fresh [`TraceId`] to every request and adding an
/// `X-Api-Id` header to every response.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use users_api::middleware::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Clone)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service wrapper produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
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
        let trace_id = TraceId::generate();
        req.extensions_mut().insert(trace_id);
        let fut = self.service.call(req);
        Box::pin(async move {
            let mut res = fut.await?;
            match HeaderValue::from_str(&trace_id.to_string()) {
                Ok(value) => {
                    res.headers_mut()
                        .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                }
                Err(error) => {
                    error!(
                        %error,
                        trace_id = %trace_id,
                        "failed to encode trace identifier header"
                    );
                }
            }
            Ok(res)
        })
    }
}
