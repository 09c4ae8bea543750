//! Inbound request identifier normalisation.
//!
//! Reuses a caller-supplied `X-Request-Id` when it is present and sane,
//! otherwise synthesises one. The identifier only feeds log correlation and is
//! independent of the response envelope's trace identifier.

use std::fmt;
use std::task::{Context, Poll};

use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use futures_util::future::{Ready, ready};
use uuid::Uuid;

/// Header carrying an externally supplied request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Request identifier stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// Accept an inbound header value when it is non-empty and bounded.
    ///
    /// # Examples
    /// ```
    /// use users_api::middleware::RequestId;
    ///
    /// assert!(RequestId::from_inbound("abc-123").is_some());
    /// assert!(RequestId::from_inbound("   ").is_none());
    /// ```
    #[must_use]
    pub fn from_inbound(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > MAX_REQUEST_ID_LEN {
            return None;
        }
        Some(Self(trimmed.to_owned()))
    }

    /// Synthesise a fresh identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Middleware storing a [`RequestId`] in request extensions.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use users_api::middleware::InboundRequestId;
///
/// let app = App::new().wrap(InboundRequestId);
/// ```
#[derive(Clone)]
pub struct InboundRequestId;

impl<S, B> Transform<S, ServiceRequest> for InboundRequestId
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = InboundRequestIdMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(InboundRequestIdMiddleware { service }))
    }
}

/// Service wrapper produced by [`InboundRequestId`].
pub struct InboundRequestIdMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for InboundRequestIdMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = S::Future;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(RequestId::from_inbound)
            .unwrap_or_else(RequestId::generate);
        req.extensions_mut().insert(request_id);
        self.service.call(req)
    }
}
