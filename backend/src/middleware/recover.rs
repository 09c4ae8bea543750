//! Panic recovery middleware.
//!
//! Converts a panic raised while handling a request into a 500 envelope so
//! the worker keeps serving. The panic payload is logged and never sent to
//! the client.
//!
//! The request is consumed by the router, which needs sole ownership of it to
//! record path matches, so a recovered panic surfaces as an [`ApiError`]
//! rather than a response built from a retained request.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::task::{Context, Poll};

use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, HttpMessage};
use futures_util::FutureExt;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::error;

use crate::domain::Error as EnvelopeError;
use crate::inbound::http::error::ApiError;
use crate::middleware::trace::RequestTrace;

/// Middleware turning handler panics into `INTERNAL_ERROR` responses.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use users_api::middleware::Recover;
///
/// let app = App::new().wrap(Recover);
/// ```
#[derive(Clone)]
pub struct Recover;

impl<S, B> Transform<S, ServiceRequest> for Recover
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = RecoverMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RecoverMiddleware { service }))
    }
}

/// Service wrapper produced by [`Recover`].
pub struct RecoverMiddleware<S> {
    service: S,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

impl<S, B> Service<ServiceRequest> for RecoverMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().clone();
        let path = req.path().to_owned();
        let trace = RequestTrace::from_extensions(&req.extensions());
        let dispatched = panic::catch_unwind(AssertUnwindSafe(|| self.service.call(req)));

        Box::pin(async move {
            let outcome = match dispatched {
                Ok(fut) => AssertUnwindSafe(fut).catch_unwind().await,
                Err(payload) => Err(payload),
            };

            match outcome {
                Ok(result) => result.map(ServiceResponse::map_into_boxed_body),
                Err(payload) => {
                    error!(
                        %method,
                        %path,
                        panic = panic_message(payload.as_ref()),
                        "request handler panicked"
                    );
                    let error = EnvelopeError::internal("Internal server error");
                    Err(ApiError::new(trace, error).into())
                }
            }
        })
    }
}
