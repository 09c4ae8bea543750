//! Route table.
//!
//! ```text
//! GET    /health
//! GET    /api/v1/users
//! POST   /api/v1/users
//! GET    /api/v1/users/{id}
//! PUT    /api/v1/users/{id}
//! DELETE /api/v1/users/{id}
//! ```
//!
//! Each handler is registered as a method-guarded resource, so a known path
//! with an unlisted method falls through to [`route_not_found`].

use actix_web::{HttpResponse, ResponseError, web};

use crate::domain::Error;
use crate::inbound::http::error::ApiError;
use crate::inbound::http::{health, users};
use crate::middleware::RequestTrace;

/// Prefix shared by versioned resource routes.
pub const API_PREFIX: &str = "/api/v1";

/// Register every route on an app or scope.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use users_api::inbound::http::routes::{configure, route_not_found};
///
/// let app = App::new()
///     .configure(configure)
///     .default_service(web::to(route_not_found));
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health).service(
        web::scope(API_PREFIX)
            .service(users::list_users)
            .service(users::create_user)
            .service(users::get_user)
            .service(users::update_user)
            .service(users::delete_user),
    );
}

/// Fallback for unknown paths and unmatched methods.
pub async fn route_not_found(trace: RequestTrace) -> HttpResponse {
    ApiError::new(trace, Error::not_found("Resource not found")).error_response()
}
