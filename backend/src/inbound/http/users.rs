//! Users API handlers.
//!
//! ```text
//! POST   /api/v1/users       {"email":"a@b.com","name":"A"}
//! GET    /api/v1/users
//! GET    /api/v1/users/{id}
//! PUT    /api/v1/users/{id}  {"name":"B"}
//! DELETE /api/v1/users/{id}
//! ```
//!
//! The collection routes also answer on `/api/v1/users/`.
//!
//! Bodies are decoded by hand so malformed JSON, and bodies the payload
//! extractor refuses (over the size limit, broken chunking), render as an
//! `INVALID_REQUEST` envelope rather than Actix's default error page.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, delete, get, post, put, routes, web};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::domain::ports::UserServiceError;
use crate::domain::{Error, ErrorCode, User, UserChanges, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::envelope::respond;
use crate::inbound::http::error::ApiError;
use crate::inbound::http::state::HttpState;
use crate::middleware::RequestTrace;

/// Confirmation returned by a successful delete.
pub const USER_DELETED_MESSAGE: &str = "User deleted successfully";

/// Request body for `POST /api/v1/users`.
///
/// Missing or `null` fields decode as empty strings and are rejected by the
/// service.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CreateUserRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Request body for `PUT /api/v1/users/{id}`.
///
/// Absent or empty fields keep their stored value.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(value: UpdateUserRequest) -> Self {
        Self::new(value.email, value.name)
    }
}

/// `data` payload carrying a single user.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserPayload {
    pub user: User,
}

/// `data` payload carrying the user list.
#[derive(Debug, Serialize, Deserialize)]
pub struct UsersPayload {
    pub users: Vec<User>,
}

/// `data` payload carrying a confirmation message.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessagePayload {
    pub message: String,
}

/// Raw request body, or the reason the payload extractor refused it.
type RawBody = Result<web::Bytes, actix_web::Error>;

fn decode_body<T: DeserializeOwned>(trace: RequestTrace, body: RawBody) -> ApiResult<T> {
    let invalid = || ApiError::new(trace, Error::invalid_request("Invalid request payload"));
    let bytes = body.map_err(|err| {
        debug!(error = %err, "request body rejected");
        invalid()
    })?;
    serde_json::from_slice(&bytes).map_err(|_| invalid())
}

fn parse_user_id(trace: RequestTrace, raw: &str) -> ApiResult<UserId> {
    raw.parse()
        .map_err(|_| ApiError::new(trace, Error::invalid_id("Invalid user ID").with_field("id")))
}

fn operation_failed(trace: RequestTrace, code: ErrorCode) -> impl FnOnce(UserServiceError) -> ApiError {
    move |err| ApiError::new(trace, Error::new(code, err.to_string()))
}

/// Create a user.
///
/// Validation failures share `CREATE_FAILED` with store failures.
#[routes]
#[post("/users")]
#[post("/users/")]
pub async fn create_user(
    state: web::Data<HttpState>,
    trace: RequestTrace,
    body: RawBody,
) -> ApiResult<HttpResponse> {
    let request: CreateUserRequest = decode_body(trace, body)?;
    let user = state
        .users
        .create_user(request.email, request.name)
        .await
        .map_err(operation_failed(trace, ErrorCode::CreateFailed))?;
    Ok(respond(&trace, StatusCode::CREATED, UserPayload { user }))
}

/// Fetch one user by id.
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    trace: RequestTrace,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(trace, &path)?;
    let user = state.users.get_user(id).await.map_err(|err| {
        let code = if err.is_not_found() {
            ErrorCode::NotFound
        } else {
            ErrorCode::FetchFailed
        };
        ApiError::new(trace, Error::new(code, err.to_string()))
    })?;
    Ok(respond(&trace, StatusCode::OK, UserPayload { user }))
}

/// List all users, most recently created first.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use users_api::inbound::http::users::list_users;
///
/// let app = App::new().service(web::scope("/api/v1").service(list_users));
/// ```
#[routes]
#[get("/users")]
#[get("/users/")]
pub async fn list_users(
    state: web::Data<HttpState>,
    trace: RequestTrace,
) -> ApiResult<HttpResponse> {
    let users = state
        .users
        .list_users()
        .await
        .map_err(operation_failed(trace, ErrorCode::FetchFailed))?;
    Ok(respond(&trace, StatusCode::OK, UsersPayload { users }))
}

/// Partially update a user.
///
/// A missing user renders as `UPDATE_FAILED`.
#[put("/users/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    trace: RequestTrace,
    path: web::Path<String>,
    body: RawBody,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(trace, &path)?;
    let request: UpdateUserRequest = decode_body(trace, body)?;
    let user = state
        .users
        .update_user(id, request.into())
        .await
        .map_err(operation_failed(trace, ErrorCode::UpdateFailed))?;
    Ok(respond(&trace, StatusCode::OK, UserPayload { user }))
}

/// Delete a user.
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    trace: RequestTrace,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = parse_user_id(trace, &path)?;
    state
        .users
        .delete_user(id)
        .await
        .map_err(operation_failed(trace, ErrorCode::DeleteFailed))?;
    Ok(respond(
        &trace,
        StatusCode::OK,
        MessagePayload {
            message: USER_DELETED_MESSAGE.to_owned(),
        },
    ))
}
