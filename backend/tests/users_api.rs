//! End-to-end tests through the full middleware stack and route table,
//! backed by the in-memory user repository.

use std::io;
use std::sync::{Arc, Mutex};

use actix_web::body::to_bytes;
use actix_web::dev::Service;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, test, web};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mockable::Clock;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use users_api::domain::ports::{UserPersistenceError, UserService, UserServiceError};
use users_api::domain::{User, UserChanges, UserId, UserServiceImpl};
use users_api::inbound::http::app::build_app;
use users_api::inbound::http::state::HttpState;
use users_api::test_support::{InMemoryUserRepository, MutableClock};

struct Harness {
    clock: Arc<MutableClock>,
    repository: Arc<InMemoryUserRepository>,
    state: web::Data<HttpState>,
}

#[fixture]
fn harness() -> Harness {
    let start = Utc
        .with_ymd_and_hms(2025, 6, 1, 9, 0, 0)
        .single()
        .expect("valid timestamp");
    let clock = Arc::new(MutableClock::new(start));
    let shared_clock: Arc<dyn Clock> = clock.clone();
    let repository = Arc::new(InMemoryUserRepository::new(shared_clock.clone()));
    let users = Arc::new(UserServiceImpl::new(repository.clone()));
    let state = web::Data::new(HttpState::new(users, shared_clock));
    Harness {
        clock,
        repository,
        state,
    }
}

struct Reply {
    status: StatusCode,
    header_trace: Option<String>,
    body: Value,
}

async fn read_reply(res: HttpResponse) -> Reply {
    let status = res.status();
    let header_trace = res
        .headers()
        .get("x-api-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let content_type = res
        .headers()
        .get("content-type")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    let bytes = to_bytes(res.into_body()).await.expect("body bytes");
    let body = serde_json::from_slice(&bytes).expect("JSON body");
    Reply {
        status,
        header_trace,
        body,
    }
}

impl Reply {
    fn trace_matches_header(&self) -> bool {
        let body_trace = self.body["trace_id"].as_str().unwrap_or_default();
        !body_trace.is_empty() && self.header_trace.as_deref() == Some(body_trace)
    }

    fn error_code(&self) -> Option<&str> {
        self.body["errors"][0]["code"].as_str()
    }

    fn user_id(&self) -> i64 {
        self.body["data"]["user"]["id"].as_i64().expect("user id")
    }
}

/// Send one request, rendering a service error the way the HTTP server does.
async fn call(state: &web::Data<HttpState>, req: test::TestRequest) -> Reply {
    let app = test::init_service(build_app(state.clone())).await;
    let res = match app.call(req.to_request()).await {
        Ok(res) => res.into_parts().1,
        Err(err) => err.error_response(),
    };
    read_reply(res).await
}

async fn create(state: &web::Data<HttpState>, email: &str, name: &str) -> Reply {
    call(
        state,
        test::TestRequest::post()
            .uri("/api/v1/users")
            .set_json(json!({"email": email, "name": name})),
    )
    .await
}

async fn get(state: &web::Data<HttpState>, id: i64) -> Reply {
    call(
        state,
        test::TestRequest::get().uri(&format!("/api/v1/users/{id}")),
    )
    .await
}

fn timestamp(value: &Value) -> DateTime<Utc> {
    value
        .as_str()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
        .expect("RFC 3339 timestamp")
}

#[rstest]
#[case("a@b.com", "A")]
#[case("x@y.org", "Name With Spaces")]
#[case("  padded@b.com  ", "ünïcødé")]
#[actix_web::test]
async fn created_user_has_stable_positive_id(
    harness: Harness,
    #[case] email: &str,
    #[case] name: &str,
) {
    let created = create(&harness.state, email, name).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert!(created.trace_matches_header());
    let id = created.user_id();
    assert!(id > 0);

    let fetched = get(&harness.state, id).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body["data"]["user"], created.body["data"]["user"]);
}

#[rstest]
#[actix_web::test]
async fn every_response_mirrors_trace_id(harness: Harness) {
    let requests = [
        test::TestRequest::get().uri("/health"),
        test::TestRequest::get().uri("/api/v1/users"),
        test::TestRequest::get().uri("/api/v1/users/abc"),
        test::TestRequest::get().uri("/api/v1/users/42"),
        test::TestRequest::post()
            .uri("/api/v1/users")
            .set_payload("{broken"),
        test::TestRequest::get().uri("/nowhere"),
    ];
    let mut seen = Vec::new();
    for request in requests {
        let reply = call(&harness.state, request).await;
        assert!(reply.trace_matches_header(), "body: {}", reply.body);
        seen.push(reply.header_trace);
    }
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 6, "each request gets its own trace id");
}

#[rstest]
#[actix_web::test]
async fn repeated_get_is_idempotent(harness: Harness) {
    let id = create(&harness.state, "a@b.com", "A").await.user_id();
    let first = get(&harness.state, id).await;
    let second = get(&harness.state, id).await;
    assert_eq!(first.body["data"], second.body["data"]);
    assert_ne!(first.body["trace_id"], second.body["trace_id"]);
}

#[rstest]
#[actix_web::test]
async fn partial_update_only_touches_non_empty_fields(harness: Harness) {
    let created = create(&harness.state, "a@b.com", "A").await;
    let id = created.user_id();
    harness.clock.advance_seconds(1);

    let updated = call(
        &harness.state,
        test::TestRequest::put()
            .uri(&format!("/api/v1/users/{id}"))
            .set_json(json!({"email": "", "name": "new"})),
    )
    .await;

    assert_eq!(updated.status, StatusCode::OK);
    let before = &created.body["data"]["user"];
    let after = &updated.body["data"]["user"];
    assert_eq!(after["name"], "new");
    assert_eq!(after["email"], before["email"]);
    assert_eq!(after["created_at"], before["created_at"]);
    assert!(timestamp(&after["updated_at"]) > timestamp(&before["updated_at"]));
}

#[rstest]
#[actix_web::test]
async fn non_numeric_id_is_rejected(harness: Harness) {
    let reply = call(
        &harness.state,
        test::TestRequest::get().uri("/api/v1/users/abc"),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error_code(), Some("INVALID_ID"));
    assert_eq!(reply.body["errors"][0]["field"], "id");
    assert!(reply.body.get("data").is_none());
}

#[rstest]
#[actix_web::test]
async fn absent_user_is_not_found(harness: Harness) {
    let reply = get(&harness.state, 999_999).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.error_code(), Some("NOT_FOUND"));
}

#[rstest]
#[actix_web::test]
async fn create_delete_then_get_is_not_found(harness: Harness) {
    let created = create(&harness.state, "a@b.com", "A").await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["user"]["email"], "a@b.com");
    let id = created.user_id();

    let deleted = call(
        &harness.state,
        test::TestRequest::delete().uri(&format!("/api/v1/users/{id}")),
    )
    .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(
        deleted.body["data"],
        json!({"message": "User deleted successfully"})
    );
    assert_eq!(deleted.body["errors"], json!([]));

    let fetched = get(&harness.state, id).await;
    assert_eq!(fetched.status, StatusCode::NOT_FOUND);
    assert!(harness.repository.is_empty());
}

#[rstest]
#[actix_web::test]
async fn empty_store_lists_no_users(harness: Harness) {
    let reply = call(&harness.state, test::TestRequest::get().uri("/api/v1/users")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["users"], json!([]));
    assert_eq!(reply.body["errors"], json!([]));
}

#[rstest]
#[actix_web::test]
async fn list_is_newest_first(harness: Harness) {
    create(&harness.state, "old@b.com", "Old").await;
    harness.clock.advance_seconds(1);
    create(&harness.state, "new@b.com", "New").await;

    let reply = call(&harness.state, test::TestRequest::get().uri("/api/v1/users")).await;
    let names: Vec<&str> = reply.body["data"]["users"]
        .as_array()
        .expect("users array")
        .iter()
        .filter_map(|user| user["name"].as_str())
        .collect();
    assert_eq!(names, vec!["New", "Old"]);
}

#[rstest]
#[case::missing_name(json!({"email": "a@b.com"}))]
#[case::blank_email(json!({"email": "   ", "name": "A"}))]
#[actix_web::test]
async fn invalid_create_input_keeps_create_failed(harness: Harness, #[case] payload: Value) {
    let reply = call(
        &harness.state,
        test::TestRequest::post()
            .uri("/api/v1/users")
            .set_json(payload),
    )
    .await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error_code(), Some("CREATE_FAILED"));
    assert_eq!(
        reply.body["errors"][0]["message"],
        "email and name are required"
    );
    assert!(harness.repository.is_empty());
}

#[rstest]
#[case::update(test::TestRequest::put().set_json(json!({"name": "B"})), "UPDATE_FAILED")]
#[case::delete(test::TestRequest::delete(), "DELETE_FAILED")]
#[actix_web::test]
async fn writes_to_absent_users_keep_operation_codes(
    harness: Harness,
    #[case] request: test::TestRequest,
    #[case] code: &str,
) {
    let reply = call(&harness.state, request.uri("/api/v1/users/404")).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error_code(), Some(code));
}

#[rstest]
#[actix_web::test]
async fn store_outage_renders_fetch_failed(harness: Harness) {
    harness
        .repository
        .set_outage(Some(UserPersistenceError::connection("refused")));
    let reply = call(&harness.state, test::TestRequest::get().uri("/api/v1/users")).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error_code(), Some("FETCH_FAILED"));
}

#[rstest]
#[actix_web::test]
async fn health_reports_clock_time(harness: Harness) {
    let reply = call(&harness.state, test::TestRequest::get().uri("/health")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["status"], "healthy");
    assert_eq!(reply.body["data"]["timestamp"], "2025-06-01T09:00:00Z");
    assert_eq!(reply.body["data"]["trace_id"], reply.body["trace_id"]);
}

#[rstest]
#[actix_web::test]
async fn preflight_is_answered_by_cors(harness: Harness) {
    let app = test::init_service(build_app(harness.state.clone())).await;
    let req = test::TestRequest::default()
        .method(actix_web::http::Method::OPTIONS)
        .uri("/api/v1/users")
        .insert_header(("origin", "https://app.example"))
        .insert_header(("access-control-request-method", "PUT"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
    assert!(res.headers().contains_key("x-api-id"));
}

#[rstest]
#[actix_web::test]
async fn collection_answers_with_trailing_slash(harness: Harness) {
    create(&harness.state, "a@b.com", "A").await;
    let reply = call(&harness.state, test::TestRequest::get().uri("/api/v1/users/")).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["users"][0]["name"], "A");
}

#[rstest]
#[actix_web::test]
async fn oversized_create_body_renders_invalid_request(harness: Harness) {
    let payload = json!({"email": "a@b.com", "name": "x".repeat(300 * 1024)}).to_string();
    let reply = call(
        &harness.state,
        test::TestRequest::post()
            .uri("/api/v1/users")
            .insert_header(("content-type", "application/json"))
            .set_payload(payload),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error_code(), Some("INVALID_REQUEST"));
    assert!(reply.trace_matches_header());
    assert!(harness.repository.is_empty());
}

/// User service whose every operation panics.
struct PanickingUsers;

#[async_trait]
impl UserService for PanickingUsers {
    async fn create_user(&self, _email: String, _name: String) -> Result<User, UserServiceError> {
        panic!("create exploded: secret detail");
    }

    async fn get_user(&self, _id: UserId) -> Result<User, UserServiceError> {
        panic!("get exploded: secret detail");
    }

    async fn list_users(&self) -> Result<Vec<User>, UserServiceError> {
        panic!("list exploded: secret detail");
    }

    async fn update_user(
        &self,
        _id: UserId,
        _changes: UserChanges,
    ) -> Result<User, UserServiceError> {
        panic!("update exploded: secret detail");
    }

    async fn delete_user(&self, _id: UserId) -> Result<(), UserServiceError> {
        panic!("delete exploded: secret detail");
    }
}

/// Log sink shared between a scoped subscriber and the test body.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        let bytes = self.0.lock().map(|buf| buf.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut inner) = self.0.lock() {
            inner.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[rstest]
#[actix_web::test]
async fn handler_panic_is_recovered_and_logged_once(harness: Harness) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .with_writer(move || writer.clone())
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let clock: Arc<dyn Clock> = harness.clock.clone();
    let state = web::Data::new(HttpState::new(Arc::new(PanickingUsers), clock));

    let reply = call(&state, test::TestRequest::get().uri("/api/v1/users")).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.error_code(), Some("INTERNAL_ERROR"));
    assert_eq!(reply.body["errors"][0]["message"], "Internal server error");
    assert!(reply.body.get("data").is_none());
    assert!(reply.trace_matches_header(), "body: {}", reply.body);
    assert!(!reply.body.to_string().contains("secret detail"));

    let completed: Vec<String> = logs
        .contents()
        .lines()
        .filter(|line| line.contains("request completed"))
        .map(str::to_owned)
        .collect();
    assert_eq!(completed.len(), 1, "logs: {completed:?}");
    assert!(completed[0].contains("status=500"), "log: {}", completed[0]);
    assert!(logs.contents().contains("request handler panicked"));

    let health = call(&state, test::TestRequest::get().uri("/health")).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["data"]["status"], "healthy");
}
