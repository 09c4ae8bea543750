//! Request-scoped trace identifier for correlation across logs and responses.
//!
//! `TraceId` is a domain primitive representing a correlation identifier that
//! follows a single request. It is allocated by the HTTP trace middleware,
//! stored in the request's extensions, and handed to handlers as an explicit
//! extractor argument. Nothing here is process-wide: when no identifier is in
//! scope, callers fall back to [`UNKNOWN_TRACE_ID`] instead of failing.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

/// Sentinel rendered when a request carries no trace identifier.
pub const UNKNOWN_TRACE_ID: &str = "unknown";

/// Response header mirroring the trace identifier for client-side debugging.
pub const TRACE_ID_HEADER: &str = "x-api-id";

/// Per-request trace identifier.
///
/// # Examples
/// ```
/// use users_api::domain::TraceId;
///
/// let trace_id: TraceId = "00000000-0000-0000-0000-000000000000"
///     .parse()
///     .expect("valid UUID");
/// assert_eq!(trace_id.to_string(), "00000000-0000-0000-0000-000000000000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generate a new random trace identifier.
    #[must_use]
    #[rustfmt::skip]
    pub fn generate() -> Self { Self(Uuid::new_v4()) }

    /// Construct a trace identifier from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Render an optional trace identifier, substituting the sentinel when absent.
///
/// # Examples
/// ```
/// use users_api::domain::{render_trace_id, UNKNOWN_TRACE_ID};
///
/// assert_eq!(render_trace_id(None), UNKNOWN_TRACE_ID);
/// ```
#[must_use]
pub fn render_trace_id(trace_id: Option<TraceId>) -> String {
    trace_id.map_or_else(|| UNKNOWN_TRACE_ID.to_owned(), |id| id.to_string())
}
