//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::UserService;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn UserService>,
    pub clock: Arc<dyn Clock>,
}

impl HttpState {
    /// Construct state from the user service and a wall clock.
    pub fn new(users: Arc<dyn UserService>, clock: Arc<dyn Clock>) -> Self {
        Self { users, clock }
    }
}
