//! HTTP boundary wrapper.
//!
//! Every request the client makes goes through `Gateway::dispatch`, which
//! applies the two interceptors:
//!
//! - outgoing: `Authorization: Bearer <token>` when a token is stored;
//!   anonymous requests pass through untouched.
//! - incoming: a 401 clears the session and redirects to the login page
//!   (unless already there). This is the only place that reaction lives.
//!
//! Transport failures become `ApiError::Network` / `ApiError::Request`.
//! Non-2xx responses are handed back as-is; `CatalogClient::parse_*`
//! normalizes them so that login can still tell rejection from other errors.

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::routes::Router;
use crate::session::SessionManager;

pub struct Gateway {
    transport: Box<dyn Transport>,
    sessions: SessionManager,
    router: Router,
}

impl Gateway {
    pub fn new(transport: impl Transport + 'static, sessions: SessionManager, router: Router) -> Self {
        Self {
            transport: Box::new(transport),
            sessions,
            router,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionManager {
        &mut self.sessions
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    /// Split borrow for callers that need both at once (route gate).
    pub fn router_and_sessions(&mut self) -> (&mut Router, &mut SessionManager) {
        (&mut self.router, &mut self.sessions)
    }

    /// Send one request through the interceptors.
    pub fn dispatch(&mut self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        if let Some(token) = self.sessions.token() {
            request.set_header("Authorization", format!("Bearer {token}"));
        }

        let method = request.method.as_str();
        let path = request.path.clone();
        tracing::debug!(method, %path, "dispatch");

        let response = self.transport.execute(request).map_err(|e| {
            tracing::warn!(method, %path, error = %e, "request failed without response");
            ApiError::from(e)
        })?;

        tracing::debug!(method, %path, status = response.status, "response");
        if response.status == 401 {
            self.force_logout();
        }
        Ok(response)
    }

    /// Like `dispatch`, but non-2xx responses are returned as the normalized
    /// `ApiError::Server`.
    pub fn send(&mut self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = self.dispatch(request)?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(&response))
        }
    }

    fn force_logout(&mut self) {
        tracing::warn!("server answered 401, clearing session");
        self.sessions.logout();
        self.router.redirect_to_login();
    }
}
