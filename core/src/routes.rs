//! Client routes, navigation history and the protected-route gate.

use std::fmt;

use crate::resource::EntityKind;
use crate::session::SessionManager;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Login,
    ForgotPassword,
    /// Carries the username handed over by the forgot-password page.
    ResetPassword { username: Option<String> },
    /// Carries the username of a login attempt on an unconfirmed account.
    ConfirmSignUp { username: Option<String> },
    Profile,
    Films,
    FilmNew,
    FilmEdit(String),
    Actors,
    ActorNew,
    ActorEdit(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::ForgotPassword => "/forgot-password".to_string(),
            Route::ResetPassword { .. } => "/reset-password".to_string(),
            Route::ConfirmSignUp { .. } => "/confirm-signup".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::Films => "/films".to_string(),
            Route::FilmNew => "/films/new".to_string(),
            Route::FilmEdit(id) => format!("/films/{id}/edit"),
            Route::Actors => "/actors".to_string(),
            Route::ActorNew => "/actors/new".to_string(),
            Route::ActorEdit(id) => format!("/actors/{id}/edit"),
        }
    }

    /// Resolve a path. `/` and anything unknown land on the film list.
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["login"] => Route::Login,
            ["forgot-password"] => Route::ForgotPassword,
            ["reset-password"] => Route::ResetPassword { username: None },
            ["confirm-signup"] => Route::ConfirmSignUp { username: None },
            ["profile"] => Route::Profile,
            ["films", "new"] => Route::FilmNew,
            ["films", id, "edit"] => Route::FilmEdit((*id).to_string()),
            ["actors"] => Route::Actors,
            ["actors", "new"] => Route::ActorNew,
            ["actors", id, "edit"] => Route::ActorEdit((*id).to_string()),
            _ => Route::Films,
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(
            self,
            Route::Login
                | Route::ForgotPassword
                | Route::ResetPassword { .. }
                | Route::ConfirmSignUp { .. }
        )
    }

    pub fn list(kind: EntityKind) -> Route {
        match kind {
            EntityKind::Films => Route::Films,
            EntityKind::Actors => Route::Actors,
        }
    }

    pub fn create(kind: EntityKind) -> Route {
        match kind {
            EntityKind::Films => Route::FilmNew,
            EntityKind::Actors => Route::ActorNew,
        }
    }

    pub fn edit(kind: EntityKind, id: &str) -> Route {
        match kind {
            EntityKind::Films => Route::FilmEdit(id.to_string()),
            EntityKind::Actors => Route::ActorEdit(id.to_string()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Current location plus every navigation taken so far.
#[derive(Debug, Clone)]
pub struct Router {
    current: Route,
    history: Vec<Route>,
}

impl Default for Router {
    fn default() -> Self {
        Self::at(Route::Films)
    }
}

impl Router {
    pub fn at(route: Route) -> Self {
        Self {
            current: route,
            history: Vec::new(),
        }
    }

    pub fn current(&self) -> &Route {
        &self.current
    }

    /// Navigations performed, oldest first. The starting route is not
    /// included.
    pub fn history(&self) -> &[Route] {
        &self.history
    }

    pub fn navigate(&mut self, route: Route) {
        tracing::debug!(from = %self.current, to = %route, "navigate");
        self.history.push(route.clone());
        self.current = route;
    }

    /// Send the user to the login page unless already there. Returns whether
    /// a navigation happened.
    pub fn redirect_to_login(&mut self) -> bool {
        if self.current == Route::Login {
            return false;
        }
        self.navigate(Route::Login);
        true
    }

    /// Protected-route gate: enter `route`, or the login page if it requires
    /// a session the caller does not have. May evict an expired session.
    pub fn enter(&mut self, route: Route, sessions: &mut SessionManager) -> &Route {
        if route.is_protected() && !sessions.is_authenticated() {
            tracing::debug!(requested = %route, "protected route without session");
            self.navigate(Route::Login);
        } else {
            self.navigate(route);
        }
        &self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ManualClock;
    use crate::storage::MemoryStore;
    use crate::types::LoginResponse;

    #[test]
    fn paths_round_trip() {
        let routes = [
            Route::Login,
            Route::ForgotPassword,
            Route::Profile,
            Route::Films,
            Route::FilmNew,
            Route::FilmEdit("f1".to_string()),
            Route::Actors,
            Route::ActorNew,
            Route::ActorEdit("a1".to_string()),
        ];
        for route in routes {
            assert_eq!(Route::parse(&route.path()), route);
        }
    }

    #[test]
    fn root_and_unknown_paths_fall_back_to_films() {
        assert_eq!(Route::parse("/"), Route::Films);
        assert_eq!(Route::parse("/nope/x"), Route::Films);
        assert_eq!(Route::parse("/login?next=/films"), Route::Login);
    }

    #[test]
    fn public_routes_are_not_protected() {
        assert!(!Route::Login.is_protected());
        assert!(!Route::ConfirmSignUp { username: None }.is_protected());
        assert!(Route::Films.is_protected());
        assert!(Route::Profile.is_protected());
    }

    #[test]
    fn redirect_to_login_only_once() {
        let mut router = Router::at(Route::Films);
        assert!(router.redirect_to_login());
        assert!(!router.redirect_to_login());
        assert_eq!(router.history(), &[Route::Login]);
    }

    #[test]
    fn gate_sends_anonymous_users_to_login() {
        let mut sessions = SessionManager::with_clock(MemoryStore::new(), ManualClock::new(0));
        let mut router = Router::at(Route::Login);
        assert_eq!(router.enter(Route::Actors, &mut sessions), &Route::Login);
        assert_eq!(router.enter(Route::ForgotPassword, &mut sessions), &Route::ForgotPassword);
    }

    #[test]
    fn gate_admits_authenticated_users() {
        let mut sessions = SessionManager::with_clock(MemoryStore::new(), ManualClock::new(0));
        sessions
            .establish(&LoginResponse {
                access_token: "tok".to_string(),
                token_type: "Bearer".to_string(),
                expires_in: Some(60),
                refresh_token: None,
                id_token: None,
            })
            .unwrap();
        let mut router = Router::at(Route::Login);
        assert_eq!(router.enter(Route::Actors, &mut sessions), &Route::Actors);
    }
}
