//! Page controllers.
//!
//! Each page is a small state holder (form draft, confirm dialog, mutation
//! status) whose methods take the shared `App` context. A host renders
//! whatever the page exposes and drains `App::toasts` after every action.

mod account;
mod catalog;
mod login;

pub use account::{ConfirmSignUpPage, ForgotPasswordPage, ProfilePage, ResetPasswordPage};
pub use catalog::{FormMode, FormPage, ListPage};
pub use login::LoginPage;

use crate::api::CatalogApi;
use crate::cache::QueryCache;
use crate::error::ApiError;
use crate::routes::{Route, Router};
use crate::toast::ToastQueue;

/// Process-wide client state shared by every page.
pub struct App {
    api: CatalogApi,
    cache: QueryCache,
    toasts: ToastQueue,
}

impl App {
    pub fn new(api: CatalogApi) -> Self {
        Self {
            api,
            cache: QueryCache::new(),
            toasts: ToastQueue::new(),
        }
    }

    pub fn api(&self) -> &CatalogApi {
        &self.api
    }

    pub fn api_mut(&mut self) -> &mut CatalogApi {
        &mut self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    pub fn router(&self) -> &Router {
        self.api.gateway().router()
    }

    pub fn route(&self) -> &Route {
        self.router().current()
    }

    /// Navigate through the protected-route gate. Returns where the user
    /// actually landed.
    pub fn navigate(&mut self, route: Route) -> Route {
        let (router, sessions) = self.api.gateway_mut().router_and_sessions();
        router.enter(route, sessions).clone()
    }

    pub fn is_authenticated(&mut self) -> bool {
        self.api.is_authenticated()
    }

    /// Clear the session and every cached query, then go to the login page.
    pub fn logout(&mut self) {
        self.api.logout();
        self.cache.clear();
        self.navigate(Route::Login);
    }

    /// Surface a failure as an error toast. Validation failures stay on the
    /// form and are not toasted.
    fn report(&mut self, err: &ApiError) {
        if !matches!(err, ApiError::Validation(_)) {
            self.toasts.show_error(err.user_message());
        }
    }
}
