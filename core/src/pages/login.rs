use crate::error::{ApiError, AuthError};
use crate::form::FormDraft;
use crate::forms::{LoginField, LoginForm};
use crate::routes::Route;
use crate::session::Session;

use super::App;

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful!";

#[derive(Debug, Default)]
pub struct LoginPage {
    form: FormDraft<LoginForm>,
}

impl LoginPage {
    /// Mount the page. An authenticated visitor is sent to the film list.
    pub fn open(app: &mut App) -> Self {
        if app.is_authenticated() {
            app.navigate(Route::Films);
        }
        Self::default()
    }

    pub fn form(&self) -> &FormDraft<LoginForm> {
        &self.form
    }

    pub fn set(&mut self, field: LoginField, value: impl Into<String>) {
        self.form.set(field, value);
    }

    /// Validate, log in, and route the outcome:
    ///
    /// - success: toast and go to the film list;
    /// - unconfirmed account: go to sign-up confirmation with the username;
    /// - anything else: error toast, stay on the page.
    pub fn submit(&mut self, app: &mut App) -> Result<Session, ApiError> {
        let credentials = self.form.begin_submit()?;
        let result = app
            .api
            .login(&credentials.username, &credentials.password);
        self.form.finish_submit();

        match result {
            Ok(session) => {
                app.toasts.show_success(LOGIN_SUCCESS_MESSAGE);
                app.navigate(Route::Films);
                Ok(session)
            }
            Err(ApiError::Auth(AuthError::UnconfirmedAccount { username, message })) => {
                app.toasts.show_warning(message.clone());
                app.navigate(Route::ConfirmSignUp {
                    username: Some(username.clone()),
                });
                Err(ApiError::Auth(AuthError::UnconfirmedAccount { username, message }))
            }
            Err(e) => {
                app.report(&e);
                Err(e)
            }
        }
    }
}
