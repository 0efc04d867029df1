//! Account recovery and profile pages.

use crate::error::{ApiError, FieldErrors};
use crate::form::FormDraft;
use crate::forms::{
    ConfirmSignUpField, ConfirmSignUpForm, ForgotPasswordField, ForgotPasswordForm,
    ResetPasswordField, ResetPasswordForm,
};
use crate::queries::QueryState;
use crate::routes::Route;
use crate::types::{CodeDeliveryResponse, MessageResponse, User};

use super::App;

/// Username carried over by the route, if any.
fn handed_over_username(route: &Route) -> Option<String> {
    match route {
        Route::ResetPassword { username } | Route::ConfirmSignUp { username } => {
            username.clone()
        }
        _ => None,
    }
}

#[derive(Debug, Default)]
pub struct ForgotPasswordPage {
    form: FormDraft<ForgotPasswordForm>,
}

impl ForgotPasswordPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn form(&self) -> &FormDraft<ForgotPasswordForm> {
        &self.form
    }

    pub fn set(&mut self, field: ForgotPasswordField, value: impl Into<String>) {
        self.form.set(field, value);
    }

    /// Request a reset code, then continue to the reset page with the
    /// username filled in.
    pub fn submit(&mut self, app: &mut App) -> Result<CodeDeliveryResponse, ApiError> {
        let username = self.form.begin_submit()?;
        let result = app.api.forgot_password(&username);
        self.form.finish_submit();

        match result {
            Ok(delivery) => {
                app.toasts.show_success(format!(
                    "Password reset code sent to {}",
                    delivery.destination
                ));
                app.navigate(Route::ResetPassword {
                    username: Some(username),
                });
                Ok(delivery)
            }
            Err(e) => {
                app.report(&e);
                Err(e)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ResetPasswordPage {
    form: FormDraft<ResetPasswordForm>,
}

impl ResetPasswordPage {
    /// Mount the page, prefilling the username handed over by the route.
    pub fn open(app: &App) -> Self {
        let seed = handed_over_username(app.route())
            .map(|username| (ResetPasswordField::Username, username));
        Self {
            form: FormDraft::with_values(seed),
        }
    }

    pub fn form(&self) -> &FormDraft<ResetPasswordForm> {
        &self.form
    }

    pub fn set(&mut self, field: ResetPasswordField, value: impl Into<String>) {
        self.form.set(field, value);
    }

    pub fn submit(&mut self, app: &mut App) -> Result<MessageResponse, ApiError> {
        let request = self.form.begin_submit()?;
        let result = app.api.confirm_forgot_password(&request);
        self.form.finish_submit();

        match result {
            Ok(reply) => {
                app.toasts.show_success(reply.message.clone());
                app.navigate(Route::Login);
                Ok(reply)
            }
            Err(e) => {
                app.report(&e);
                Err(e)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ConfirmSignUpPage {
    form: FormDraft<ConfirmSignUpForm>,
}

impl ConfirmSignUpPage {
    pub fn open(app: &App) -> Self {
        let seed = handed_over_username(app.route())
            .map(|username| (ConfirmSignUpField::Username, username));
        Self {
            form: FormDraft::with_values(seed),
        }
    }

    pub fn form(&self) -> &FormDraft<ConfirmSignUpForm> {
        &self.form
    }

    pub fn set(&mut self, field: ConfirmSignUpField, value: impl Into<String>) {
        self.form.set(field, value);
    }

    /// Confirm the account and go back to the login page.
    pub fn submit(&mut self, app: &mut App) -> Result<MessageResponse, ApiError> {
        let request = self.form.begin_submit()?;
        let result = app.api.confirm_sign_up(&request);
        self.form.finish_submit();

        match result {
            Ok(reply) => {
                app.toasts.show_success(reply.message.clone());
                app.navigate(Route::Login);
                Ok(reply)
            }
            Err(e) => {
                app.report(&e);
                Err(e)
            }
        }
    }

    /// Send a fresh confirmation code. Only the username is needed.
    pub fn resend_code(&mut self, app: &mut App) -> Result<CodeDeliveryResponse, ApiError> {
        let username = self.form.value(ConfirmSignUpField::Username).trim().to_string();
        if username.is_empty() {
            let message = "Please enter your username";
            app.toasts.show_error(message);
            let mut errors = FieldErrors::new();
            errors.insert("username", message);
            return Err(ApiError::Validation(errors));
        }

        match app.api.resend_confirmation_code(&username) {
            Ok(delivery) => {
                app.toasts.show_success(format!(
                    "{} (sent to: {})",
                    delivery.message, delivery.destination
                ));
                Ok(delivery)
            }
            Err(e) => {
                app.report(&e);
                Err(e)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ProfilePage;

impl ProfilePage {
    /// Fetch the current user. A failure ends the session.
    pub fn load(&self, app: &mut App) -> QueryState<User> {
        match app.api.user_info() {
            Ok(user) => QueryState::Ready(user),
            Err(e) => {
                app.report(&e);
                app.logout();
                QueryState::Failed(e)
            }
        }
    }

    pub fn logout(&self, app: &mut App) {
        app.logout();
    }
}
