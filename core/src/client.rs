//! Stateless HTTP request builder and response parser for the catalog API.
//!
//! # Design
//! `CatalogClient` holds only a `base_url` and carries no mutable state
//! between calls. Each operation is split into a `build_*` method that
//! produces an `HttpRequest` and a `parse_*` method that consumes an
//! `HttpResponse`. CRUD methods are generic over `Resource`, so films and
//! actors share one code path. Tokens are not attached here; that is the
//! gateway's job.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ApiError, AuthError, UNCONFIRMED_ERROR_CODE};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::resource::Resource;
use crate::types::{
    CodeDeliveryResponse, ConfirmForgotPasswordRequest, ConfirmSignUpRequest,
    ForgotPasswordRequest, LoginRequest, LoginResponse, MessageResponse,
    ResendConfirmationCodeRequest, User,
};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const USER_PATH: &str = "/api/auth/user";
pub const FORGOT_PASSWORD_PATH: &str = "/api/auth/forgot-password";
pub const CONFIRM_FORGOT_PASSWORD_PATH: &str = "/api/auth/confirm-forgot-password";
pub const CONFIRM_SIGNUP_PATH: &str = "/api/auth/confirm-signup";
pub const RESEND_CONFIRMATION_CODE_PATH: &str = "/api/auth/resend-confirmation-code";

const LOGIN_FAILED_MESSAGE: &str = "Login failed";
const UNCONFIRMED_MARKERS: [&str; 2] = ["not confirmed", "確認されていません"];

/// Synchronous, stateless client for the catalog API.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
}

impl CatalogClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn bare(&self, method: HttpMethod, path: &str) -> HttpRequest {
        HttpRequest {
            method,
            path: self.url(path),
            headers: Vec::new(),
            body: None,
        }
    }

    fn with_json<B: Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Request(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: self.url(path),
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
        })
    }

    // -----------------------------------------------------------------------
    // Catalog resources
    // -----------------------------------------------------------------------

    pub fn build_list<R: Resource>(&self) -> HttpRequest {
        self.bare(HttpMethod::Get, R::KIND.collection_path())
    }

    pub fn build_get<R: Resource>(&self, id: &str) -> HttpRequest {
        self.bare(HttpMethod::Get, &item_path::<R>(id))
    }

    pub fn build_create<R: Resource>(&self, input: &R::Create) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, R::KIND.collection_path(), input)
    }

    pub fn build_update<R: Resource>(
        &self,
        id: &str,
        input: &R::Update,
    ) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Put, &item_path::<R>(id), input)
    }

    pub fn build_delete<R: Resource>(&self, id: &str) -> HttpRequest {
        self.bare(HttpMethod::Delete, &item_path::<R>(id))
    }

    /// Parse a list response, unwrapping either `{"<kind>": [...]}` or a bare
    /// array.
    pub fn parse_list<R: Resource>(&self, response: HttpResponse) -> Result<Vec<R>, ApiError> {
        check_status(&response)?;
        let value: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?;
        let items = match value {
            array @ serde_json::Value::Array(_) => array,
            serde_json::Value::Object(mut map) => {
                map.remove(R::KIND.list_field()).ok_or_else(|| {
                    ApiError::Deserialization(format!(
                        "missing `{}` field in list response",
                        R::KIND.list_field()
                    ))
                })?
            }
            other => {
                return Err(ApiError::Deserialization(format!(
                    "unexpected list response: {other}"
                )))
            }
        };
        serde_json::from_value(items).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Parse a single-resource response (get, create and update all return the
    /// bare resource).
    pub fn parse_item<R: Resource>(&self, response: HttpResponse) -> Result<R, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    // -----------------------------------------------------------------------
    // Auth
    // -----------------------------------------------------------------------

    pub fn build_login(&self, input: &LoginRequest) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, LOGIN_PATH, input)
    }

    /// Parse a login response. 401/403 become `ApiError::Auth`, with the
    /// unconfirmed-account case split out.
    pub fn parse_login(
        &self,
        username: &str,
        response: HttpResponse,
    ) -> Result<LoginResponse, ApiError> {
        if matches!(response.status, 401 | 403) {
            return Err(login_rejection(username, &response).into());
        }
        parse_json(response)
    }

    pub fn build_user_info(&self) -> HttpRequest {
        self.bare(HttpMethod::Get, USER_PATH)
    }

    pub fn parse_user_info(&self, response: HttpResponse) -> Result<User, ApiError> {
        parse_json(response)
    }

    pub fn build_forgot_password(
        &self,
        input: &ForgotPasswordRequest,
    ) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, FORGOT_PASSWORD_PATH, input)
    }

    pub fn build_confirm_forgot_password(
        &self,
        input: &ConfirmForgotPasswordRequest,
    ) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, CONFIRM_FORGOT_PASSWORD_PATH, input)
    }

    pub fn build_confirm_sign_up(
        &self,
        input: &ConfirmSignUpRequest,
    ) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, CONFIRM_SIGNUP_PATH, input)
    }

    pub fn build_resend_confirmation_code(
        &self,
        input: &ResendConfirmationCodeRequest,
    ) -> Result<HttpRequest, ApiError> {
        self.with_json(HttpMethod::Post, RESEND_CONFIRMATION_CODE_PATH, input)
    }

    pub fn parse_code_delivery(
        &self,
        response: HttpResponse,
    ) -> Result<CodeDeliveryResponse, ApiError> {
        parse_json(response)
    }

    pub fn parse_message(&self, response: HttpResponse) -> Result<MessageResponse, ApiError> {
        parse_json(response)
    }
}

fn item_path<R: Resource>(id: &str) -> String {
    format!("{}/{id}", R::KIND.collection_path())
}

/// Map non-success status codes to `ApiError::Server`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    Err(ApiError::from_response(response))
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn login_rejection(username: &str, response: &HttpResponse) -> AuthError {
    let (code, message) = match ApiError::from_response(response) {
        ApiError::Server { error_code, message, .. } if error_code != "UNKNOWN_ERROR" => {
            (error_code, message)
        }
        _ => (String::new(), LOGIN_FAILED_MESSAGE.to_string()),
    };

    let lowered = message.to_lowercase();
    let unconfirmed = code == UNCONFIRMED_ERROR_CODE
        || UNCONFIRMED_MARKERS.iter().any(|m| lowered.contains(m));

    if unconfirmed {
        AuthError::UnconfirmedAccount {
            username: username.to_string(),
            message,
        }
    } else {
        AuthError::Rejected { message }
    }
}
