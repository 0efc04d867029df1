//! Resource access layer: one method per backend operation.
//!
//! `CatalogApi` pairs the stateless `CatalogClient` (build/parse) with the
//! `Gateway` (interceptors + transport). Every method is build, dispatch,
//! parse. Login is the one operation that also writes session state, through
//! `SessionManager::establish`.

use crate::client::CatalogClient;
use crate::error::ApiError;
use crate::gateway::Gateway;
use crate::resource::Resource;
use crate::session::Session;
use crate::types::{
    CodeDeliveryResponse, ConfirmForgotPasswordRequest, ConfirmSignUpRequest,
    ForgotPasswordRequest, LoginRequest, MessageResponse, ResendConfirmationCodeRequest, User,
};

pub struct CatalogApi {
    client: CatalogClient,
    gateway: Gateway,
}

impl CatalogApi {
    pub fn new(client: CatalogClient, gateway: Gateway) -> Self {
        Self { client, gateway }
    }

    pub fn client(&self) -> &CatalogClient {
        &self.client
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut Gateway {
        &mut self.gateway
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Exchange credentials for a session and persist it.
    pub fn login(&mut self, username: &str, password: &str) -> Result<Session, ApiError> {
        let input = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let request = self.client.build_login(&input)?;
        let response = self.gateway.dispatch(request)?;
        let grant = self.client.parse_login(username, response).map_err(|e| {
            tracing::info!(username, code = e.error_code(), "login rejected");
            e
        })?;
        let session = self.gateway.sessions_mut().establish(&grant)?;
        tracing::info!(username, "logged in");
        Ok(session)
    }

    pub fn logout(&mut self) {
        self.gateway.sessions_mut().logout();
        tracing::info!("logged out");
    }

    /// See `SessionManager::is_authenticated`; may evict an expired session.
    pub fn is_authenticated(&mut self) -> bool {
        self.gateway.sessions_mut().is_authenticated()
    }

    pub fn token(&self) -> Option<String> {
        self.gateway.sessions().token()
    }

    pub fn user_info(&mut self) -> Result<User, ApiError> {
        let response = self.gateway.dispatch(self.client.build_user_info())?;
        self.client.parse_user_info(response)
    }

    // -----------------------------------------------------------------------
    // Account recovery
    // -----------------------------------------------------------------------

    pub fn forgot_password(&mut self, username: &str) -> Result<CodeDeliveryResponse, ApiError> {
        let request = self.client.build_forgot_password(&ForgotPasswordRequest {
            username: username.to_string(),
        })?;
        let response = self.gateway.dispatch(request)?;
        self.client.parse_code_delivery(response)
    }

    pub fn confirm_forgot_password(
        &mut self,
        input: &ConfirmForgotPasswordRequest,
    ) -> Result<MessageResponse, ApiError> {
        let request = self.client.build_confirm_forgot_password(input)?;
        let response = self.gateway.dispatch(request)?;
        self.client.parse_message(response)
    }

    pub fn confirm_sign_up(
        &mut self,
        input: &ConfirmSignUpRequest,
    ) -> Result<MessageResponse, ApiError> {
        let request = self.client.build_confirm_sign_up(input)?;
        let response = self.gateway.dispatch(request)?;
        self.client.parse_message(response)
    }

    pub fn resend_confirmation_code(
        &mut self,
        username: &str,
    ) -> Result<CodeDeliveryResponse, ApiError> {
        let request = self
            .client
            .build_resend_confirmation_code(&ResendConfirmationCodeRequest {
                username: username.to_string(),
            })?;
        let response = self.gateway.dispatch(request)?;
        self.client.parse_code_delivery(response)
    }

    // -----------------------------------------------------------------------
    // Catalog
    // -----------------------------------------------------------------------

    pub fn list<R: Resource>(&mut self) -> Result<Vec<R>, ApiError> {
        let response = self.gateway.dispatch(self.client.build_list::<R>())?;
        self.client.parse_list(response)
    }

    pub fn get<R: Resource>(&mut self, id: &str) -> Result<R, ApiError> {
        let response = self.gateway.dispatch(self.client.build_get::<R>(id))?;
        self.client.parse_item(response)
    }

    pub fn create<R: Resource>(&mut self, input: &R::Create) -> Result<R, ApiError> {
        let request = self.client.build_create::<R>(input)?;
        let response = self.gateway.dispatch(request)?;
        self.client.parse_item(response)
    }

    pub fn update<R: Resource>(&mut self, id: &str, input: &R::Update) -> Result<R, ApiError> {
        let request = self.client.build_update::<R>(id, input)?;
        let response = self.gateway.dispatch(request)?;
        self.client.parse_item(response)
    }

    /// Soft delete. The record may still exist server-side with its delete
    /// flag set; lists must be refetched to reflect the change.
    pub fn delete<R: Resource>(&mut self, id: &str) -> Result<(), ApiError> {
        let response = self.gateway.dispatch(self.client.build_delete::<R>(id))?;
        self.client.parse_delete(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::routes::{Route, Router};
    use crate::session::{ManualClock, SessionManager, EXPIRES_AT_KEY};
    use crate::storage::MemoryStore;
    use crate::testing::ScriptedTransport;
    use crate::types::{Actor, Film};

    const T0: i64 = 1_000_000;

    fn api(transport: &ScriptedTransport, store: &MemoryStore) -> CatalogApi {
        let sessions = SessionManager::with_clock(store.clone(), ManualClock::new(T0));
        let gateway = Gateway::new(transport.clone(), sessions, Router::at(Route::Login));
        CatalogApi::new(CatalogClient::new("http://api.test"), gateway)
    }

    #[test]
    fn login_persists_computed_expiry() {
        let transport = ScriptedTransport::new();
        transport.push_response(200, r#"{"access_token":"t1","token_type":"Bearer","expires_in":3600}"#);
        let store = MemoryStore::new();
        let mut api = api(&transport, &store);

        let session = api.login("alice", "secret1").unwrap();
        assert_eq!(session.expires_at, Some(T0 + 3_600_000));
        assert_eq!(store.snapshot()[EXPIRES_AT_KEY], (T0 + 3_600_000).to_string());
        assert!(api.is_authenticated());

        let body: serde_json::Value =
            serde_json::from_str(transport.requests()[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body, serde_json::json!({"username":"alice","password":"secret1"}));
    }

    #[test]
    fn rejected_login_stores_nothing() {
        let transport = ScriptedTransport::new();
        transport.push_response(401, r#"{"error_code":"AUTH_ERROR","message":"Bad credentials"}"#);
        let store = MemoryStore::new();
        let mut api = api(&transport, &store);

        let err = api.login("alice", "wrongpw").unwrap_err();
        assert_eq!(
            err,
            ApiError::Auth(AuthError::Rejected { message: "Bad credentials".to_string() })
        );
        assert!(store.snapshot().is_empty());
        assert!(api.gateway().router().history().is_empty());
    }

    #[test]
    fn requests_after_login_carry_token() {
        let transport = ScriptedTransport::new();
        transport.push_response(200, r#"{"access_token":"t1","token_type":"Bearer"}"#);
        transport.push_response(200, r#"{"films":[]}"#);
        let store = MemoryStore::new();
        let mut api = api(&transport, &store);

        api.login("alice", "secret1").unwrap();
        let films: Vec<Film> = api.list().unwrap();
        assert!(films.is_empty());
        assert_eq!(transport.requests()[1].header("Authorization"), Some("Bearer t1"));
    }

    #[test]
    fn delete_hits_item_path() {
        let transport = ScriptedTransport::new();
        transport.push_response(204, "");
        let mut api = api(&transport, &MemoryStore::new());
        api.delete::<Actor>("a1").unwrap();
        assert_eq!(transport.requests()[0].path, "http://api.test/api/actors/a1");
    }

    #[test]
    fn recovery_flows_parse_responses() {
        let transport = ScriptedTransport::new();
        transport.push_response(
            200,
            r#"{"message":"Code sent","destination":"a***@example.com","delivery_medium":"EMAIL"}"#,
        );
        transport.push_response(200, r#"{"message":"Password reset"}"#);
        let mut api = api(&transport, &MemoryStore::new());

        let delivery = api.forgot_password("alice").unwrap();
        assert_eq!(delivery.destination, "a***@example.com");

        let reply = api
            .confirm_forgot_password(&ConfirmForgotPasswordRequest {
                username: "alice".to_string(),
                confirmation_code: "123456".to_string(),
                new_password: "newpassword".to_string(),
            })
            .unwrap();
        assert_eq!(reply.message, "Password reset");
    }
}
