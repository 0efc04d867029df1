//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts its own mock server on a random port (fresh seeded
//! state), then drives the core over real HTTP through a ureq-backed
//! `Transport`. Validates that request building, interceptors, response
//! parsing and the page controllers work against the actual server.

use catalog_core::forms::{ConfirmSignUpField, LoginField};
use catalog_core::pages::{ConfirmSignUpPage, ListPage, LoginPage};
use catalog_core::session::ACCESS_TOKEN_KEY;
use catalog_core::{
    Actor, ApiError, App, AuthError, CatalogApi, CatalogClient, CreateActor, FileStore, Film,
    Gateway, HttpMethod, HttpRequest, HttpResponse, KeyValueStore, MemoryStore, MutationState,
    QueryState, Route, Router, SessionManager, Transport, TransportError, UpdateActor,
};

/// Executes requests with ureq. 4xx/5xx responses come back as data so the
/// core does all status interpretation.
struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new() -> Self {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Transport for UreqTransport {
    fn execute(&mut self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        let result = match req.method {
            HttpMethod::Get | HttpMethod::Delete => {
                let mut builder = if req.method == HttpMethod::Get {
                    self.agent.get(&req.path)
                } else {
                    self.agent.delete(&req.path)
                };
                for (name, value) in &req.headers {
                    builder = builder.header(name, value);
                }
                builder.call()
            }
            HttpMethod::Post | HttpMethod::Put => {
                let mut builder = if req.method == HttpMethod::Post {
                    self.agent.post(&req.path)
                } else {
                    self.agent.put(&req.path)
                };
                for (name, value) in &req.headers {
                    builder = builder.header(name, value);
                }
                match &req.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| TransportError::NoResponse(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| TransportError::NoResponse(e.to_string()))?;
        Ok(HttpResponse::new(status, body))
    }
}

/// Start a seeded mock server on a random port; returns its base URL.
fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

fn api(base_url: &str, store: impl KeyValueStore + 'static, start: Route) -> CatalogApi {
    let gateway = Gateway::new(UreqTransport::new(), SessionManager::new(store), Router::at(start));
    CatalogApi::new(CatalogClient::new(base_url), gateway)
}

fn login_as(app: &mut App, username: &str, password: &str) -> Result<(), ApiError> {
    let mut page = LoginPage::open(app);
    page.set(LoginField::Username, username);
    page.set(LoginField::Password, password);
    page.submit(app).map(|_| ())
}

#[test]
fn delete_film_behind_confirmation() {
    let base_url = start_server();
    let mut app = App::new(api(&base_url, MemoryStore::new(), Route::Login));

    login_as(&mut app, "alice", "password123").unwrap();
    assert_eq!(app.route(), &Route::Films);

    let mut page = ListPage::<Film>::new();
    let films = page.render(&mut app).into_result().unwrap().unwrap();
    let inception = films
        .into_iter()
        .find(|f| f.film_id == "f1")
        .expect("seeded film f1");
    assert_eq!(inception.title, "Inception");

    // Cancel: nothing changes.
    page.request_delete(inception.clone());
    page.cancel_delete();
    let films = page.render(&mut app).into_result().unwrap().unwrap();
    assert!(films.iter().any(|f| f.film_id == "f1"));

    // Confirm: one DELETE, and the next render refetches without f1.
    page.request_delete(inception);
    assert_eq!(page.confirm_delete(&mut app), &MutationState::Succeeded);
    let films = page.render(&mut app).into_result().unwrap().unwrap();
    assert!(films.iter().all(|f| f.film_id != "f1"));
    assert!(app
        .toasts_mut()
        .drain()
        .iter()
        .any(|t| t.message == "Film \"Inception\" deleted successfully"));
}

#[test]
fn actor_crud_lifecycle() {
    let base_url = start_server();
    let mut api = api(&base_url, MemoryStore::new(), Route::Login);
    api.login("alice", "password123").unwrap();

    // Actors come back as a bare array.
    let actors: Vec<Actor> = api.list().unwrap();
    assert!(actors.iter().any(|a| a.actor_id == "a1"));

    let created = api
        .create::<Actor>(&CreateActor {
            first_name: "Ed".to_string(),
            last_name: "Chase".to_string(),
        })
        .unwrap();
    assert_eq!(created.full_name(), "Ed Chase");
    let id = created.actor_id.clone();

    let fetched: Actor = api.get(&id).unwrap();
    assert_eq!(fetched, created);

    let updated = api
        .update::<Actor>(
            &id,
            &UpdateActor {
                last_name: Some("Chase-Smith".to_string()),
                ..UpdateActor::default()
            },
        )
        .unwrap();
    assert_eq!(updated.first_name, "Ed");
    assert_eq!(updated.last_name, "Chase-Smith");

    api.delete::<Actor>(&id).unwrap();
    let err = api.get::<Actor>(&id).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.error_code(), "HTTP_404");
    assert_eq!(err.user_message(), "Actor not found");
}

#[test]
fn server_side_validation_surfaces_envelope() {
    let base_url = start_server();
    let mut api = api(&base_url, MemoryStore::new(), Route::Login);
    api.login("alice", "password123").unwrap();

    let err = api
        .create::<Actor>(&CreateActor {
            first_name: " ".to_string(),
            last_name: "Chase".to_string(),
        })
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
}

#[test]
fn wrong_password_is_rejected() {
    let base_url = start_server();
    let store = MemoryStore::new();
    let mut api = api(&base_url, store.clone(), Route::Login);

    let err = api.login("alice", "not-the-password").unwrap_err();
    assert_eq!(
        err,
        ApiError::Auth(AuthError::Rejected {
            message: "Incorrect username or password".to_string()
        })
    );
    assert!(store.snapshot().is_empty());
}

#[test]
fn unconfirmed_account_confirms_then_logs_in() {
    let base_url = start_server();
    let mut app = App::new(api(&base_url, MemoryStore::new(), Route::Login));

    login_as(&mut app, "bob", "password123").unwrap_err();
    assert_eq!(
        app.route(),
        &Route::ConfirmSignUp {
            username: Some("bob".to_string())
        }
    );

    let mut page = ConfirmSignUpPage::open(&app);
    assert_eq!(page.form().value(ConfirmSignUpField::Username), "bob");
    page.set(ConfirmSignUpField::Code, mock_server::CONFIRMATION_CODE);
    page.submit(&mut app).unwrap();
    assert_eq!(app.route(), &Route::Login);

    login_as(&mut app, "bob", "password123").unwrap();
    assert_eq!(app.route(), &Route::Films);
}

#[test]
fn forged_token_is_cleared_on_401() {
    let base_url = start_server();
    let mut store = MemoryStore::new();
    store.set(ACCESS_TOKEN_KEY, "forged").unwrap();
    let mut app = App::new(api(&base_url, store.clone(), Route::Films));

    let state = ListPage::<Film>::new().render(&mut app);
    assert!(matches!(state, QueryState::Failed(ref e) if e.is_unauthorized()));
    assert_eq!(app.route(), &Route::Login);
    assert_eq!(app.router().history(), &[Route::Login]);
    assert!(store.snapshot().is_empty());
}

#[test]
fn file_session_survives_restart() {
    let base_url = start_server();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut first = api(&base_url, FileStore::open(&path).unwrap(), Route::Login);
    first.login("alice", "password123").unwrap();
    drop(first);

    let mut second = api(&base_url, FileStore::open(&path).unwrap(), Route::Films);
    assert!(second.is_authenticated());
    let user = second.user_info().unwrap();
    assert_eq!(user.username, "alice");

    second.logout();
    assert!(!path.exists());
}

#[test]
fn unreachable_server_is_network_error() {
    // Bind then drop to get a port nothing listens on.
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let mut api = api(&format!("http://127.0.0.1:{port}"), MemoryStore::new(), Route::Login);

    let err = api.login("alice", "password123").unwrap_err();
    assert_eq!(err.error_code(), "NETWORK_ERROR");
    assert_eq!(err.user_message(), catalog_core::error::NETWORK_ERROR_MESSAGE);
}
