//! In-memory catalog backend for local runs and integration tests.
//!
//! Mirrors the REST contract the admin client talks to: bearer-token auth,
//! account recovery, and film/actor CRUD with soft delete. Every account
//! accepts the confirmation code `123456`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const CONFIRMATION_CODE: &str = "123456";
pub const TOKEN_TTL_SECS: i64 = 3600;
pub const RATINGS: [&str; 5] = ["G", "PG", "PG-13", "R", "NC-17"];

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Film {
    pub film_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub release_year: Option<i32>,
    pub rating: String,
    pub last_update: String,
    pub delete_flag: bool,
}

/// Create and update body. Create requires `title` and `rating`; update
/// applies only the fields present.
#[derive(Debug, Default, Deserialize)]
pub struct FilmInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub release_year: Option<i32>,
    pub rating: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Actor {
    pub actor_id: String,
    pub first_name: String,
    pub last_name: String,
    pub last_update: String,
    pub delete_flag: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActorInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct Account {
    pub password: String,
    pub email: String,
    pub confirmed: bool,
}

#[derive(Debug, Default)]
pub struct Store {
    pub films: BTreeMap<String, Film>,
    pub actors: BTreeMap<String, Actor>,
    pub accounts: HashMap<String, Account>,
    /// Access token to username.
    pub tokens: HashMap<String, String>,
}

impl Store {
    /// Two accounts (`alice` confirmed, `bob` not, both with password
    /// `password123`) and a few films and actors.
    pub fn seeded() -> Self {
        let mut store = Store::default();
        store.add_account("alice", "password123", "alice@example.com", true);
        store.add_account("bob", "password123", "bob@example.com", false);

        for (id, title, description, year, rating) in [
            ("f1", "Inception", Some("A thief who steals corporate secrets through dreams"), Some(2010), "PG-13"),
            ("f2", "Heat", None, Some(1995), "R"),
            ("f3", "Spirited Away", Some("A girl wanders into a world of spirits"), Some(2001), "PG"),
        ] {
            store.films.insert(
                id.to_string(),
                Film {
                    film_id: id.to_string(),
                    title: title.to_string(),
                    description: description.map(str::to_string),
                    image_path: None,
                    release_year: year,
                    rating: rating.to_string(),
                    last_update: now(),
                    delete_flag: false,
                },
            );
        }
        for (id, first, last) in [("a1", "Penelope", "Guiness"), ("a2", "Nick", "Wahlberg")] {
            store.actors.insert(
                id.to_string(),
                Actor {
                    actor_id: id.to_string(),
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    last_update: now(),
                    delete_flag: false,
                },
            );
        }
        store
    }

    pub fn add_account(&mut self, username: &str, password: &str, email: &str, confirmed: bool) {
        self.accounts.insert(
            username.to_string(),
            Account {
                password: password.to_string(),
                email: email.to_string(),
                confirmed,
            },
        );
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Router over the seeded store.
pub fn app() -> Router {
    router(Arc::new(RwLock::new(Store::seeded())))
}

pub fn router(db: Db) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/user", get(current_user))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/auth/confirm-forgot-password", post(confirm_forgot_password))
        .route("/api/auth/confirm-signup", post(confirm_signup))
        .route("/api/auth/resend-confirmation-code", post(resend_confirmation_code))
        .route("/api/films", get(list_films).post(create_film))
        .route(
            "/api/films/{id}",
            get(get_film).put(update_film).delete(delete_film),
        )
        .route("/api/actors", get(list_actors).post(create_actor))
        .route(
            "/api/actors/{id}",
            get(get_actor).put(update_actor).delete(delete_actor),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn now() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error bodies in the two shapes the backend produces: the structured
/// envelope, and the framework's bare `{"detail": ...}`.
#[derive(Debug)]
pub enum Failure {
    Envelope {
        status: StatusCode,
        error_code: &'static str,
        message: String,
        details: Option<Value>,
    },
    Detail {
        status: StatusCode,
        detail: String,
    },
}

impl Failure {
    fn unauthorized(message: &str) -> Self {
        Failure::Envelope {
            status: StatusCode::UNAUTHORIZED,
            error_code: "AUTH_ERROR",
            message: message.to_string(),
            details: None,
        }
    }

    fn not_found(what: &str) -> Self {
        Failure::Detail {
            status: StatusCode::NOT_FOUND,
            detail: format!("{what} not found"),
        }
    }

    fn bad_request(detail: &str) -> Self {
        Failure::Detail {
            status: StatusCode::BAD_REQUEST,
            detail: detail.to_string(),
        }
    }

    fn invalid(fields: BTreeMap<&'static str, String>) -> Self {
        Failure::Envelope {
            status: StatusCode::BAD_REQUEST,
            error_code: "VALIDATION_ERROR",
            message: "Invalid input".to_string(),
            details: Some(json!(fields)),
        }
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        match self {
            Failure::Envelope {
                status,
                error_code,
                message,
                details,
            } => {
                let mut body = json!({"error_code": error_code, "message": message});
                if let Some(details) = details {
                    body["details"] = details;
                }
                (status, Json(body)).into_response()
            }
            Failure::Detail { status, detail } => {
                (status, Json(json!({"detail": detail}))).into_response()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

/// Username behind the request's bearer token.
fn authorize(store: &Store, headers: &HeaderMap) -> Result<String, Failure> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Failure::unauthorized("Authentication required"))?;
    let token = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| Failure::unauthorized("Authentication required"))?;
    store
        .tokens
        .get(token)
        .cloned()
        .ok_or_else(|| Failure::unauthorized("Invalid or expired token"))
}

fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

#[derive(Deserialize)]
pub struct ConfirmForgotPasswordRequest {
    pub username: String,
    pub confirmation_code: String,
    pub new_password: String,
}

#[derive(Deserialize)]
pub struct ConfirmSignUpRequest {
    pub username: String,
    pub confirmation_code: String,
}

async fn login(State(db): State<Db>, Json(input): Json<LoginRequest>) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let account = store
        .accounts
        .get(&input.username)
        .filter(|a| a.password == input.password)
        .ok_or_else(|| Failure::Detail {
            status: StatusCode::UNAUTHORIZED,
            detail: "Incorrect username or password".to_string(),
        })?;
    if !account.confirmed {
        tracing::info!(username = %input.username, "login refused, account not confirmed");
        return Err(Failure::Envelope {
            status: StatusCode::FORBIDDEN,
            error_code: "USER_NOT_CONFIRMED",
            message: "User is not confirmed".to_string(),
            details: None,
        });
    }

    let token = Uuid::new_v4().to_string();
    store.tokens.insert(token.clone(), input.username.clone());
    tracing::info!(username = %input.username, "login");
    Ok(Json(json!({
        "access_token": token,
        "token_type": "Bearer",
        "expires_in": TOKEN_TTL_SECS,
        "refresh_token": Uuid::new_v4().to_string(),
        "id_token": null,
    })))
}

async fn current_user(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    let username = authorize(&store, &headers)?;
    let account = store
        .accounts
        .get(&username)
        .ok_or_else(|| Failure::not_found("User"))?;
    Ok(Json(json!({
        "username": username,
        "name": username,
        "sub": username,
        "email": account.email,
        "email_verified": account.confirmed,
    })))
}

fn code_delivery(message: &str, email: &str) -> Json<Value> {
    Json(json!({
        "message": message,
        "destination": mask_email(email),
        "delivery_medium": "EMAIL",
    }))
}

async fn forgot_password(
    State(db): State<Db>,
    Json(input): Json<UsernameRequest>,
) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    let account = store
        .accounts
        .get(&input.username)
        .ok_or_else(|| Failure::bad_request("User not found"))?;
    Ok(code_delivery("Password reset code sent", &account.email))
}

async fn confirm_forgot_password(
    State(db): State<Db>,
    Json(input): Json<ConfirmForgotPasswordRequest>,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let account = store
        .accounts
        .get_mut(&input.username)
        .ok_or_else(|| Failure::bad_request("User not found"))?;
    if input.confirmation_code != CONFIRMATION_CODE {
        return Err(Failure::bad_request("Invalid verification code"));
    }
    if input.new_password.chars().count() < 8 {
        return Err(Failure::invalid(BTreeMap::from([(
            "new_password",
            "Password must be at least 8 characters".to_string(),
        )])));
    }
    account.password = input.new_password;
    tracing::info!(username = %input.username, "password reset");
    Ok(Json(json!({"message": "Password has been reset"})))
}

async fn confirm_signup(
    State(db): State<Db>,
    Json(input): Json<ConfirmSignUpRequest>,
) -> Result<Json<Value>, Failure> {
    let mut store = db.write().await;
    let account = store
        .accounts
        .get_mut(&input.username)
        .ok_or_else(|| Failure::bad_request("User not found"))?;
    if input.confirmation_code != CONFIRMATION_CODE {
        return Err(Failure::bad_request("Invalid verification code"));
    }
    account.confirmed = true;
    tracing::info!(username = %input.username, "account confirmed");
    Ok(Json(json!({"message": "Account confirmed"})))
}

async fn resend_confirmation_code(
    State(db): State<Db>,
    Json(input): Json<UsernameRequest>,
) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    let account = store
        .accounts
        .get(&input.username)
        .ok_or_else(|| Failure::bad_request("User not found"))?;
    if account.confirmed {
        return Err(Failure::bad_request("User is already confirmed"));
    }
    Ok(code_delivery("Confirmation code resent", &account.email))
}

// ---------------------------------------------------------------------------
// Films
// ---------------------------------------------------------------------------

fn check_film(input: &FilmInput, creating: bool) -> Result<(), Failure> {
    let mut fields = BTreeMap::new();
    match &input.title {
        Some(title) if title.trim().is_empty() => {
            fields.insert("title", "Title is required".to_string());
        }
        None if creating => {
            fields.insert("title", "Title is required".to_string());
        }
        _ => {}
    }
    match &input.rating {
        Some(rating) if !RATINGS.contains(&rating.as_str()) => {
            fields.insert("rating", format!("Rating must be one of {}", RATINGS.join(", ")));
        }
        None if creating => {
            fields.insert("rating", "Rating is required".to_string());
        }
        _ => {}
    }
    if let Some(year) = input.release_year {
        if !(1800..=2100).contains(&year) {
            fields.insert(
                "release_year",
                "Release year must be between 1800 and 2100".to_string(),
            );
        }
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(Failure::invalid(fields))
    }
}

async fn list_films(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    let films: Vec<&Film> = store.films.values().filter(|f| !f.delete_flag).collect();
    Ok(Json(json!({ "films": films })))
}

async fn create_film(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<FilmInput>,
) -> Result<(StatusCode, Json<Film>), Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    check_film(&input, true)?;
    let film = Film {
        film_id: Uuid::new_v4().to_string(),
        title: input.title.unwrap_or_default().trim().to_string(),
        description: input.description,
        image_path: input.image_path,
        release_year: input.release_year,
        rating: input.rating.unwrap_or_default(),
        last_update: now(),
        delete_flag: false,
    };
    store.films.insert(film.film_id.clone(), film.clone());
    tracing::info!(film_id = %film.film_id, "film created");
    Ok((StatusCode::CREATED, Json(film)))
}

async fn get_film(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Film>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    store
        .films
        .get(&id)
        .filter(|f| !f.delete_flag)
        .cloned()
        .map(Json)
        .ok_or_else(|| Failure::not_found("Film"))
}

async fn update_film(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<FilmInput>,
) -> Result<Json<Film>, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let film = store
        .films
        .get_mut(&id)
        .filter(|f| !f.delete_flag)
        .ok_or_else(|| Failure::not_found("Film"))?;
    check_film(&input, false)?;
    if let Some(title) = input.title {
        film.title = title.trim().to_string();
    }
    if let Some(rating) = input.rating {
        film.rating = rating;
    }
    if input.description.is_some() {
        film.description = input.description;
    }
    if input.image_path.is_some() {
        film.image_path = input.image_path;
    }
    if input.release_year.is_some() {
        film.release_year = input.release_year;
    }
    film.last_update = now();
    Ok(Json(film.clone()))
}

async fn delete_film(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let film = store
        .films
        .get_mut(&id)
        .filter(|f| !f.delete_flag)
        .ok_or_else(|| Failure::not_found("Film"))?;
    film.delete_flag = true;
    film.last_update = now();
    tracing::info!(film_id = %id, "film soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Actors
// ---------------------------------------------------------------------------

fn check_actor(input: &ActorInput, creating: bool) -> Result<(), Failure> {
    let mut fields = BTreeMap::new();
    for (name, value, message) in [
        ("first_name", &input.first_name, "First name is required"),
        ("last_name", &input.last_name, "Last name is required"),
    ] {
        let blank = match value {
            Some(v) => v.trim().is_empty(),
            None => creating,
        };
        if blank {
            fields.insert(name, message.to_string());
        }
    }
    if fields.is_empty() {
        Ok(())
    } else {
        Err(Failure::invalid(fields))
    }
}

/// Unlike films, the actor list is a bare array.
async fn list_actors(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<Actor>>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok(Json(
        store.actors.values().filter(|a| !a.delete_flag).cloned().collect(),
    ))
}

async fn create_actor(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<ActorInput>,
) -> Result<(StatusCode, Json<Actor>), Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    check_actor(&input, true)?;
    let actor = Actor {
        actor_id: Uuid::new_v4().to_string(),
        first_name: input.first_name.unwrap_or_default().trim().to_string(),
        last_name: input.last_name.unwrap_or_default().trim().to_string(),
        last_update: now(),
        delete_flag: false,
    };
    store.actors.insert(actor.actor_id.clone(), actor.clone());
    tracing::info!(actor_id = %actor.actor_id, "actor created");
    Ok((StatusCode::CREATED, Json(actor)))
}

async fn get_actor(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Actor>, Failure> {
    let store = db.read().await;
    authorize(&store, &headers)?;
    store
        .actors
        .get(&id)
        .filter(|a| !a.delete_flag)
        .cloned()
        .map(Json)
        .ok_or_else(|| Failure::not_found("Actor"))
}

async fn update_actor(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(input): Json<ActorInput>,
) -> Result<Json<Actor>, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let actor = store
        .actors
        .get_mut(&id)
        .filter(|a| !a.delete_flag)
        .ok_or_else(|| Failure::not_found("Actor"))?;
    check_actor(&input, false)?;
    if let Some(first) = input.first_name {
        actor.first_name = first.trim().to_string();
    }
    if let Some(last) = input.last_name {
        actor.last_name = last.trim().to_string();
    }
    actor.last_update = now();
    Ok(Json(actor.clone()))
}

async fn delete_actor(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, Failure> {
    let mut store = db.write().await;
    authorize(&store, &headers)?;
    let actor = store
        .actors
        .get_mut(&id)
        .filter(|a| !a.delete_flag)
        .ok_or_else(|| Failure::not_found("Actor"))?;
    actor.delete_flag = true;
    actor.last_update = now();
    tracing::info!(actor_id = %id, "actor soft-deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn film_input(json: &str) -> FilmInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn create_requires_title_and_rating() {
        let err = check_film(&film_input("{}"), true).unwrap_err();
        match err {
            Failure::Envelope { details: Some(details), .. } => {
                assert_eq!(details["title"], "Title is required");
                assert_eq!(details["rating"], "Rating is required");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn update_accepts_partial_body() {
        assert!(check_film(&film_input(r#"{"rating":"R"}"#), false).is_ok());
        assert!(check_film(&film_input(r#"{"title":"  "}"#), false).is_err());
    }

    #[test]
    fn release_year_range_is_inclusive() {
        for (year, ok) in [(1799, false), (1800, true), (2100, true), (2101, false)] {
            let input = FilmInput {
                title: Some("T".to_string()),
                rating: Some("G".to_string()),
                release_year: Some(year),
                ..FilmInput::default()
            };
            assert_eq!(check_film(&input, true).is_ok(), ok, "{year}");
        }
    }

    #[test]
    fn unknown_rating_is_rejected() {
        let input = film_input(r#"{"title":"T","rating":"X"}"#);
        assert!(check_film(&input, true).is_err());
    }

    #[test]
    fn actor_names_required_on_create_only() {
        assert!(check_actor(&ActorInput::default(), true).is_err());
        assert!(check_actor(&ActorInput::default(), false).is_ok());
    }

    #[test]
    fn email_is_masked() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("nobody"), "***");
    }

    #[test]
    fn seeded_store_has_inception() {
        let store = Store::seeded();
        assert_eq!(store.films["f1"].title, "Inception");
        assert!(!store.accounts["bob"].confirmed);
    }
}
