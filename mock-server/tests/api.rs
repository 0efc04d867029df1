use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, Actor, Film};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<&str>) -> Request<String> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    if body.is_some() {
        builder = builder.header(http::header::CONTENT_TYPE, "application/json");
    }
    builder.body(body.unwrap_or_default().to_string()).unwrap()
}

async fn send(app: &Router, req: Request<String>) -> axum::response::Response {
    app.clone().oneshot(req).await.unwrap()
}

async fn login(app: &Router) -> String {
    let resp = send(
        app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(r#"{"username":"alice","password":"password123"}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let grant: Value = body_json(resp).await;
    assert_eq!(grant["token_type"], "Bearer");
    assert_eq!(grant["expires_in"], 3600);
    grant["access_token"].as_str().unwrap().to_string()
}

// --- auth ---

#[tokio::test]
async fn wrong_password_is_401_detail() {
    let app = app();
    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(r#"{"username":"alice","password":"nope"}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Incorrect username or password");
}

#[tokio::test]
async fn unconfirmed_account_is_403_envelope() {
    let app = app();
    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(r#"{"username":"bob","password":"password123"}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error_code"], "USER_NOT_CONFIRMED");
}

#[tokio::test]
async fn catalog_requires_token() {
    let app = app();
    for uri in ["/api/films", "/api/actors", "/api/auth/user"] {
        let resp = send(&app, request("GET", uri, None, None)).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        let body: Value = body_json(resp).await;
        assert_eq!(body["error_code"], "AUTH_ERROR");
    }

    let resp = send(&app, request("GET", "/api/films", Some("forged"), None)).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn current_user_reports_email() {
    let app = app();
    let token = login(&app).await;
    let resp = send(&app, request("GET", "/api/auth/user", Some(&token), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let user: Value = body_json(resp).await;
    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@example.com");
}

#[tokio::test]
async fn confirm_signup_then_login() {
    let app = app();
    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/resend-confirmation-code",
            None,
            Some(r#"{"username":"bob"}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let delivery: Value = body_json(resp).await;
    assert_eq!(delivery["destination"], "b***@example.com");

    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/confirm-signup",
            None,
            Some(r#"{"username":"bob","confirmation_code":"000000"}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/confirm-signup",
            None,
            Some(r#"{"username":"bob","confirmation_code":"123456"}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(r#"{"username":"bob","password":"password123"}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn password_reset_changes_password() {
    let app = app();
    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/forgot-password",
            None,
            Some(r#"{"username":"alice"}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/confirm-forgot-password",
            None,
            Some(r#"{"username":"alice","confirmation_code":"123456","new_password":"brandnew99"}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(
        &app,
        request(
            "POST",
            "/api/auth/login",
            None,
            Some(r#"{"username":"alice","password":"brandnew99"}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

// --- films ---

#[tokio::test]
async fn film_list_is_enveloped() {
    let app = app();
    let token = login(&app).await;
    let resp = send(&app, request("GET", "/api/films", Some(&token), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    let films: Vec<Film> = serde_json::from_value(body["films"].clone()).unwrap();
    assert!(films.iter().any(|f| f.film_id == "f1" && f.title == "Inception"));
}

#[tokio::test]
async fn invalid_film_is_400_with_field_details() {
    let app = app();
    let token = login(&app).await;
    let resp = send(
        &app,
        request(
            "POST",
            "/api/films",
            Some(&token),
            Some(r#"{"title":"","rating":"G","release_year":1799}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = body_json(resp).await;
    assert_eq!(body["error_code"], "VALIDATION_ERROR");
    assert!(body["details"]["title"].is_string());
    assert!(body["details"]["release_year"].is_string());
}

#[tokio::test]
async fn unknown_film_is_404_detail() {
    let app = app();
    let token = login(&app).await;
    let resp = send(&app, request("GET", "/api/films/nope", Some(&token), None)).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = body_json(resp).await;
    assert_eq!(body["detail"], "Film not found");
}

#[tokio::test]
async fn film_crud_lifecycle() {
    let app = app();
    let token = login(&app).await;

    // create
    let resp = send(
        &app,
        request(
            "POST",
            "/api/films",
            Some(&token),
            Some(r#"{"title":"Alien","rating":"R","release_year":1979}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Film = body_json(resp).await;
    assert_eq!(created.title, "Alien");
    assert!(!created.delete_flag);
    let id = created.film_id;

    // update: only the rating
    let resp = send(
        &app,
        request(
            "PUT",
            &format!("/api/films/{id}"),
            Some(&token),
            Some(r#"{"rating":"PG-13"}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let updated: Film = body_json(resp).await;
    assert_eq!(updated.title, "Alien");
    assert_eq!(updated.rating, "PG-13");
    assert_eq!(updated.release_year, Some(1979));

    // soft delete
    let resp = send(
        &app,
        request("DELETE", &format!("/api/films/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());

    // gone from get and list
    let resp = send(
        &app,
        request("GET", &format!("/api/films/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = send(&app, request("GET", "/api/films", Some(&token), None)).await;
    let body: Value = body_json(resp).await;
    let films: Vec<Film> = serde_json::from_value(body["films"].clone()).unwrap();
    assert!(films.iter().all(|f| f.film_id != id));

    // second delete is a 404
    let resp = send(
        &app,
        request("DELETE", &format!("/api/films/{id}"), Some(&token), None),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- actors ---

#[tokio::test]
async fn actor_list_is_bare_array() {
    let app = app();
    let token = login(&app).await;
    let resp = send(&app, request("GET", "/api/actors", Some(&token), None)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let actors: Vec<Actor> = body_json(resp).await;
    assert!(actors.iter().any(|a| a.first_name == "Penelope"));
}

#[tokio::test]
async fn actor_update_and_delete() {
    let app = app();
    let token = login(&app).await;

    let resp = send(
        &app,
        request(
            "PUT",
            "/api/actors/a2",
            Some(&token),
            Some(r#"{"last_name":"Wahlberg Jr."}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let actor: Actor = body_json(resp).await;
    assert_eq!(actor.first_name, "Nick");
    assert_eq!(actor.last_name, "Wahlberg Jr.");

    let resp = send(&app, request("DELETE", "/api/actors/a2", Some(&token), None)).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = send(&app, request("GET", "/api/actors", Some(&token), None)).await;
    let actors: Vec<Actor> = body_json(resp).await;
    assert!(actors.iter().all(|a| a.actor_id != "a2"));
}

#[tokio::test]
async fn blank_actor_name_is_rejected() {
    let app = app();
    let token = login(&app).await;
    let resp = send(
        &app,
        request(
            "POST",
            "/api/actors",
            Some(&token),
            Some(r#"{"first_name":"Ann","last_name":"  "}"#),
        ),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
