//! Client core for the film and actor catalog admin.
//!
//! # Overview
//! Everything the admin client does short of touching the network lives
//! here: session lifecycle, the HTTP boundary, resource access, the query
//! cache, form validation, toasts, confirm dialogs, routing and the page
//! controllers. The host supplies a `Transport` that performs the actual
//! HTTP round-trip (host-does-IO pattern), which keeps the core
//! deterministic and testable.
//!
//! # Design
//! - `CatalogClient` is stateless; it holds only `base_url` and splits every
//!   operation into `build_*` (produces a request) and `parse_*` (consumes a
//!   response).
//! - `Gateway` runs every request through the bearer-token and 401
//!   interceptors; `SessionManager` is the single writer of credentials.
//! - Films and actors share one generic path through the `Resource` trait.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod api;
pub mod cache;
pub mod client;
pub mod dialog;
pub mod error;
pub mod form;
pub mod forms;
pub mod gateway;
pub mod http;
pub mod pages;
pub mod queries;
pub mod resource;
pub mod routes;
pub mod session;
pub mod storage;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod toast;
pub mod types;

pub use api::CatalogApi;
pub use cache::{QueryCache, QueryKey};
pub use client::CatalogClient;
pub use error::{ApiError, AuthError, FieldErrors};
pub use gateway::Gateway;
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, TransportError};
pub use pages::App;
pub use queries::{MutationState, QueryState};
pub use resource::{EntityKind, Resource};
pub use routes::{Route, Router};
pub use session::{Session, SessionManager};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use toast::{Toast, ToastKind, ToastQueue};
pub use types::{Actor, CreateActor, CreateFilm, Film, Rating, UpdateActor, UpdateFilm, User};
