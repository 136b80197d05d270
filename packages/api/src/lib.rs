//! # HTTP API for beacon map projects
//!
//! Axum router, authentication and PostgreSQL persistence on top of the
//! `store` crate's domain logic.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`settings`] | Layered configuration: defaults, `beaconmap.toml`, `BEACONMAP__*` env vars |
//! | [`auth`] | Argon2 password hashing, sealed bearer tokens, the [`AuthUser`](auth::AuthUser) extractor |
//! | [`db`] | Connection pool, migrations and the [`PgStore`](db::PgStore) backend |
//! | [`handlers`] | Request handlers for accounts, projects and placement |
//! | [`routes`] | Router assembly with CORS, tracing and body-limit layers |
//! | [`error`] | [`ApiError`](error::ApiError) and its `{"message"}` response body |
//! | [`state`] | [`AppState`] shared by all handlers |

pub mod auth;
pub mod db;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod settings;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::router;
pub use settings::Settings;
pub use state::AppState;
