//! # Database module — PostgreSQL persistence
//!
//! - [`connect`] opens a [`PgPool`](sqlx::PgPool) from the `database` settings.
//! - [`migrate`] applies the embedded migrations in `packages/api/migrations`.
//! - [`PgStore`] implements the `store` crate's [`ProjectStore`](store::ProjectStore)
//!   and [`UserStore`](store::UserStore) traits on top of the pool.
//!
//! `map_data` is kept as `JSONB` and round-trips untouched; the typed view in
//! `store::MapData` is only built when a layout is auto-placed.

mod pool;
mod postgres;

pub use pool::{connect, migrate};
pub use postgres::PgStore;
