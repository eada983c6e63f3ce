//! Recipe API service
//!
//! Users register, obtain a bearer token and then manage their own recipes,
//! tags and ingredients. Every recipe-side query is scoped to the
//! authenticated owner.

use sqlx::migrate::Migrator;

pub mod accounts;
pub mod config;
pub mod error;
pub mod extract;
pub mod images;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod validation;

pub use state::AppState;

/// Schema migrations for the PostgreSQL backend
pub static MIGRATOR: Migrator = sqlx::migrate!();
