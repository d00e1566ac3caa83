/// Newsletter Service Library
///
/// Backend for a social newsletter: accounts, posts, threaded comments and a
/// per-user vote ledger, served over a JSON HTTP API.
///
/// # Modules
///
/// - `config`: Configuration management
/// - `db`: PostgreSQL pool setup and migrations
/// - `domain`: Users, posts, comments and votes
/// - `error`: Error types and the HTTP error envelope
/// - `handlers`: HTTP request handlers and routing
/// - `metrics`: Prometheus collectors
/// - `middleware`: Session resolution for handlers
/// - `repository`: Storage traits with PostgreSQL and in-memory backends
/// - `services`: Business rules
/// - `state`: Shared application state
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod services;
pub mod state;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::{AppState, ServiceSettings};
