//! # Actix Middleware Library
//!
//! Middleware components shared by newsletter Actix services
//!
//! ## Modules
//! - `jwt_auth`: resolves the acting user from a bearer token or `token` cookie
//! - `correlation_id`: request correlation ids for log stitching

pub mod correlation_id;
pub mod jwt_auth;

pub use correlation_id::{CorrelationId, CorrelationIdMiddleware};
pub use jwt_auth::{Actor, AuthError, JwtAuthMiddleware, TOKEN_COOKIE};
