//! Shared cryptographic helpers for newsletter services.
//!
//! - `jwt`: HS256 session token issuance and validation

pub mod jwt;

pub use jwt::{Claims, JwtSigner};
