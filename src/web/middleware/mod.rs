//! Middleware and extractors for the Web API.

mod auth;
mod client_ip;
mod cors;
mod security;

pub use auth::AuthUser;
pub use client_ip::{client_key, UNKNOWN_CLIENT};
pub use cors::create_cors_layer;
pub use security::security_headers;
