//! API handlers.

pub mod auth;
pub mod health;

pub use auth::*;
pub use health::*;
