//! API handlers for the MediWallet auth service

pub mod auth;
pub mod health;

pub use auth::*;
pub use health::{health_check, root};

// Re-export AuthenticatedWallet from middleware for handler use
pub use crate::middleware::auth::AuthenticatedWallet;
