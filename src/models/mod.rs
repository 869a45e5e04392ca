//! Data models for the MyMediWallet auth service

pub mod auth;
pub use auth::*;
