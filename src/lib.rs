//! MyMediWallet Authentication Backend
//!
//! Wallet-based challenge/response authentication: short-lived signing
//! challenges, Ed25519 signature verification, and opaque bearer sessions.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
