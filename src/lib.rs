//! Library crate for chess-live-back, exposing modules for binaries and integration tests.

/// Runtime configuration.
pub mod config;
/// Storage backends and their records.
pub mod dao;
/// Request and response bodies.
pub mod dto;
/// Service and HTTP error types.
pub mod error;
/// HTTP routing.
pub mod routes;
/// Domain services and background tasks.
pub mod services;
/// Shared application state.
pub mod state;
