//! Tategaki - vertical Japanese text rendering
//!
//! HTTP service that wraps Japanese text into vertical columns, rasterizes
//! it and returns trimmed PNG images.
//! This library exposes modules for integration testing.

pub mod api;
pub mod assets;
pub mod error;
pub mod models;
pub mod rendering;
pub mod server;
pub mod services;
