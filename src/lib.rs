pub mod actions;
pub mod app;
pub mod commands;
#[cfg(not(target_arch = "wasm32"))]
pub mod config;
pub mod dom;
pub mod error;
#[cfg(not(target_arch = "wasm32"))]
pub mod telemetry;
pub mod validate;
#[cfg(feature = "web")]
pub mod web;
