//! Nora file server - project file store with a REST API
//!
//! This crate provides the backend that editing sessions load from and
//! save to. Files live under `<root>/<project>/<path>`.

pub mod api;
pub mod app_state;
pub mod config;
