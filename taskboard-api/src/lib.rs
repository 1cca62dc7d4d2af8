//! # Taskboard API Server Library
//!
//! HTTP layer over the `taskboard-shared` services: users own task items,
//! both exposed as JSON CRUD resources under `/api`.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Validated JSON body and path ID extractors
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
