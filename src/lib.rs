//! Salesesy - a small CRM over a SQLite-backed JSON API
//!
//! This crate provides the store, the HTTP API, the client-side view model
//! and the `salesesy` CLI.
//!
//! # Architecture
//!
//! - [`model`] - Data types (Contact, Deal, Pipeline, Stage, Task, CompanyKey)
//! - [`validate`] - Request-body validation into typed inputs
//! - [`storage`] - SQLite database layer
//! - [`aggregate`] - Company profile, leaderboard and dashboard figures
//! - [`api`] - HTTP JSON API (axum)
//! - [`client`] - API client, view state reducer and demo data
//! - [`cli`] - Command-line interface using clap
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregate;
pub mod api;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod validate;

pub use error::{Error, Result};
