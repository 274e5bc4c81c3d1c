//! CampusMart server library.
//!
//! Inventory and point-of-sale web application for a campus store:
//! password login, product catalog management, a checkout API that
//! decrements stock atomically, a reporting dashboard, and optional
//! AI-written product copy and business summaries.
//!
//! The binary in `main.rs` wires these modules into an axum server; the
//! `cm-cli` crate reuses the database, auth and catalog layers.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
