//! CampusMart Core - Shared domain types.
//!
//! This crate provides the types shared by every CampusMart component:
//! - `server` - The inventory / point-of-sale web application
//! - `cli` - Command-line tools for migrations, user provisioning and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. The optional `postgres` feature adds `sqlx`
//! encoding for the types that are stored directly in columns.
//!
//! # Modules
//!
//! - [`types`] - IDs, money, usernames, emails, roles and cart lines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
