//! Core types for CampusMart.
//!
//! This module provides type-safe wrappers for the store's domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod money;
pub mod role;
pub mod username;

pub use cart::CartLine;
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Money, MoneyError};
pub use role::UserRole;
pub use username::{Username, UsernameError};
