//! Core types for the LPG Center.
//!
//! This module provides the records persisted in the key-value store and the
//! type-safe wrappers around their identifiers.

pub mod id;
pub mod identity;
pub mod product;
pub mod role;
pub mod user;

pub use id::*;
pub use identity::{DEFAULT_IDENTITY_DOMAIN, IdentityEmail, IdentityError};
pub use product::{DEFAULT_LOW_STOCK_THRESHOLD, NewProduct, Product, ProductPatch};
pub use role::Role;
pub use user::{User, UserPatch};
