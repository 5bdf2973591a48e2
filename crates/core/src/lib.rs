//! K4J LPG Center Core - Shared types library.
//!
//! This crate provides the record types shared by every component:
//! - `server` - HTTP API over the key-value store and auth provider
//! - `client` - Typed HTTP client mirroring the server endpoints
//! - `cli` - Operator command-line tool
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Records (`User`, `Product`), string IDs, roles and identities
//! - [`api`] - JSON envelopes exchanged between server and client

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod types;

pub use types::*;
