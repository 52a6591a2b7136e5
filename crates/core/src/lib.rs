//! School Portal Core - Shared types and authorization rules.
//!
//! This crate provides the pieces every School Portal component agrees on:
//! - `client` - HTTP client, session store and navigator
//! - `cli` - Terminal front end for the portal
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. Every decision here can be evaluated offline and is
//! deterministic for identical inputs.
//!
//! # Modules
//!
//! - [`types`] - Roles, sessions, emails, LRNs and activity payloads
//! - [`routes`] - The client route surface and per-role allowlists
//! - [`gate`] - The route authorization gate
//! - [`landing`] - Post-refresh landing redirects
//! - [`navigation`] - Role-dependent menus
//! - [`validation`] - Field-scoped form validation
//! - [`wizard`] - Multi-step activity builder

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod gate;
pub mod landing;
pub mod navigation;
pub mod routes;
pub mod types;
pub mod validation;
pub mod wizard;

pub use gate::{Decision, authorize, authorize_route};
pub use landing::{Landing, resolve_landing};
pub use types::*;
