//! School Portal Client - Backend access and session lifecycle.
//!
//! Everything here that touches the network or mutable state:
//! - [`config`] - Environment configuration
//! - [`api`] - Typed HTTP client for the portal backend
//! - [`session_store`] - The single owner of the session record
//! - [`auth`] - Login, signup and logout
//! - [`navigator`] - Per-navigation refresh, landing and gate
//! - [`challenge`] - Human-verification tokens
//!
//! Decisions themselves live in `school-portal-core`; this crate feeds them
//! fresh session state.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod auth;
pub mod challenge;
pub mod config;
pub mod error;
pub mod navigator;
pub mod session_store;

#[cfg(test)]
mod testing;

pub use api::types::AuthOutcome;
pub use api::{BackendClient, SessionBackend};
pub use auth::{AuthService, AuthSuccess};
pub use challenge::{ChallengeError, ChallengeToken};
pub use config::{ConfigError, LogFormat, PortalConfig};
pub use error::{PortalError, Result, SchemaError};
pub use navigator::{NavState, Navigation, Navigator};
pub use session_store::{Refreshed, SessionStore, SessionSubscription};
