//! Core types for the School Portal.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod activity;
pub mod email;
pub mod id;
pub mod lrn;
pub mod role;
pub mod session;

pub use activity::{Activity, ActivityKind, NewActivity, Question, Resource, ResourceUpdate, NewResource, Tag};
pub use email::{Email, EmailError};
pub use id::*;
pub use lrn::{Lrn, LrnError};
pub use role::{Role, RoleError};
pub use session::{EnrollmentStatus, Session, SessionState};
