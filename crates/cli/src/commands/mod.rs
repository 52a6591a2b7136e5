//! CLI command implementations.

pub mod gate;
pub mod menu;
pub mod shell;
