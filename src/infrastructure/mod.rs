//! Infrastructure layer - concrete implementations

pub mod auth;
pub mod data;
pub mod logging;
