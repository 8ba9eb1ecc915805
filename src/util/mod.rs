//! Shared utilities

pub mod buffer;
pub mod logging;
pub mod time;
pub mod verification;
