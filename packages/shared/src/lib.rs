//! Utilities shared by the Tsunagi packages.

pub mod logger;
pub mod time;
