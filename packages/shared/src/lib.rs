//! Shared utilities for the Yoriai packages.

pub mod logger;
pub mod time;
