//! API route handlers

pub mod error;
pub mod release;
pub mod system;
pub mod update;

