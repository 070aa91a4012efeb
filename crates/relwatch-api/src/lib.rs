//! relwatch-api: Shared API types and schemas
//!
//! Contains published state events and HTTP response bodies used across the
//! daemon and the CLI.

pub mod events;
pub mod responses;
