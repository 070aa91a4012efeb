//! Actor implementations

pub mod release_state;

pub use release_state::{ReleaseStateActor, ReleaseStateActorArgs};
