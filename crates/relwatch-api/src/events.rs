//! State events published to consumers

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Key/value event describing updater state
///
/// Serialized as `{"key": "...", "value": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
pub enum StateEvent {
    /// The update capability exists in this process
    HasUpdater(bool),
    /// Version tag of the newest release seen
    AvailableVersion(String),
    /// Release notes of the newest release seen
    ReleaseNotes(String),
}

impl StateEvent {
    /// Key under which the event is published
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            StateEvent::HasUpdater(_) => "hasUpdater",
            StateEvent::AvailableVersion(_) => "availableVersion",
            StateEvent::ReleaseNotes(_) => "releaseNotes",
        }
    }
}
