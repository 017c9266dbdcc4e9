//! Core types for the radius query engine.

use serde::{Deserialize, Serialize};

/// Lifecycle state of the engine's circle query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryState {
    /// No query configured.
    #[default]
    Unconfigured,
    /// Initial scan running; members are being announced.
    Initializing,
    /// Initial sync complete; mutations are tracked incrementally.
    Ready,
    /// Backend failure; terminal until a fresh configure.
    Errored,
}

impl QueryState {
    /// Returns whether mutation observations are applied in this state.
    #[must_use]
    pub const fn is_tracking(self) -> bool {
        matches!(self, Self::Initializing | Self::Ready)
    }
}

/// A membership change pushed to the query's subscriber.
///
/// Events serialize with an `event` tag so a bridge layer can forward
/// them through a host event stream as tagged maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum MembershipEvent {
    /// A key entered the circle (new member).
    Entered {
        /// Entity key.
        id: String,
        /// Member latitude at entry.
        latitude: f64,
        /// Member longitude at entry.
        longitude: f64,
    },
    /// A key left the circle or was removed from the store.
    Exited {
        /// Entity key.
        id: String,
    },
    /// A member changed position without leaving the circle.
    Moved {
        /// Entity key.
        id: String,
        /// New latitude.
        latitude: f64,
        /// New longitude.
        longitude: f64,
    },
    /// All currently-known members have been announced.
    Ready,
    /// Unrecoverable backend failure; the query is terminal until the
    /// caller configures again.
    Error {
        /// Failure description.
        detail: String,
    },
}

impl MembershipEvent {
    /// Returns the entity key the event concerns, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Entered { id, .. } | Self::Exited { id } | Self::Moved { id, .. } => {
                Some(id.as_str())
            }
            Self::Ready | Self::Error { .. } => None,
        }
    }

    /// Serializes the event to the tagged JSON map a bridge pushes on
    /// its stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (extremely rare).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses an event from its tagged JSON form.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or missing required fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
