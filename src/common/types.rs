//! Shared value types.

use uuid::Uuid;

use crate::surface::Surface;

/// The player a packet is being sent to (or received from).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRef {
    /// Stable connection identity.
    pub id: Uuid,
    /// Display name, used in diagnostics and placeholder expansion.
    pub name: String,
}

impl PlayerRef {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A message decoded out of a packet.
///
/// `structured` distinguishes the rich component-tree encoding from legacy
/// flat text with inline color codes. Instances are immutable; the
/// decoded-message cache retains them until eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedMessage {
    pub surface: Surface,
    pub text: String,
    pub structured: bool,
}

impl DecodedMessage {
    pub fn new(surface: Surface, text: impl Into<String>, structured: bool) -> Self {
        Self {
            surface,
            text: text.into(),
            structured,
        }
    }
}
