//! Configuration type definitions.

use serde::{Deserialize, Serialize};

/// One configured edit rule, as supplied and persisted by the rule store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Pattern the whole message must match.
    pub pattern: String,
    /// Restrict matching to one surface (any name `Surface::from_name`
    /// resolves). `None` matches every surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_surface: Option<String>,
    /// Replacement template; `$n` references capture groups, `&`-codes are
    /// translated to colors. An empty replacement suppresses chat-family
    /// messages.
    pub replacement: String,
    /// Move matching chat-family messages to this surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_surface: Option<String>,
}

/// Pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The server's protocol version; gates which surfaces are handled.
    pub protocol_version: u32,
    /// Attach hover/click edit affordances to chat messages of players the
    /// permission oracle approves.
    pub attach_edit_affordances: bool,
    /// Command the click affordance runs; the message identifier is
    /// appended.
    pub edit_command: String,
    /// Seconds a cache entry survives after its last access.
    pub cache_ttl_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            protocol_version: 340,
            attach_edit_affordances: true,
            edit_command: "/scribe edit".to_string(),
            cache_ttl_secs: 15 * 60,
        }
    }
}
