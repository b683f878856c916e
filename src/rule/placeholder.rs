//! Optional placeholder expansion services.
//!
//! Hosts may register zero or more expanders (server-wide placeholder
//! plugins, stats providers, ...). They run in registration order over a
//! rule's replacement text; absence is just an empty list.

use crate::common::types::PlayerRef;

/// A placeholder expansion capability.
///
/// Implementations must be fast synchronous calls: they run on the
/// packet-delivery path.
pub trait PlaceholderExpander: Send + Sync {
    /// Short name for diagnostics.
    fn name(&self) -> &str;

    /// Expand any placeholders the service recognizes.
    fn expand(&self, player: &PlayerRef, text: &str) -> String;
}

/// Run `text` through every expander in order.
pub fn expand_all(
    expanders: &[Box<dyn PlaceholderExpander>],
    player: &PlayerRef,
    text: String,
) -> String {
    expanders
        .iter()
        .fold(text, |text, expander| expander.expand(player, &text))
}
