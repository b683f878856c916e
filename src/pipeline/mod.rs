//! The per-packet rewrite pipeline.
//!
//! Runs synchronously on whatever thread delivers the packet, never blocks
//! on I/O, and completes in one pass: snapshot, match, substitute,
//! classify, cache, augment, commit.

pub mod context;

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::common::error::PipelineError;
use crate::common::types::{DecodedMessage, PlayerRef};
use crate::protocol::{copy_packet, PacketFactory, PacketView};
use crate::rule::{escape_pattern, placeholder};
use crate::surface::Surface;
use crate::text::{color, component};

pub use context::{
    AllowAll, DenyAll, PermissionOracle, PipelineContext, PipelineContextBuilder, RewriteEntry,
};

/// An outbound packet on its way to one player.
///
/// The host builds one per delivery, calls [`RewritePipeline::process`] and
/// then ships `packet` unless `cancelled` was set.
pub struct PacketEvent {
    pub player: PlayerRef,
    pub packet: Box<dyn PacketView>,
    pub cancelled: bool,
}

impl PacketEvent {
    pub fn new(player: PlayerRef, packet: Box<dyn PacketView>) -> Self {
        Self {
            player,
            packet,
            cancelled: false,
        }
    }
}

/// Deterministic identifier correlating a displayed message with a later
/// edit request.
///
/// Surface code plus a truncated digest: stable for identical `(surface,
/// text)` pairs and free of characters that would break command
/// tokenization.
pub fn message_id(surface: Surface, text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let hex: String = digest
        .iter()
        .take(10)
        .map(|byte| format!("{:02x}", byte))
        .collect();
    format!("{}{}", surface.id(), hex)
}

/// The packet-content rewrite pipeline.
pub struct RewritePipeline {
    context: Arc<PipelineContext>,
    factory: Box<dyn PacketFactory>,
}

impl RewritePipeline {
    pub fn new(context: Arc<PipelineContext>, factory: Box<dyn PacketFactory>) -> Self {
        Self { context, factory }
    }

    pub fn context(&self) -> &Arc<PipelineContext> {
        &self.context
    }

    /// Inspect one outbound packet and rewrite, retarget or cancel it.
    ///
    /// Packets that carry no rewritable text pass through untouched. An
    /// `Err` is fatal for this packet only; the caller forwards the
    /// original and carries on.
    pub fn process(&self, event: &mut PacketEvent) -> Result<(), PipelineError> {
        if event.cancelled {
            return Ok(());
        }
        let ctx = self.context.as_ref();

        // Work on a fresh copy so early returns never leak partial edits.
        let mut packet = self.factory.create(event.packet.kind());
        copy_packet(event.packet.as_ref(), packet.as_mut())?;

        let Some(original_surface) = Surface::from_packet(packet.as_ref()) else {
            return Ok(());
        };
        if !original_surface.supported(ctx.settings().protocol_version) {
            return Ok(());
        }
        let mut surface = original_surface;

        let Some(original_text) = original_surface.extract_text(packet.as_ref())? else {
            return Ok(());
        };
        let mut text = original_text.clone();

        if let Some(cached) = ctx.rewrite_cached(&text) {
            retarget(&mut surface, cached.rule.destination());
            if cached.text.is_empty() && surface.is_chat_family() {
                event.cancelled = true;
                return Ok(());
            }
            text = cached.text;
        } else {
            let rules = ctx.rules();
            let matched = rules
                .iter()
                .find_map(|rule| rule.rewrite(surface, &text).map(|raw| (Arc::clone(rule), raw)));
            if let Some((rule, raw)) = matched {
                let after = color::translate_ampersand(&raw);
                let after = placeholder::expand_all(ctx.expanders(), &event.player, after);
                ctx.cache_rewrite(
                    text.clone(),
                    RewriteEntry {
                        rule: Arc::clone(&rule),
                        text: after.clone(),
                    },
                );
                retarget(&mut surface, rule.destination());
                if after.is_empty() && surface.is_chat_family() {
                    event.cancelled = true;
                    return Ok(());
                }
                text = after;
            }
        }

        // A successful structured parse is the format discriminator, not an
        // error signal.
        let mut structured = serde_json::from_str::<serde_json::Value>(&text).is_ok();

        let id = message_id(surface, &text);
        ctx.cache_message(
            id.clone(),
            DecodedMessage::new(surface, text.clone(), structured),
        );

        if ctx.is_analyzed(surface) {
            log_analysis(surface, &event.player, &text, structured, &id);
        }

        if matches!(surface, Surface::PrimaryChat | Surface::SystemChat)
            && ctx.settings().attach_edit_affordances
            && ctx.permissions().can_edit(&event.player)
        {
            let command = format!("{} {}", ctx.settings().edit_command, id);
            match augment(&text, structured, &command) {
                Ok(Some(augmented)) => {
                    text = augmented;
                    structured = true;
                }
                Ok(None) => {}
                Err(e) => debug!("Skipping edit affordances: {}", e),
            }
        }

        if surface != original_surface {
            surface.write_chat_position(packet.as_mut())?;
        }
        if text != original_text {
            surface.write_text(packet.as_mut(), &text, structured)?;
        }
        if text != original_text || surface != original_surface {
            event.packet = packet;
        }
        Ok(())
    }
}

/// Apply a rule's destination override. Only chat-family surfaces may move,
/// and only to another chat-family surface.
fn retarget(surface: &mut Surface, destination: Option<Surface>) {
    if !surface.is_chat_family() {
        return;
    }
    if let Some(destination) = destination {
        if destination.is_chat_family() {
            *surface = destination;
        }
    }
}

/// Attach hover/click edit affordances to every top-level segment.
///
/// Returns the re-serialized message, or `None` when there is nothing to
/// attach to.
fn augment(
    text: &str,
    structured: bool,
    command: &str,
) -> Result<Option<String>, serde_json::Error> {
    let mut segments = if structured {
        component::parse_components(text)?
    } else {
        component::from_legacy(text)
    };
    if segments.is_empty() {
        return Ok(None);
    }
    component::attach_edit_events(&mut segments, command);
    Ok(Some(component::serialize_components(&segments)?))
}

fn log_analysis(surface: Surface, player: &PlayerRef, text: &str, structured: bool, id: &str) {
    info!(
        "Surface: {} ({})",
        surface.friendly_name(),
        surface.id()
    );
    info!("Player: {}", player.name);
    if structured {
        let plain: String = component::parse_components(text)
            .map(|segments| {
                segments
                    .iter()
                    .map(|segment| segment.plain_text())
                    .collect()
            })
            .unwrap_or_default();
        info!("Message JSON: '{}'", escape_pattern(text));
        info!("Message clear: '{}'", plain);
    } else {
        let suffix = if color::contains_codes(text) {
            " (colors shown with & in place of the section sign)"
        } else {
            ""
        };
        info!("Message: '{}'{}", color::to_ampersand(text), suffix);
        info!("Message clear: '{}'", color::strip_codes(text));
    }
    info!("Message ID: '{}'", id);
}
