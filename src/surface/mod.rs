//! Message surfaces: the on-screen locations a packet's text renders to.

use crate::common::error::FieldError;
use crate::protocol::{FieldCategory, PacketKind, PacketView};
use crate::text::component;

/// Chat packet position values.
pub mod chat_position {
    pub const CHAT: u8 = 0;
    pub const SYSTEM: u8 = 1;
    pub const ACTION_BAR: u8 = 2;
}

/// Boss bar packet actions.
pub mod boss_bar_action {
    pub const ADD: u32 = 0;
    pub const REMOVE: u32 = 1;
    pub const UPDATE_HEALTH: u32 = 2;
    pub const UPDATE_NAME: u32 = 3;
    pub const UPDATE_STYLE: u32 = 4;
    pub const UPDATE_FLAGS: u32 = 5;
}

/// Scoreboard objective packet actions.
pub mod objective_action {
    pub const CREATE: i32 = 0;
    pub const REMOVE: i32 = 1;
    pub const UPDATE_DISPLAY_NAME: i32 = 2;
}

/// Scoreboard score packet actions.
pub mod score_action {
    pub const CHANGE: u32 = 0;
    pub const REMOVE: u32 = 1;
}

/// A distinct location where the client renders server-sent text.
///
/// Every decodable packet maps to exactly one surface or is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    PrimaryChat,
    SystemChat,
    ActionBar,
    BossBarTitle,
    ScoreboardTitle,
    ScoreboardEntry,
    LoginDisconnect,
    PlayDisconnect,
}

impl Surface {
    pub const ALL: [Surface; 8] = [
        Surface::PrimaryChat,
        Surface::SystemChat,
        Surface::ActionBar,
        Surface::BossBarTitle,
        Surface::ScoreboardTitle,
        Surface::ScoreboardEntry,
        Surface::LoginDisconnect,
        Surface::PlayDisconnect,
    ];

    /// Short stable code used inside message identifiers.
    pub fn id(&self) -> &'static str {
        match self {
            Surface::PrimaryChat => "PC",
            Surface::SystemChat => "SC",
            Surface::ActionBar => "AB",
            Surface::BossBarTitle => "BB",
            Surface::ScoreboardTitle => "ST",
            Surface::ScoreboardEntry => "SE",
            Surface::LoginDisconnect => "LD",
            Surface::PlayDisconnect => "PD",
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        match self {
            Surface::PrimaryChat => "Primary Chat",
            Surface::SystemChat => "System Chat",
            Surface::ActionBar => "Action Bar",
            Surface::BossBarTitle => "Boss Bar Title",
            Surface::ScoreboardTitle => "Scoreboard Title",
            Surface::ScoreboardEntry => "Scoreboard Entry",
            Surface::LoginDisconnect => "Login Disconnect",
            Surface::PlayDisconnect => "Play Disconnect",
        }
    }

    /// Minimum protocol version on which the client renders this surface.
    pub fn minimum_protocol_version(&self) -> u32 {
        match self {
            Surface::ActionBar => 47,
            Surface::BossBarTitle => 107,
            _ => 4,
        }
    }

    /// The lowest protocol version any surface supports.
    pub fn minimum_required() -> u32 {
        Self::ALL
            .iter()
            .map(Surface::minimum_protocol_version)
            .min()
            .unwrap_or(0)
    }

    pub fn supported(&self, protocol_version: u32) -> bool {
        protocol_version >= self.minimum_protocol_version()
    }

    /// Chat-family surfaces share the chat packet and may be retargeted
    /// between each other by a rule's destination override.
    pub fn is_chat_family(&self) -> bool {
        matches!(
            self,
            Surface::PrimaryChat | Surface::SystemChat | Surface::ActionBar
        )
    }

    /// Chat packet position value, for chat-family surfaces.
    pub fn chat_position(&self) -> Option<u8> {
        match self {
            Surface::PrimaryChat => Some(chat_position::CHAT),
            Surface::SystemChat => Some(chat_position::SYSTEM),
            Surface::ActionBar => Some(chat_position::ACTION_BAR),
            _ => None,
        }
    }

    /// Resolve a user-supplied surface name (enum name, friendly name or
    /// id, case- and separator-insensitive).
    pub fn from_name(name: &str) -> Option<Surface> {
        let normalized: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        Self::ALL.into_iter().find(|surface| {
            let friendly: String = surface
                .friendly_name()
                .chars()
                .filter(|c| *c != ' ')
                .collect::<String>()
                .to_lowercase();
            normalized == friendly || normalized == surface.id().to_lowercase()
        })
    }

    /// Identify the surface a packet renders to, if any.
    ///
    /// Returns `None` for unrecognized discriminator values; ambiguity is
    /// a pass-through, never an error.
    pub fn from_packet(packet: &dyn PacketView) -> Option<Surface> {
        match packet.kind() {
            PacketKind::Chat => {
                let position = if packet.slot_count(FieldCategory::Byte) == 1 {
                    packet.get_byte(0).ok()?
                } else {
                    u8::try_from(packet.get_enum(0).ok()?).ok()?
                };
                match position {
                    chat_position::CHAT => Some(Surface::PrimaryChat),
                    chat_position::SYSTEM => Some(Surface::SystemChat),
                    chat_position::ACTION_BAR => Some(Surface::ActionBar),
                    _ => None,
                }
            }
            PacketKind::BossBar => Some(Surface::BossBarTitle),
            PacketKind::ScoreboardObjective => Some(Surface::ScoreboardTitle),
            PacketKind::ScoreboardScore => Some(Surface::ScoreboardEntry),
            PacketKind::LoginDisconnect => Some(Surface::LoginDisconnect),
            PacketKind::PlayDisconnect => Some(Surface::PlayDisconnect),
        }
    }

    /// Extract the surface's text from a packet.
    ///
    /// `Ok(None)` means "do not rewrite": the packet's action is
    /// destructive or irrelevant, or it carries no text.
    pub fn extract_text(&self, packet: &dyn PacketView) -> Result<Option<String>, FieldError> {
        match self {
            Surface::PrimaryChat
            | Surface::SystemChat
            | Surface::ActionBar
            | Surface::LoginDisconnect
            | Surface::PlayDisconnect => {
                let text = packet.get_component(0)?;
                Ok(if text.is_empty() { None } else { Some(text) })
            }
            Surface::BossBarTitle => {
                let action = packet.get_enum(0)?;
                if action != boss_bar_action::ADD && action != boss_bar_action::UPDATE_NAME {
                    return Ok(None);
                }
                let text = packet.get_component(0)?;
                Ok(if text.is_empty() { None } else { Some(text) })
            }
            Surface::ScoreboardTitle => {
                let action = packet.get_int(0)?;
                if action != objective_action::CREATE
                    && action != objective_action::UPDATE_DISPLAY_NAME
                {
                    return Ok(None);
                }
                let text = if packet.slot_count(FieldCategory::String) == 2 {
                    packet.get_string(1)?
                } else {
                    packet.get_component(0)?
                };
                Ok(if text.is_empty() { None } else { Some(text) })
            }
            Surface::ScoreboardEntry => {
                if packet.get_enum(0)? == score_action::REMOVE {
                    return Ok(None);
                }
                let text = packet.get_string(0)?;
                Ok(if text.is_empty() { None } else { Some(text) })
            }
        }
    }

    /// Write text back into a packet.
    ///
    /// Component slots always carry structured text on the wire, so legacy
    /// text is converted before the write. String slots take the text as
    /// is. All other fields are untouched.
    pub fn write_text(
        &self,
        packet: &mut dyn PacketView,
        text: &str,
        structured: bool,
    ) -> Result<(), FieldError> {
        let kind = packet.kind();
        match self {
            Surface::PrimaryChat
            | Surface::SystemChat
            | Surface::ActionBar
            | Surface::LoginDisconnect
            | Surface::PlayDisconnect
            | Surface::BossBarTitle => {
                packet.set_component(0, encode_component_text(kind, text, structured)?)
            }
            Surface::ScoreboardTitle => {
                if packet.slot_count(FieldCategory::String) == 2 {
                    packet.set_string(1, text.to_string())
                } else {
                    packet.set_component(0, encode_component_text(kind, text, structured)?)
                }
            }
            Surface::ScoreboardEntry => packet.set_string(0, text.to_string()),
        }
    }

    /// Rewrite the chat packet's position discriminator to this surface.
    pub fn write_chat_position(&self, packet: &mut dyn PacketView) -> Result<(), FieldError> {
        let Some(position) = self.chat_position() else {
            return Ok(());
        };
        if packet.slot_count(FieldCategory::Byte) == 1 {
            packet.set_byte(0, position)
        } else {
            packet.set_enum(0, u32::from(position))
        }
    }
}

fn encode_component_text(
    kind: PacketKind,
    text: &str,
    structured: bool,
) -> Result<String, FieldError> {
    if structured {
        return Ok(text.to_string());
    }
    let segments = component::from_legacy(text);
    component::serialize_components(&segments).map_err(|e| FieldError::Encode {
        kind,
        message: e.to_string(),
    })
}
