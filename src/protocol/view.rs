//! The packet field-slot contract and the per-kind copy schema.

use std::any::Any;

use uuid::Uuid;

use crate::common::error::FieldError;

/// The outbound packet kinds that can carry player-visible text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PacketKind {
    /// Chat line, system message or action bar (discriminated by position).
    Chat,
    /// Boss bar add/update.
    BossBar,
    /// Scoreboard objective create/update/delete.
    ScoreboardObjective,
    /// Scoreboard score set/remove.
    ScoreboardScore,
    /// Disconnect during login.
    LoginDisconnect,
    /// Kick while in play.
    PlayDisconnect,
}

/// Categories of typed field slots a packet can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldCategory {
    Int,
    Byte,
    Bool,
    Float,
    String,
    /// Structured text payload, stored as its raw serialized form.
    Component,
    /// Enum field, addressed by ordinal.
    Enum,
    Uuid,
}

/// Typed access to a packet's field slots.
///
/// Implementations index slots per category in wire order. Reading or
/// writing a slot the packet does not carry returns [`FieldError::Missing`];
/// the schema never guesses.
pub trait PacketView: Send {
    fn kind(&self) -> PacketKind;

    /// Number of slots the packet exposes for a category.
    ///
    /// Layout variants (older and newer packet revisions) are detected by
    /// slot count, never by protocol-version switches in the core.
    fn slot_count(&self, category: FieldCategory) -> usize;

    fn get_int(&self, index: usize) -> Result<i32, FieldError>;
    fn set_int(&mut self, index: usize, value: i32) -> Result<(), FieldError>;

    fn get_byte(&self, index: usize) -> Result<u8, FieldError>;
    fn set_byte(&mut self, index: usize, value: u8) -> Result<(), FieldError>;

    fn get_bool(&self, index: usize) -> Result<bool, FieldError>;
    fn set_bool(&mut self, index: usize, value: bool) -> Result<(), FieldError>;

    fn get_float(&self, index: usize) -> Result<f32, FieldError>;
    fn set_float(&mut self, index: usize, value: f32) -> Result<(), FieldError>;

    fn get_string(&self, index: usize) -> Result<String, FieldError>;
    fn set_string(&mut self, index: usize, value: String) -> Result<(), FieldError>;

    fn get_component(&self, index: usize) -> Result<String, FieldError>;
    fn set_component(&mut self, index: usize, value: String) -> Result<(), FieldError>;

    fn get_enum(&self, index: usize) -> Result<u32, FieldError>;
    fn set_enum(&mut self, index: usize, value: u32) -> Result<(), FieldError>;

    fn get_uuid(&self, index: usize) -> Result<Uuid, FieldError>;
    fn set_uuid(&mut self, index: usize, value: Uuid) -> Result<(), FieldError>;

    /// Downcast hook for host adapters and tests.
    fn as_any(&self) -> &dyn Any;
}

/// Creates fresh packet instances for the working copies the pipeline edits.
pub trait PacketFactory: Send + Sync {
    fn create(&self, kind: PacketKind) -> Box<dyn PacketView>;
}

/// Copy every relevant field of `src` into `dst`, slot by slot.
///
/// The pipeline edits a fresh copy so that an early return never leaks a
/// partially edited packet back to the host. A slot the schema expects but
/// the packet lacks fails the whole copy.
pub fn copy_packet(src: &dyn PacketView, dst: &mut dyn PacketView) -> Result<(), FieldError> {
    if src.kind() != dst.kind() {
        return Err(FieldError::KindMismatch {
            from: src.kind(),
            into: dst.kind(),
        });
    }
    match src.kind() {
        PacketKind::LoginDisconnect | PacketKind::PlayDisconnect => {
            dst.set_component(0, src.get_component(0)?)?;
        }
        PacketKind::Chat => {
            dst.set_component(0, src.get_component(0)?)?;
            // Newer layouts carry the position as a single byte slot;
            // older ones use a chat-type enum.
            if src.slot_count(FieldCategory::Byte) == 1 {
                dst.set_byte(0, src.get_byte(0)?)?;
            } else {
                dst.set_enum(0, src.get_enum(0)?)?;
            }
            if src.slot_count(FieldCategory::Uuid) == 1 {
                dst.set_uuid(0, src.get_uuid(0)?)?;
            }
        }
        PacketKind::BossBar => {
            dst.set_uuid(0, src.get_uuid(0)?)?;
            dst.set_component(0, src.get_component(0)?)?;
            dst.set_enum(0, src.get_enum(0)?)?;
            dst.set_enum(1, src.get_enum(1)?)?;
            dst.set_enum(2, src.get_enum(2)?)?;
            dst.set_float(0, src.get_float(0)?)?;
            dst.set_bool(0, src.get_bool(0)?)?;
            dst.set_bool(1, src.get_bool(1)?)?;
            dst.set_bool(2, src.get_bool(2)?)?;
        }
        PacketKind::ScoreboardObjective => {
            let action = src.get_int(0)?;
            dst.set_string(0, src.get_string(0)?)?;
            if src.slot_count(FieldCategory::String) == 2 {
                dst.set_string(1, src.get_string(1)?)?;
            } else {
                dst.set_component(0, src.get_component(0)?)?;
            }
            // Delete packets may omit the health display slot entirely.
            if action != 1 {
                dst.set_enum(0, src.get_enum(0)?)?;
            }
            dst.set_int(0, action)?;
        }
        PacketKind::ScoreboardScore => {
            dst.set_string(0, src.get_string(0)?)?;
            dst.set_string(1, src.get_string(1)?)?;
            dst.set_int(0, src.get_int(0)?)?;
            dst.set_enum(0, src.get_enum(0)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::slots::{SlotFactory, SlotLayout};
    use crate::surface::{boss_bar_action, score_action};

    #[test]
    fn test_copy_chat_modern_layout() {
        let factory = SlotFactory::new(SlotLayout::Modern);
        let mut src = factory.create(PacketKind::Chat);
        src.set_component(0, r#"{"text":"hi"}"#.to_string()).unwrap();
        src.set_byte(0, 1).unwrap();
        let sender = Uuid::new_v4();
        src.set_uuid(0, sender).unwrap();

        let mut dst = factory.create(PacketKind::Chat);
        copy_packet(&*src, &mut *dst).unwrap();

        assert_eq!(dst.get_component(0).unwrap(), r#"{"text":"hi"}"#);
        assert_eq!(dst.get_byte(0).unwrap(), 1);
        assert_eq!(dst.get_uuid(0).unwrap(), sender);
    }

    #[test]
    fn test_copy_chat_legacy_layout_uses_enum() {
        let factory = SlotFactory::new(SlotLayout::Legacy);
        let mut src = factory.create(PacketKind::Chat);
        src.set_component(0, r#"{"text":"hi"}"#.to_string()).unwrap();
        src.set_enum(0, 2).unwrap();

        let mut dst = factory.create(PacketKind::Chat);
        copy_packet(&*src, &mut *dst).unwrap();
        assert_eq!(dst.get_enum(0).unwrap(), 2);
    }

    #[test]
    fn test_copy_boss_bar_preserves_all_fields() {
        let factory = SlotFactory::new(SlotLayout::Modern);
        let mut src = factory.create(PacketKind::BossBar);
        let bar = Uuid::new_v4();
        src.set_uuid(0, bar).unwrap();
        src.set_component(0, r#"{"text":"Dragon"}"#.to_string())
            .unwrap();
        src.set_enum(0, boss_bar_action::UPDATE_NAME).unwrap();
        src.set_enum(1, 4).unwrap();
        src.set_enum(2, 1).unwrap();
        src.set_float(0, 0.5).unwrap();
        src.set_bool(0, true).unwrap();
        src.set_bool(1, false).unwrap();
        src.set_bool(2, true).unwrap();

        let mut dst = factory.create(PacketKind::BossBar);
        copy_packet(&*src, &mut *dst).unwrap();

        assert_eq!(dst.get_uuid(0).unwrap(), bar);
        assert_eq!(dst.get_enum(1).unwrap(), 4);
        assert_eq!(dst.get_enum(2).unwrap(), 1);
        assert_eq!(dst.get_float(0).unwrap(), 0.5);
        assert!(dst.get_bool(0).unwrap());
        assert!(!dst.get_bool(1).unwrap());
        assert!(dst.get_bool(2).unwrap());
    }

    #[test]
    fn test_copy_objective_delete_skips_health_display() {
        use crate::protocol::slots::{SlotCounts, SlotPacket};

        // Delete packets may lack the health display enum slot entirely.
        let mut src = SlotPacket::new(
            PacketKind::ScoreboardObjective,
            SlotCounts {
                strings: 1,
                components: 1,
                ints: 1,
                enums: 0,
                ..SlotCounts::default()
            },
        );
        src.set_string(0, "sidebar".to_string()).unwrap();
        src.set_component(0, r#"{"text":"Stats"}"#.to_string())
            .unwrap();
        src.set_int(0, 1).unwrap();

        let factory = SlotFactory::new(SlotLayout::Modern);
        let mut dst = factory.create(PacketKind::ScoreboardObjective);
        copy_packet(&src, &mut *dst).unwrap();
        assert_eq!(dst.get_int(0).unwrap(), 1);

        // The same packet with a non-delete action fails the copy.
        src.set_int(0, 0).unwrap();
        let mut dst = factory.create(PacketKind::ScoreboardObjective);
        assert!(matches!(
            copy_packet(&src, &mut *dst),
            Err(FieldError::Missing { .. })
        ));
    }

    #[test]
    fn test_copy_score_packet() {
        let factory = SlotFactory::new(SlotLayout::Modern);
        let mut src = factory.create(PacketKind::ScoreboardScore);
        src.set_string(0, "Steve".to_string()).unwrap();
        src.set_string(1, "kills".to_string()).unwrap();
        src.set_int(0, 7).unwrap();
        src.set_enum(0, score_action::CHANGE).unwrap();

        let mut dst = factory.create(PacketKind::ScoreboardScore);
        copy_packet(&*src, &mut *dst).unwrap();
        assert_eq!(dst.get_string(0).unwrap(), "Steve");
        assert_eq!(dst.get_string(1).unwrap(), "kills");
        assert_eq!(dst.get_int(0).unwrap(), 7);
    }

    #[test]
    fn test_copy_kind_mismatch_fails() {
        let factory = SlotFactory::new(SlotLayout::Modern);
        let src = factory.create(PacketKind::Chat);
        let mut dst = factory.create(PacketKind::BossBar);
        assert!(matches!(
            copy_packet(&*src, &mut *dst),
            Err(FieldError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_missing_slot_fails_loudly() {
        let factory = SlotFactory::new(SlotLayout::Modern);
        let packet = factory.create(PacketKind::Chat);
        assert!(matches!(
            packet.get_string(0),
            Err(FieldError::Missing { .. })
        ));
    }
}
