//! In-memory reference implementation of the field-slot contract.
//!
//! `SlotPacket` backs every slot category with a plain vector. Hosts use it
//! as the template for their protocol-library adapter; the crate's tests use
//! it directly.

use std::any::Any;

use uuid::Uuid;

use crate::common::error::FieldError;
use crate::protocol::view::{FieldCategory, PacketFactory, PacketKind, PacketView};

/// Slot counts per category for one packet instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotCounts {
    pub ints: usize,
    pub bytes: usize,
    pub bools: usize,
    pub floats: usize,
    pub strings: usize,
    pub components: usize,
    pub enums: usize,
    pub uuids: usize,
}

/// Which revision of the packet schema to emulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotLayout {
    /// Chat position as a byte slot, objective display name as a component.
    Modern,
    /// Chat type as an enum slot, objective display name as a second string.
    Legacy,
}

/// A packet backed by in-memory slot vectors.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotPacket {
    kind: PacketKind,
    ints: Vec<i32>,
    bytes: Vec<u8>,
    bools: Vec<bool>,
    floats: Vec<f32>,
    strings: Vec<String>,
    components: Vec<String>,
    enums: Vec<u32>,
    uuids: Vec<Uuid>,
}

impl SlotPacket {
    /// Create a packet with the given slot shape, all slots default-valued.
    pub fn new(kind: PacketKind, counts: SlotCounts) -> Self {
        Self {
            kind,
            ints: vec![0; counts.ints],
            bytes: vec![0; counts.bytes],
            bools: vec![false; counts.bools],
            floats: vec![0.0; counts.floats],
            strings: vec![String::new(); counts.strings],
            components: vec![String::new(); counts.components],
            enums: vec![0; counts.enums],
            uuids: vec![Uuid::nil(); counts.uuids],
        }
    }

    fn missing(&self, category: FieldCategory, index: usize) -> FieldError {
        FieldError::Missing {
            kind: self.kind,
            category,
            index,
        }
    }

    fn get<T: Copy>(
        &self,
        slots: &[T],
        category: FieldCategory,
        index: usize,
    ) -> Result<T, FieldError> {
        slots
            .get(index)
            .copied()
            .ok_or_else(|| self.missing(category, index))
    }
}

macro_rules! set_slot {
    ($self:ident, $field:ident, $category:expr, $index:expr, $value:expr) => {{
        let missing = $self.missing($category, $index);
        match $self.$field.get_mut($index) {
            Some(slot) => {
                *slot = $value;
                Ok(())
            }
            None => Err(missing),
        }
    }};
}

impl PacketView for SlotPacket {
    fn kind(&self) -> PacketKind {
        self.kind
    }

    fn slot_count(&self, category: FieldCategory) -> usize {
        match category {
            FieldCategory::Int => self.ints.len(),
            FieldCategory::Byte => self.bytes.len(),
            FieldCategory::Bool => self.bools.len(),
            FieldCategory::Float => self.floats.len(),
            FieldCategory::String => self.strings.len(),
            FieldCategory::Component => self.components.len(),
            FieldCategory::Enum => self.enums.len(),
            FieldCategory::Uuid => self.uuids.len(),
        }
    }

    fn get_int(&self, index: usize) -> Result<i32, FieldError> {
        self.get(&self.ints, FieldCategory::Int, index)
    }

    fn set_int(&mut self, index: usize, value: i32) -> Result<(), FieldError> {
        set_slot!(self, ints, FieldCategory::Int, index, value)
    }

    fn get_byte(&self, index: usize) -> Result<u8, FieldError> {
        self.get(&self.bytes, FieldCategory::Byte, index)
    }

    fn set_byte(&mut self, index: usize, value: u8) -> Result<(), FieldError> {
        set_slot!(self, bytes, FieldCategory::Byte, index, value)
    }

    fn get_bool(&self, index: usize) -> Result<bool, FieldError> {
        self.get(&self.bools, FieldCategory::Bool, index)
    }

    fn set_bool(&mut self, index: usize, value: bool) -> Result<(), FieldError> {
        set_slot!(self, bools, FieldCategory::Bool, index, value)
    }

    fn get_float(&self, index: usize) -> Result<f32, FieldError> {
        self.get(&self.floats, FieldCategory::Float, index)
    }

    fn set_float(&mut self, index: usize, value: f32) -> Result<(), FieldError> {
        set_slot!(self, floats, FieldCategory::Float, index, value)
    }

    fn get_string(&self, index: usize) -> Result<String, FieldError> {
        self.strings
            .get(index)
            .cloned()
            .ok_or_else(|| self.missing(FieldCategory::String, index))
    }

    fn set_string(&mut self, index: usize, value: String) -> Result<(), FieldError> {
        set_slot!(self, strings, FieldCategory::String, index, value)
    }

    fn get_component(&self, index: usize) -> Result<String, FieldError> {
        self.components
            .get(index)
            .cloned()
            .ok_or_else(|| self.missing(FieldCategory::Component, index))
    }

    fn set_component(&mut self, index: usize, value: String) -> Result<(), FieldError> {
        set_slot!(self, components, FieldCategory::Component, index, value)
    }

    fn get_enum(&self, index: usize) -> Result<u32, FieldError> {
        self.get(&self.enums, FieldCategory::Enum, index)
    }

    fn set_enum(&mut self, index: usize, value: u32) -> Result<(), FieldError> {
        set_slot!(self, enums, FieldCategory::Enum, index, value)
    }

    fn get_uuid(&self, index: usize) -> Result<Uuid, FieldError> {
        self.get(&self.uuids, FieldCategory::Uuid, index)
    }

    fn set_uuid(&mut self, index: usize, value: Uuid) -> Result<(), FieldError> {
        set_slot!(self, uuids, FieldCategory::Uuid, index, value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Factory producing `SlotPacket`s shaped for a schema revision.
#[derive(Debug, Clone, Copy)]
pub struct SlotFactory {
    layout: SlotLayout,
}

impl SlotFactory {
    pub fn new(layout: SlotLayout) -> Self {
        Self { layout }
    }

    /// The slot shape for a packet kind under this layout.
    pub fn counts(&self, kind: PacketKind) -> SlotCounts {
        match kind {
            PacketKind::LoginDisconnect | PacketKind::PlayDisconnect => SlotCounts {
                components: 1,
                ..SlotCounts::default()
            },
            PacketKind::Chat => match self.layout {
                SlotLayout::Modern => SlotCounts {
                    components: 1,
                    bytes: 1,
                    uuids: 1,
                    ..SlotCounts::default()
                },
                SlotLayout::Legacy => SlotCounts {
                    components: 1,
                    enums: 1,
                    ..SlotCounts::default()
                },
            },
            PacketKind::BossBar => SlotCounts {
                uuids: 1,
                components: 1,
                enums: 3,
                floats: 1,
                bools: 3,
                ..SlotCounts::default()
            },
            PacketKind::ScoreboardObjective => match self.layout {
                SlotLayout::Modern => SlotCounts {
                    strings: 1,
                    components: 1,
                    ints: 1,
                    enums: 1,
                    ..SlotCounts::default()
                },
                SlotLayout::Legacy => SlotCounts {
                    strings: 2,
                    ints: 1,
                    enums: 1,
                    ..SlotCounts::default()
                },
            },
            PacketKind::ScoreboardScore => SlotCounts {
                strings: 2,
                ints: 1,
                enums: 1,
                ..SlotCounts::default()
            },
        }
    }
}

impl PacketFactory for SlotFactory {
    fn create(&self, kind: PacketKind) -> Box<dyn PacketView> {
        Box::new(SlotPacket::new(kind, self.counts(kind)))
    }
}
