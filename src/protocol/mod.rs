//! Typed packet field access.
//!
//! The rewrite layer never touches wire bytes. Every packet is reached
//! through [`PacketView`], a fixed schema of typed field slots per packet
//! kind, implemented by an adapter over the host's protocol library.

pub mod slots;
pub mod view;

pub use slots::{SlotCounts, SlotFactory, SlotLayout, SlotPacket};
pub use view::{copy_packet, FieldCategory, PacketFactory, PacketKind, PacketView};
