//! Error types for the rewrite layer.

use thiserror::Error;

use crate::protocol::{FieldCategory, PacketKind};

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read rule file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse rule file: {message}")]
    Parse { message: String },

    #[error("Rule validation failed: {message}")]
    Validation { message: String },
}

/// Packet field access errors.
///
/// Field access fails loudly when a packet does not carry the slot the
/// schema expects; a silent partial write would desynchronize the client.
#[derive(Debug, Error)]
pub enum FieldError {
    #[error("{kind:?} packet has no {category:?} slot {index}")]
    Missing {
        kind: PacketKind,
        category: FieldCategory,
        index: usize,
    },

    #[error("Cannot copy {from:?} packet into {into:?} packet")]
    KindMismatch { from: PacketKind, into: PacketKind },

    #[error("Failed to encode text for {kind:?} packet: {message}")]
    Encode { kind: PacketKind, message: String },
}

/// Errors from the per-packet rewrite pipeline.
///
/// A pipeline error is fatal for that single packet only; the caller
/// forwards the original packet and keeps serving other connections.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No message surface supports protocol version {version} (minimum required: {required})")]
    ProtocolUnsupported { version: u32, required: u32 },

    #[error("Packet field access failed: {0}")]
    Field(#[from] FieldError),
}

/// Errors from the interactive edit session entry points.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No cached message with identifier '{id}'")]
    UnknownMessage { id: String },
}
