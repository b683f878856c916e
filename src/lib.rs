//! Scribe - real-time rewrite layer for player-visible game server messages.
//!
//! Intercepts outbound packets that carry text (chat lines, boss bar
//! titles, scoreboard titles and entries, disconnect reasons), matches
//! their content against configured pattern rules, and rewrites, relocates
//! or suppresses the message before it reaches the network layer. Players
//! with the edit capability can author new rules in-game through a
//! chat-driven session started from a clickable message affordance.
//!
//! The host embeds the crate: it adapts its protocol library behind
//! [`protocol::PacketView`]/[`protocol::PacketFactory`], builds a
//! [`pipeline::PipelineContext`] at startup, and calls
//! [`pipeline::RewritePipeline::process`] from its packet-delivery path.
//! Inbound chat is offered to [`session::SessionTable`] first; consumed
//! lines drive rule authoring.

pub mod cache;
pub mod common;
pub mod config;
pub mod pipeline;
pub mod protocol;
pub mod rule;
pub mod session;
pub mod surface;
pub mod text;

pub use common::{ConfigError, DecodedMessage, FieldError, PipelineError, PlayerRef, SessionError};
pub use config::{JsonRuleStore, MemoryRuleStore, RuleConfig, RuleStore, Settings};
pub use pipeline::{
    message_id, AllowAll, DenyAll, PacketEvent, PermissionOracle, PipelineContext,
    RewritePipeline,
};
pub use rule::placeholder::PlaceholderExpander;
pub use rule::EditRule;
pub use session::{SessionOutcome, SessionTable};
pub use surface::Surface;
