//! Interactive rule-authoring sessions.
//!
//! A session is a per-player state machine driven by that player's chat
//! lines. While one is active, the player's chat input is consumed as
//! session input instead of being delivered. Commit appends the finished
//! rule, persists it and invalidates the rewrite cache.

use dashmap::DashMap;
use tracing::warn;
use uuid::Uuid;

use crate::common::types::DecodedMessage;
use crate::pipeline::context::PipelineContext;
use crate::rule::{escape_pattern, EditRule};
use crate::surface::Surface;
use crate::text::{color, component};

/// Which prompt the session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Created but not yet prompted.
    Idle,
    /// Waiting for the fragment of the message the pattern targets.
    PatternKey,
    /// Waiting for the pattern itself.
    PatternValue,
    /// Waiting for the replacement text.
    Replacement,
    /// Waiting for the destination surface.
    DestinationSurface,
}

/// What a consumed chat line did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Input accepted; send this prompt next.
    Prompt(String),
    /// Input rejected; report the error and re-prompt.
    Rejected { error: String, prompt: String },
    /// The rule was created; the session is gone.
    Committed { summary: String },
    /// The session was cancelled; nothing was saved.
    Cancelled,
}

/// Mutable state of one player's rule-authoring workflow.
#[derive(Debug)]
pub struct EditSession {
    original_before: String,
    original_before_structured: bool,
    before_text: String,
    before_structured: bool,
    before_surface: Surface,
    /// Working pattern; starts as the whole message, escaped.
    pattern: String,
    /// Fragment of the message the pattern value replaces; empty targets
    /// the whole message.
    pattern_key: String,
    after_text: String,
    after_structured: bool,
    after_surface: Surface,
    /// Color-translated preview of the replacement.
    after_preview: String,
    mode: SessionMode,
    should_destroy: bool,
}

impl EditSession {
    fn new(message: &DecodedMessage) -> Self {
        Self {
            original_before: message.text.clone(),
            original_before_structured: message.structured,
            before_text: message.text.clone(),
            before_structured: message.structured,
            before_surface: message.surface,
            pattern: escape_pattern(&message.text),
            pattern_key: String::new(),
            after_text: message.text.clone(),
            after_structured: message.structured,
            after_surface: message.surface,
            after_preview: String::new(),
            mode: SessionMode::Idle,
            should_destroy: false,
        }
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn surface(&self) -> Surface {
        self.before_surface
    }

    pub fn original_text(&self) -> &str {
        &self.original_before
    }

    pub fn original_structured(&self) -> bool {
        self.original_before_structured
    }

    pub fn replacement_structured(&self) -> bool {
        self.after_structured
    }

    /// The message as the player saw it, without markup.
    fn display_text(&self) -> String {
        if self.before_structured {
            component::parse_components(&self.before_text)
                .map(|segments| {
                    segments
                        .iter()
                        .map(|segment| segment.plain_text())
                        .collect()
                })
                .unwrap_or_else(|_| self.before_text.clone())
        } else {
            color::strip_codes(&self.before_text)
        }
    }

    fn key_prompt(&self) -> String {
        format!(
            "Enter the part of the message to target, '-' to target the whole message, \
             or 'cancel' to stop. The message is: '{}'",
            self.display_text()
        )
    }

    fn value_prompt(&self) -> String {
        if self.pattern_key.is_empty() {
            "Enter the pattern to match the whole message (regular expression).".to_string()
        } else {
            format!(
                "Enter the pattern that replaces '{}' (regular expression).",
                self.pattern_key
            )
        }
    }

    fn replacement_prompt(&self) -> String {
        "Enter the replacement text, or '-' to keep the message unchanged. \
         An empty-looking replacement of \"\" suppresses chat messages."
            .to_string()
    }

    fn destination_prompt(&self) -> String {
        format!(
            "Enter the destination surface ({}), or '-' to keep {}.",
            surface_names(),
            self.after_surface.friendly_name()
        )
    }

    fn advance(&mut self, context: &PipelineContext, input: &str) -> SessionOutcome {
        match self.mode {
            SessionMode::Idle => {
                self.mode = SessionMode::PatternKey;
                SessionOutcome::Prompt(self.key_prompt())
            }
            SessionMode::PatternKey => {
                if input != "-" {
                    if !self.before_text.contains(input) {
                        return SessionOutcome::Rejected {
                            error: format!("The message does not contain '{}'.", input),
                            prompt: self.key_prompt(),
                        };
                    }
                    self.pattern_key = input.to_string();
                }
                self.mode = SessionMode::PatternValue;
                SessionOutcome::Prompt(self.value_prompt())
            }
            SessionMode::PatternValue => {
                if input.is_empty() {
                    return SessionOutcome::Rejected {
                        error: "The pattern cannot be empty.".to_string(),
                        prompt: self.value_prompt(),
                    };
                }
                let candidate = if self.pattern_key.is_empty() {
                    input.to_string()
                } else {
                    self.pattern
                        .replace(&escape_pattern(&self.pattern_key), input)
                };
                if let Err(e) = EditRule::new(&candidate, None, "", None) {
                    return SessionOutcome::Rejected {
                        error: format!("Invalid pattern: {}", e),
                        prompt: self.value_prompt(),
                    };
                }
                self.pattern = candidate;
                self.mode = SessionMode::Replacement;
                SessionOutcome::Prompt(self.replacement_prompt())
            }
            SessionMode::Replacement => {
                if input != "-" {
                    self.after_text = input.to_string();
                    self.after_structured =
                        serde_json::from_str::<serde_json::Value>(input).is_ok();
                    self.after_preview = color::translate_ampersand(input);
                }
                self.mode = SessionMode::DestinationSurface;
                SessionOutcome::Prompt(self.destination_prompt())
            }
            SessionMode::DestinationSurface => {
                if input != "-" {
                    match Surface::from_name(input) {
                        Some(surface) => self.after_surface = surface,
                        None => {
                            return SessionOutcome::Rejected {
                                error: format!(
                                    "Unknown surface '{}'. Valid surfaces: {}.",
                                    input,
                                    surface_names()
                                ),
                                prompt: self.destination_prompt(),
                            };
                        }
                    }
                }
                self.finalize(context)
            }
        }
    }

    /// Build the rule from the accumulated fields and install it.
    fn finalize(&mut self, context: &PipelineContext) -> SessionOutcome {
        let rule = match EditRule::new(
            &self.pattern,
            Some(self.before_surface),
            self.after_text.clone(),
            Some(self.after_surface),
        ) {
            Ok(rule) => rule,
            Err(e) => {
                self.mode = SessionMode::PatternValue;
                return SessionOutcome::Rejected {
                    error: format!("Invalid pattern: {}", e),
                    prompt: self.value_prompt(),
                };
            }
        };

        context.append_rule(rule);
        if let Err(e) = context.persist_rules() {
            warn!("Failed to persist edit rules: {}", e);
        }
        context.clear_rewrite_cache();
        self.should_destroy = true;

        let shown = if self.after_preview.is_empty() {
            &self.after_text
        } else {
            &self.after_preview
        };
        SessionOutcome::Committed {
            summary: format!(
                "Edit rule added: '{}' on {} now becomes '{}' on {}.",
                self.pattern,
                self.before_surface.friendly_name(),
                shown,
                self.after_surface.friendly_name()
            ),
        }
    }
}

fn surface_names() -> String {
    Surface::ALL
        .iter()
        .map(|surface| surface.friendly_name())
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_cancel(input: &str) -> bool {
    input.eq_ignore_ascii_case("c") || input.eq_ignore_ascii_case("cancel")
}

/// All live sessions, keyed by player identity.
///
/// One session per player; beginning a new one silently replaces the old.
/// Entries are bounded by connected players and removed on commit, cancel
/// and disconnect.
#[derive(Default)]
pub struct SessionTable {
    sessions: DashMap<Uuid, EditSession>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a session seeded from a decoded message and
    /// return the first prompt.
    pub fn begin(&self, player: Uuid, message: &DecodedMessage) -> String {
        let mut session = EditSession::new(message);
        session.mode = SessionMode::PatternKey;
        let prompt = format!(
            "Editing a {} message.\n{}",
            message.surface.friendly_name(),
            session.key_prompt()
        );
        self.sessions.insert(player, session);
        prompt
    }

    /// Consume one chat line from the player, if they have a session.
    ///
    /// `None` means no session is active: deliver the chat line normally.
    pub fn handle_chat(
        &self,
        context: &PipelineContext,
        player: Uuid,
        input: &str,
    ) -> Option<SessionOutcome> {
        let input = input.trim();
        let (outcome, destroy) = {
            let mut session = self.sessions.get_mut(&player)?;
            if is_cancel(input) {
                (SessionOutcome::Cancelled, true)
            } else {
                let outcome = session.advance(context, input);
                let destroy = session.should_destroy;
                (outcome, destroy)
            }
        };
        if destroy {
            self.sessions.remove(&player);
        }
        Some(outcome)
    }

    /// Drop a player's session. Returns whether one existed.
    pub fn end(&self, player: Uuid) -> bool {
        self.sessions.remove(&player).is_some()
    }

    pub fn is_active(&self, player: Uuid) -> bool {
        self.sessions.contains_key(&player)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::store::MemoryRuleStore;
    use crate::config::types::Settings;
    use crate::pipeline::context::RewriteEntry;

    fn context() -> Arc<PipelineContext> {
        PipelineContext::builder(Settings::default())
            .store(Box::new(MemoryRuleStore::default()))
            .build()
            .unwrap()
    }

    fn prompt(outcome: Option<SessionOutcome>) -> String {
        match outcome {
            Some(SessionOutcome::Prompt(prompt)) => prompt,
            other => panic!("expected a prompt, got {:?}", other),
        }
    }

    #[test]
    fn test_full_session_walkthrough() {
        let ctx = context();
        let player = Uuid::new_v4();
        let message = DecodedMessage::new(Surface::PrimaryChat, "Hello", false);

        // Seed the rewrite cache to observe the commit-time invalidation.
        let seeded = ctx.append_rule(EditRule::new("seed", None, "x", None).unwrap());
        ctx.cache_rewrite(
            "seed".to_string(),
            RewriteEntry {
                rule: seeded,
                text: "x".to_string(),
            },
        );

        let first = ctx.sessions().begin(player, &message);
        assert!(first.contains("Primary Chat"));
        assert!(ctx.sessions().is_active(player));

        prompt(ctx.handle_session_chat(player, "-"));
        prompt(ctx.handle_session_chat(player, "Hel+o"));
        prompt(ctx.handle_session_chat(player, "-"));
        let outcome = ctx.handle_session_chat(player, "-");
        assert!(matches!(outcome, Some(SessionOutcome::Committed { .. })));

        // Session destroyed, rule appended, rewrite cache invalidated.
        assert!(!ctx.sessions().is_active(player));
        assert!(ctx.rewrite_cached("seed").is_none());
        let rules = ctx.rules();
        let rule = rules.last().unwrap();
        assert_eq!(rule.pattern(), "Hel+o");
        assert_eq!(rule.replacement(), "Hello");
        assert_eq!(rule.source(), Some(Surface::PrimaryChat));
        assert_eq!(rule.destination(), Some(Surface::PrimaryChat));

        // And persisted through the store.
        let persisted = ctx.reload().unwrap();
        assert_eq!(persisted, 2);
    }

    #[test]
    fn test_pattern_key_fragment_flow() {
        let ctx = context();
        let player = Uuid::new_v4();
        let message = DecodedMessage::new(Surface::SystemChat, "Welcome Steve", false);
        ctx.sessions().begin(player, &message);

        prompt(ctx.handle_session_chat(player, "Steve"));
        prompt(ctx.handle_session_chat(player, "(\\w+)"));
        prompt(ctx.handle_session_chat(player, "Hi $1"));
        let outcome = ctx.handle_session_chat(player, "-");
        assert!(matches!(outcome, Some(SessionOutcome::Committed { .. })));

        let rules = ctx.rules();
        let rule = rules.last().unwrap();
        assert_eq!(rule.pattern(), "Welcome (\\w+)");
        assert_eq!(
            rule.rewrite(Surface::SystemChat, "Welcome Alex"),
            Some("Hi Alex".to_string())
        );
    }

    #[test]
    fn test_key_not_in_message_rejected() {
        let ctx = context();
        let player = Uuid::new_v4();
        ctx.sessions()
            .begin(player, &DecodedMessage::new(Surface::PrimaryChat, "Hello", false));

        let outcome = ctx.handle_session_chat(player, "Steve");
        assert!(matches!(
            outcome,
            Some(SessionOutcome::Rejected { .. })
        ));
        // Still waiting on the key.
        prompt(ctx.handle_session_chat(player, "-"));
    }

    #[test]
    fn test_invalid_pattern_keeps_state() {
        let ctx = context();
        let player = Uuid::new_v4();
        ctx.sessions()
            .begin(player, &DecodedMessage::new(Surface::PrimaryChat, "Hello", false));
        prompt(ctx.handle_session_chat(player, "-"));

        let outcome = ctx.handle_session_chat(player, "[oops");
        match outcome {
            Some(SessionOutcome::Rejected { error, .. }) => {
                assert!(error.contains("Invalid pattern"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        // Empty input is also rejected in this state.
        assert!(matches!(
            ctx.handle_session_chat(player, ""),
            Some(SessionOutcome::Rejected { .. })
        ));

        // A valid pattern finally advances.
        prompt(ctx.handle_session_chat(player, "Hello|Hi"));
    }

    #[test]
    fn test_invalid_destination_lists_surfaces() {
        let ctx = context();
        let player = Uuid::new_v4();
        ctx.sessions()
            .begin(player, &DecodedMessage::new(Surface::PrimaryChat, "Hello", false));
        prompt(ctx.handle_session_chat(player, "-"));
        prompt(ctx.handle_session_chat(player, "Hello"));
        prompt(ctx.handle_session_chat(player, "-"));

        let outcome = ctx.handle_session_chat(player, "hotbar");
        match outcome {
            Some(SessionOutcome::Rejected { error, .. }) => {
                assert!(error.contains("Action Bar"));
                assert!(error.contains("Boss Bar Title"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }

        let outcome = ctx.handle_session_chat(player, "action bar");
        assert!(matches!(outcome, Some(SessionOutcome::Committed { .. })));
        assert_eq!(
            ctx.rules().last().unwrap().destination(),
            Some(Surface::ActionBar)
        );
    }

    #[test]
    fn test_cancel_discards_session() {
        let ctx = context();
        let player = Uuid::new_v4();
        ctx.sessions()
            .begin(player, &DecodedMessage::new(Surface::PrimaryChat, "Hello", false));
        prompt(ctx.handle_session_chat(player, "-"));

        let outcome = ctx.handle_session_chat(player, "CANCEL");
        assert_eq!(outcome, Some(SessionOutcome::Cancelled));
        assert!(!ctx.sessions().is_active(player));
        assert!(ctx.rules().is_empty());
    }

    #[test]
    fn test_replacement_with_colors_builds_preview() {
        let ctx = context();
        let player = Uuid::new_v4();
        ctx.sessions()
            .begin(player, &DecodedMessage::new(Surface::PrimaryChat, "Hello", false));
        prompt(ctx.handle_session_chat(player, "-"));
        prompt(ctx.handle_session_chat(player, "Hello"));
        prompt(ctx.handle_session_chat(player, "&aHi"));

        let outcome = ctx.handle_session_chat(player, "-");
        match outcome {
            Some(SessionOutcome::Committed { summary }) => {
                assert!(summary.contains("\u{00a7}aHi"));
            }
            other => panic!("expected commit, got {:?}", other),
        }
        // The stored replacement keeps the raw & form for the pipeline to
        // translate at apply time.
        assert_eq!(ctx.rules().last().unwrap().replacement(), "&aHi");
    }

    #[test]
    fn test_new_session_replaces_prior() {
        let ctx = context();
        let player = Uuid::new_v4();
        ctx.sessions()
            .begin(player, &DecodedMessage::new(Surface::PrimaryChat, "First", false));
        ctx.sessions()
            .begin(player, &DecodedMessage::new(Surface::SystemChat, "Second", false));
        assert_eq!(ctx.sessions().len(), 1);

        // The key prompt reflects the second message.
        let outcome = ctx.handle_session_chat(player, "nope");
        match outcome {
            Some(SessionOutcome::Rejected { error, .. }) => {
                assert!(error.contains("nope"));
            }
            other => panic!("expected rejection, got {:?}", other),
        }
        prompt(ctx.handle_session_chat(player, "Second"));
    }

    #[test]
    fn test_no_session_passes_chat_through() {
        let ctx = context();
        assert_eq!(ctx.handle_session_chat(Uuid::new_v4(), "hello"), None);
    }

    #[test]
    fn test_disconnect_removes_session() {
        let ctx = context();
        let player = Uuid::new_v4();
        ctx.sessions()
            .begin(player, &DecodedMessage::new(Surface::PrimaryChat, "Hello", false));
        assert!(ctx.end_session(player));
        assert!(!ctx.sessions().is_active(player));
        assert!(!ctx.end_session(player));
    }

    #[test]
    fn test_begin_edit_resolves_cached_message() {
        use crate::common::error::SessionError;
        use crate::common::types::PlayerRef;
        use crate::pipeline::message_id;

        let ctx = context();
        let player = PlayerRef::new(Uuid::new_v4(), "Steve");
        let id = message_id(Surface::PrimaryChat, "Hello");
        ctx.cache_message(
            id.clone(),
            DecodedMessage::new(Surface::PrimaryChat, "Hello", false),
        );

        let prompt = ctx.begin_edit(&player, &id).unwrap();
        assert!(prompt.contains("Hello"));
        assert!(ctx.sessions().is_active(player.id));

        assert!(matches!(
            ctx.begin_edit(&player, "PCdeadbeef"),
            Err(SessionError::UnknownMessage { .. })
        ));
    }
}
