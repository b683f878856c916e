//! Shared pipeline state.
//!
//! `PipelineContext` is built once at startup and handed by reference to
//! every component: the rule list, both caches, the session table, the
//! expander list and the permission oracle. Lifecycle is explicit; there is
//! no global state.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use dashmap::DashSet;
use tracing::info;

use crate::cache::TimedCache;
use crate::common::error::{ConfigError, PipelineError, SessionError};
use crate::common::types::{DecodedMessage, PlayerRef};
use crate::config::store::{MemoryRuleStore, RuleStore};
use crate::config::types::Settings;
use crate::config::validate::build_rules;
use crate::rule::placeholder::PlaceholderExpander;
use crate::rule::EditRule;
use crate::session::{SessionOutcome, SessionTable};
use crate::surface::Surface;
use uuid::Uuid;

/// Decides which players get interactive edit affordances.
pub trait PermissionOracle: Send + Sync {
    fn can_edit(&self, player: &PlayerRef) -> bool;
}

/// Grants the edit capability to everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionOracle for AllowAll {
    fn can_edit(&self, _player: &PlayerRef) -> bool {
        true
    }
}

/// Denies the edit capability to everyone. The builder default: affordances
/// stay off until the host wires its real oracle.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl PermissionOracle for DenyAll {
    fn can_edit(&self, _player: &PlayerRef) -> bool {
        false
    }
}

/// A cached rewrite outcome: which rule matched and what it produced.
#[derive(Clone)]
pub struct RewriteEntry {
    pub rule: Arc<EditRule>,
    pub text: String,
}

/// All shared state of the rewrite layer.
pub struct PipelineContext {
    settings: Settings,
    rules: RwLock<Arc<Vec<Arc<EditRule>>>>,
    rewrite_cache: TimedCache<String, RewriteEntry>,
    message_cache: TimedCache<String, DecodedMessage>,
    sessions: SessionTable,
    expanders: Vec<Box<dyn PlaceholderExpander>>,
    permissions: Box<dyn PermissionOracle>,
    store: Box<dyn RuleStore>,
    analyzed: DashSet<Surface>,
}

impl PipelineContext {
    pub fn builder(settings: Settings) -> PipelineContextBuilder {
        PipelineContextBuilder {
            settings,
            rules: Vec::new(),
            expanders: Vec::new(),
            permissions: Box::new(DenyAll),
            store: Box::new(MemoryRuleStore::default()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Snapshot of the rule list. Safe to iterate while another thread
    /// appends: appends swap in a fresh list.
    pub fn rules(&self) -> Arc<Vec<Arc<EditRule>>> {
        self.rules
            .read()
            .map(|rules| Arc::clone(&*rules))
            .unwrap_or_default()
    }

    /// Append a rule (copy-on-append).
    pub fn append_rule(&self, rule: EditRule) -> Arc<EditRule> {
        let rule = Arc::new(rule);
        if let Ok(mut rules) = self.rules.write() {
            let mut next = rules.as_ref().clone();
            next.push(Arc::clone(&rule));
            *rules = Arc::new(next);
        }
        rule
    }

    /// Replace the rule list from the store and invalidate the rewrite
    /// cache so the new rules take effect on the next packet.
    pub fn reload(&self) -> Result<usize, ConfigError> {
        let configs = self.store.load()?;
        let rules: Vec<Arc<EditRule>> = build_rules(&configs)?.into_iter().map(Arc::new).collect();
        let count = rules.len();
        if let Ok(mut stored) = self.rules.write() {
            *stored = Arc::new(rules);
        }
        self.rewrite_cache.invalidate_all();
        info!("Loaded {} edit rules", count);
        Ok(count)
    }

    /// Persist the current rule list through the store.
    pub fn persist_rules(&self) -> Result<(), ConfigError> {
        let configs: Vec<_> = self.rules().iter().map(|rule| rule.to_config()).collect();
        self.store.persist(&configs)
    }

    pub fn rewrite_cached(&self, text: &str) -> Option<RewriteEntry> {
        self.rewrite_cache.get(&text.to_string())
    }

    pub fn cache_rewrite(&self, text: String, entry: RewriteEntry) {
        self.rewrite_cache.insert(text, entry);
    }

    pub fn clear_rewrite_cache(&self) {
        self.rewrite_cache.invalidate_all();
    }

    pub fn rewrite_cache_keys(&self) -> Vec<String> {
        self.rewrite_cache.keys()
    }

    pub fn cache_message(&self, id: String, message: DecodedMessage) {
        self.message_cache.insert(id, message);
    }

    pub fn cached_message(&self, id: &str) -> Option<DecodedMessage> {
        self.message_cache.get(&id.to_string())
    }

    pub fn clear_message_cache(&self) {
        self.message_cache.invalidate_all();
    }

    pub fn message_cache_keys(&self) -> Vec<String> {
        self.message_cache.keys()
    }

    pub fn expanders(&self) -> &[Box<dyn PlaceholderExpander>] {
        &self.expanders
    }

    pub fn permissions(&self) -> &dyn PermissionOracle {
        self.permissions.as_ref()
    }

    /// Toggle diagnostic logging for a surface.
    pub fn set_surface_analysis(&self, surface: Surface, enabled: bool) {
        if enabled {
            self.analyzed.insert(surface);
        } else {
            self.analyzed.remove(&surface);
        }
    }

    pub fn is_analyzed(&self, surface: Surface) -> bool {
        self.analyzed.contains(&surface)
    }

    pub fn sessions(&self) -> &SessionTable {
        &self.sessions
    }

    /// Start an edit session for the message a player clicked.
    ///
    /// Any prior session of that player is silently replaced. Returns the
    /// first prompt to send them.
    pub fn begin_edit(&self, player: &PlayerRef, message_id: &str) -> Result<String, SessionError> {
        let message = self
            .cached_message(message_id)
            .ok_or_else(|| SessionError::UnknownMessage {
                id: message_id.to_string(),
            })?;
        Ok(self.sessions.begin(player.id, &message))
    }

    /// Feed one of the player's chat lines to their session, if any.
    ///
    /// `None` means no session is active and the chat line should be
    /// delivered normally; `Some` means the line was consumed.
    pub fn handle_session_chat(&self, player: Uuid, input: &str) -> Option<SessionOutcome> {
        self.sessions.handle_chat(self, player, input)
    }

    /// Drop a player's session (disconnect or external cancel).
    pub fn end_session(&self, player: Uuid) -> bool {
        self.sessions.end(player)
    }
}

/// Builder for [`PipelineContext`].
pub struct PipelineContextBuilder {
    settings: Settings,
    rules: Vec<EditRule>,
    expanders: Vec<Box<dyn PlaceholderExpander>>,
    permissions: Box<dyn PermissionOracle>,
    store: Box<dyn RuleStore>,
}

impl PipelineContextBuilder {
    pub fn rules(mut self, rules: Vec<EditRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn expander(mut self, expander: Box<dyn PlaceholderExpander>) -> Self {
        self.expanders.push(expander);
        self
    }

    pub fn permissions(mut self, permissions: Box<dyn PermissionOracle>) -> Self {
        self.permissions = permissions;
        self
    }

    pub fn store(mut self, store: Box<dyn RuleStore>) -> Self {
        self.store = store;
        self
    }

    /// Build the context.
    ///
    /// Fails when the server's protocol version is below the minimum any
    /// surface supports: the feature disables itself at load time rather
    /// than running degraded.
    pub fn build(self) -> Result<Arc<PipelineContext>, PipelineError> {
        let required = Surface::minimum_required();
        if self.settings.protocol_version < required {
            return Err(PipelineError::ProtocolUnsupported {
                version: self.settings.protocol_version,
                required,
            });
        }
        let ttl = Duration::from_secs(self.settings.cache_ttl_secs);
        Ok(Arc::new(PipelineContext {
            settings: self.settings,
            rules: RwLock::new(Arc::new(
                self.rules.into_iter().map(Arc::new).collect::<Vec<_>>(),
            )),
            rewrite_cache: TimedCache::new(ttl),
            message_cache: TimedCache::new(ttl),
            sessions: SessionTable::new(),
            expanders: self.expanders,
            permissions: self.permissions,
            store: self.store,
            analyzed: DashSet::new(),
        }))
    }
}
