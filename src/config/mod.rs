//! Rule configuration: types, stores and validation.

pub mod store;
pub mod types;
pub mod validate;

pub use store::{JsonRuleStore, MemoryRuleStore, RuleStore};
pub use types::{RuleConfig, Settings};
pub use validate::{build_rules, validate_rules};
