//! Rule configuration validation.
//!
//! Validates the whole rule list up front and reports every problem at
//! once, so a reload tells the operator about all broken rules rather than
//! the first.

use crate::common::error::ConfigError;
use crate::config::types::RuleConfig;
use crate::rule::EditRule;
use crate::surface::Surface;

/// Validate a configured rule list and return detailed errors.
pub fn validate_rules(configs: &[RuleConfig]) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    for (i, config) in configs.iter().enumerate() {
        if config.pattern.is_empty() {
            errors.push(format!("rules[{}].pattern is empty", i));
        } else if let Err(e) = fancy_regex::Regex::new(&config.pattern) {
            errors.push(format!(
                "rules[{}].pattern is not a valid regex: {}",
                i, e
            ));
        }
        for (field, name) in [
            ("source_surface", &config.source_surface),
            ("destination_surface", &config.destination_surface),
        ] {
            if let Some(name) = name {
                if Surface::from_name(name).is_none() {
                    errors.push(format!(
                        "rules[{}].{} '{}' is not a known surface",
                        i, field, name
                    ));
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            message: errors.join("\n"),
        })
    }
}

/// Compile a configured rule list into runtime rules, in order.
pub fn build_rules(configs: &[RuleConfig]) -> Result<Vec<EditRule>, ConfigError> {
    validate_rules(configs)?;
    let mut rules = Vec::with_capacity(configs.len());
    for (i, config) in configs.iter().enumerate() {
        let rule = EditRule::from_config(config).map_err(|message| ConfigError::Validation {
            message: format!("rules[{}]: {}", i, message),
        })?;
        rules.push(rule);
    }
    Ok(rules)
}
