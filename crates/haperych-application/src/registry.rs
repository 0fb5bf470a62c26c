//! Static flow registration.
//!
//! Flows are listed once here; lookups go by token prefix (button presses)
//! or by alias (menu labels, default flow, alias capture).

use std::collections::HashSet;

use haperych_core::{HaperychError, Result};

use crate::flow::{AnalyticsFlow, CommentFlow, Flow, LoanFlow, NameFlow, PaybackFlow, TextFlow};

static TOKEN_FLOWS: &[&dyn Flow] = &[&LoanFlow, &PaybackFlow, &CommentFlow, &AnalyticsFlow];

static TEXT_FLOWS: &[&dyn TextFlow] = &[&NameFlow::SOURCE, &NameFlow::LEGEND];

/// A flow found by alias.
#[derive(Clone, Copy)]
pub enum FlowEntry {
    Token(&'static dyn Flow),
    Text(&'static dyn TextFlow),
}

/// Prefix and alias tables over a fixed set of flows.
pub struct FlowRegistry {
    token_flows: &'static [&'static dyn Flow],
    text_flows: &'static [&'static dyn TextFlow],
}

impl FlowRegistry {
    /// Registry of every flow the bot ships with.
    pub fn builtin() -> Self {
        Self {
            token_flows: TOKEN_FLOWS,
            text_flows: TEXT_FLOWS,
        }
    }

    /// Builds a registry, rejecting duplicate prefixes or aliases.
    pub fn new(
        token_flows: &'static [&'static dyn Flow],
        text_flows: &'static [&'static dyn TextFlow],
    ) -> Result<Self> {
        let mut prefixes = HashSet::new();
        for flow in token_flows {
            if !prefixes.insert(flow.prefix()) {
                return Err(HaperychError::config(format!(
                    "duplicate flow prefix '{}'",
                    flow.prefix()
                )));
            }
        }

        let mut aliases = HashSet::new();
        let all_aliases = token_flows
            .iter()
            .map(|f| f.alias())
            .chain(text_flows.iter().map(|f| f.alias()));
        for alias in all_aliases {
            if !aliases.insert(alias) {
                return Err(HaperychError::config(format!(
                    "duplicate flow alias '{alias}'"
                )));
            }
        }

        Ok(Self {
            token_flows,
            text_flows,
        })
    }

    pub fn by_prefix(&self, prefix: &str) -> Option<&'static dyn Flow> {
        self.token_flows
            .iter()
            .copied()
            .find(|flow| flow.prefix() == prefix)
    }

    pub fn by_alias(&self, alias: &str) -> Option<FlowEntry> {
        if let Some(flow) = self.token_flows.iter().find(|f| f.alias() == alias) {
            return Some(FlowEntry::Token(*flow));
        }
        self.text_flows
            .iter()
            .find(|f| f.alias() == alias)
            .map(|flow| FlowEntry::Text(*flow))
    }

    /// Every registered alias, token flows first.
    pub fn aliases(&self) -> Vec<&'static str> {
        self.token_flows
            .iter()
            .map(|f| f.alias())
            .chain(self.text_flows.iter().map(|f| f.alias()))
            .collect()
    }
}

impl Default for FlowRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haperych_core::config::BotConfig;

    #[test]
    fn builtin_tables_are_unique() {
        assert!(FlowRegistry::new(TOKEN_FLOWS, TEXT_FLOWS).is_ok());
    }

    #[test]
    fn duplicate_prefix_is_rejected() {
        static TWICE: &[&dyn Flow] = &[&LoanFlow, &LoanFlow];
        let err = FlowRegistry::new(TWICE, &[]).err().unwrap();
        assert!(matches!(err, HaperychError::Config(_)));
    }

    #[test]
    fn lookups() {
        let registry = FlowRegistry::builtin();
        assert_eq!(registry.by_prefix("payback").unwrap().alias(), "payback");
        assert!(registry.by_prefix("nope").is_none());
        assert!(matches!(registry.by_alias("source"), Some(FlowEntry::Text(_))));
        assert!(matches!(registry.by_alias("loan"), Some(FlowEntry::Token(_))));
    }

    #[test]
    fn default_menu_points_at_registered_flows() {
        let registry = FlowRegistry::builtin();
        let config = BotConfig::default();
        for button in &config.menu {
            assert!(registry.by_alias(&button.alias).is_some(), "{}", button.alias);
        }
        assert!(registry.by_alias(&config.default_alias).is_some());
        assert_eq!(registry.aliases().len(), 6);
    }
}
