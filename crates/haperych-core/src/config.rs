//! Bot configuration model.
//!
//! Loaded once at startup and read-only afterwards.

use serde::{Deserialize, Serialize};

/// A reply-keyboard label and the flow alias it starts.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MenuButton {
    pub label: String,
    pub alias: String,
}

impl MenuButton {
    pub fn new(label: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            alias: alias.into(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BotConfig {
    /// The only sender whose events are processed.
    #[serde(default)]
    pub operator_id: i64,
    /// Flow started by any text that is neither captured nor a menu label.
    #[serde(default = "default_alias")]
    pub default_alias: String,
    #[serde(rename = "menu", default = "default_menu")]
    pub menu: Vec<MenuButton>,
    /// Preset loan and payment amounts offered as buttons.
    #[serde(default = "default_amount_presets")]
    pub amount_presets: Vec<i64>,
    /// Reward presets, in percent of the principal.
    #[serde(default = "default_reward_percent_presets")]
    pub reward_percent_presets: Vec<i64>,
}

fn default_alias() -> String {
    "payback".to_string()
}

fn default_menu() -> Vec<MenuButton> {
    vec![
        MenuButton::new("New loan", "loan"),
        MenuButton::new("Pay back", "payback"),
        MenuButton::new("Add source", "source"),
        MenuButton::new("Add legend", "legend"),
        MenuButton::new("Comment", "comment"),
        MenuButton::new("Analytics", "analytics"),
    ]
}

fn default_amount_presets() -> Vec<i64> {
    vec![1000, 2000, 3000, 5000, 10000, 20000]
}

fn default_reward_percent_presets() -> Vec<i64> {
    vec![0, 5, 10, 15, 20, 30]
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            operator_id: 0,
            default_alias: default_alias(),
            menu: default_menu(),
            amount_presets: default_amount_presets(),
            reward_percent_presets: default_reward_percent_presets(),
        }
    }
}

impl BotConfig {
    /// Alias bound to a reply-keyboard label.
    pub fn alias_for_label(&self, label: &str) -> Option<&str> {
        self.menu
            .iter()
            .find(|button| button.label == label)
            .map(|button| button.alias.as_str())
    }

    /// Reply-keyboard labels in configured order.
    pub fn keyboard(&self) -> Vec<String> {
        self.menu.iter().map(|button| button.label.clone()).collect()
    }
}
