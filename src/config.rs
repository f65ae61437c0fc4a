//! Application configuration.
//!
//! The configuration is loaded from a JSON file, by default
//! `$XDG_CONFIG_HOME/madawm/config.json`, or from the path passed with
//! `--config <path>`.  Every key is optional; a missing file means
//! compiled-in defaults.
//!
//! # Example
//!
//! ```json
//! {
//!   "workspaces": [
//!     { "name": "term", "classes": ["xterm", "kitty"] },
//!     { "name": "web", "classes": ["firefox", "chromium"] }
//!   ],
//!   "terminal": "kitty",
//!   "browser": "firefox",
//!   "modifier": "super",
//!   "border": { "width": 1, "focused": "#5294e2", "unfocused": "#3a3a3a" }
//! }
//! ```

use crate::classifier::Classifier;
use crate::event::PrimaryModifier;
use crate::focus::BorderColors;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

/// Fewest workspaces the manager runs with.
pub const MIN_WORKSPACES: usize = 2;

/// Used when neither `$TERMINAL` nor the config names a terminal.
pub const DEFAULT_TERMINAL: &str = "kitty";

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// One entry per workspace, in priority order for classification.
    pub workspaces: Vec<WorkspaceConfig>,
    /// Terminal command; `$TERMINAL` takes precedence.
    pub terminal: String,
    /// Browser command.
    pub browser: String,
    /// Primary modifier for every binding.
    pub modifier: PrimaryModifier,
    pub border: BorderConfig,
}

/// A workspace and the applications allowed on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Only used in log output.
    pub name: String,
    /// Case-insensitive `WM_CLASS` instance or class names.
    pub classes: Vec<String>,
}

/// Window border settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BorderConfig {
    /// Border width in pixels.  `0` disables borders.
    pub width: u32,
    #[serde(deserialize_with = "color", serialize_with = "color_out")]
    pub focused: u32,
    #[serde(deserialize_with = "color", serialize_with = "color_out")]
    pub unfocused: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspaces: vec![
                WorkspaceConfig {
                    name: "term".into(),
                    classes: ["xterm", "terminal", "urxvt", "kitty"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                },
                WorkspaceConfig {
                    name: "web".into(),
                    classes: vec!["firefox".into()],
                },
                WorkspaceConfig {
                    name: "misc".into(),
                    classes: Vec::new(),
                },
            ],
            terminal: DEFAULT_TERMINAL.into(),
            browser: "firefox".into(),
            modifier: PrimaryModifier::Super,
            border: BorderConfig::default(),
        }
    }
}

impl Default for BorderConfig {
    fn default() -> Self {
        Self {
            width: 1,
            focused: 0x5294e2,
            unfocused: 0x3a3a3a,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| ConfigError(format!("failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workspaces.len() < MIN_WORKSPACES {
            return Err(ConfigError(format!(
                "need at least {} workspaces, got {}",
                MIN_WORKSPACES,
                self.workspaces.len()
            )));
        }
        Ok(())
    }

    pub fn workspace_count(&self) -> usize {
        self.workspaces.len()
    }

    /// Build the classifier from the per-workspace allow-lists.
    pub fn classifier(&self) -> Classifier {
        Classifier::new(self.workspaces.iter().map(|w| w.classes.iter()))
    }

    pub fn border_colors(&self) -> BorderColors {
        BorderColors {
            focused: self.border.focused,
            unfocused: self.border.unfocused,
        }
    }

    /// The terminal command, given the value of `$TERMINAL`.
    pub fn terminal_command(&self, env: Option<String>) -> String {
        match env {
            Some(t) if !t.trim().is_empty() => t,
            _ if !self.terminal.trim().is_empty() => self.terminal.clone(),
            _ => DEFAULT_TERMINAL.into(),
        }
    }
}

/// Parse `#rrggbb` (the `#` is optional) into a pixel value.
pub fn parse_color(s: &str) -> Option<u32> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

fn color<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_color(&s).ok_or_else(|| DeError::custom(format!("invalid color: {:?}", s)))
}

fn color_out<S>(pixel: &u32, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format!("#{:06x}", pixel))
}

/// Error from loading or parsing a configuration file.
#[derive(Debug, thiserror::Error)]
#[error("config error: {0}")]
pub struct ConfigError(String);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classification;

    #[test]
    fn deserialize_full_config() {
        let json = r##"{
            "workspaces": [
                { "name": "a", "classes": ["Alacritty"] },
                { "name": "b", "classes": ["chromium", "firefox"] },
                { "name": "c", "classes": [] },
                { "name": "d", "classes": ["mpv"] }
            ],
            "terminal": "alacritty",
            "browser": "chromium",
            "modifier": "alt",
            "border": { "width": 3, "focused": "#ff0000", "unfocused": "101010" }
        }"##;
        let cfg: Config = serde_json::from_str(json).unwrap();
        cfg.validate().unwrap();
        assert_eq!(cfg.workspace_count(), 4);
        assert_eq!(cfg.terminal, "alacritty");
        assert_eq!(cfg.browser, "chromium");
        assert_eq!(cfg.modifier, PrimaryModifier::Alt);
        assert_eq!(cfg.border.width, 3);
        assert_eq!(cfg.border.focused, 0xff0000);
        assert_eq!(cfg.border.unfocused, 0x101010);
    }

    #[test]
    fn deserialize_empty_uses_defaults() {
        let cfg: Config = serde_json::from_str("{}").unwrap();
        let d = Config::default();
        assert_eq!(cfg.workspace_count(), 3);
        assert_eq!(cfg.terminal, d.terminal);
        assert_eq!(cfg.browser, d.browser);
        assert_eq!(cfg.modifier, PrimaryModifier::Super);
        assert_eq!(cfg.border.width, d.border.width);
        assert_eq!(cfg.border.focused, d.border.focused);
    }

    #[test]
    fn deserialize_partial_border() {
        let cfg: Config = serde_json::from_str(r#"{ "border": { "width": 0 } }"#).unwrap();
        assert_eq!(cfg.border.width, 0);
        assert_eq!(cfg.border.focused, BorderConfig::default().focused);
    }

    #[test]
    fn bad_color_rejected() {
        let r: Result<Config, _> =
            serde_json::from_str(r#"{ "border": { "focused": "blue" } }"#);
        assert!(r.is_err());
    }

    #[test]
    fn single_workspace_fails_validation() {
        let cfg: Config =
            serde_json::from_str(r#"{ "workspaces": [ { "classes": ["xterm"] } ] }"#).unwrap();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unknown_top_level_keys_ignored() {
        let json = r#"{ "browser": "firefox", "future_section": { "key": 42 } }"#;
        let _cfg: Config = serde_json::from_str(json).unwrap();
    }

    #[test]
    fn default_classifier_routes_terminals_and_browsers() {
        let c = Config::default().classifier();
        assert_eq!(c.classify_names(Some("xterm"), Some("XTerm")), Classification::Assigned(0));
        assert_eq!(c.classify_names(Some("kitty"), Some("kitty")), Classification::Assigned(0));
        assert_eq!(c.classify_names(Some("Navigator"), Some("firefox")), Classification::Assigned(1));
        assert_eq!(c.classify_names(Some("gimp"), Some("Gimp")), Classification::Rejected);
    }

    #[test]
    fn terminal_env_wins() {
        let cfg = Config::default();
        assert_eq!(cfg.terminal_command(Some("xterm".into())), "xterm");
        assert_eq!(cfg.terminal_command(None), "kitty");
        assert_eq!(cfg.terminal_command(Some("   ".into())), "kitty");
        let blank = Config {
            terminal: String::new(),
            ..Config::default()
        };
        assert_eq!(blank.terminal_command(None), DEFAULT_TERMINAL);
    }

    #[test]
    fn parse_color_forms() {
        assert_eq!(parse_color("#5294e2"), Some(0x5294e2));
        assert_eq!(parse_color("5294E2"), Some(0x5294e2));
        assert_eq!(parse_color("#fff"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
    }
}
