//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/valtree/valtree.toml`
//! 3. Local config: `<dir>/.valtree.toml`
//! 4. Environment variables: `VALTREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::ApplicationError;
use crate::domain::{SheetNames, MAX_WEIGHT, MIN_WEIGHT};

pub const DEFAULT_WORKBOOK: &str = "service_transformation_node_master.xlsx";
pub const DEFAULT_THRESHOLD: i64 = 3;

/// Unified configuration for valtree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Workbook holding the node catalog and applicability sheets
    pub workbook: PathBuf,
    /// Threshold used when `tree` is called without `--threshold`
    pub default_threshold: i64,
    /// Sheet names inside the workbook
    pub sheets: SheetNames,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from(DEFAULT_WORKBOOK),
            default_threshold: DEFAULT_THRESHOLD,
            sheets: SheetNames::default(),
        }
    }
}

/// Raw sheet names for intermediate parsing; `None` means "not specified".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSheetNames {
    pub node_master: Option<String>,
    pub context_applicability: Option<String>,
    pub value_intent_summary: Option<String>,
}

/// Raw settings for intermediate parsing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub workbook: Option<PathBuf>,
    pub default_threshold: Option<i64>,
    pub sheets: RawSheetNames,
}

/// Get the XDG config directory for valtree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "valtree").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("valtree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".valtree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; unresolvable input is returned unchanged.
fn expand_env_vars(input: &str) -> String {
    shellexpand::full(input)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

impl SheetNames {
    fn merge(&self, overlay: &RawSheetNames) -> Self {
        Self {
            node_master: overlay
                .node_master
                .clone()
                .unwrap_or_else(|| self.node_master.clone()),
            context_applicability: overlay
                .context_applicability
                .clone()
                .unwrap_or_else(|| self.context_applicability.clone()),
            value_intent_summary: overlay
                .value_intent_summary
                .clone()
                .unwrap_or_else(|| self.value_intent_summary.clone()),
        }
    }
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        let expanded = expand_env_vars(self.workbook.to_string_lossy().as_ref());
        self.workbook = PathBuf::from(expanded);
    }

    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            workbook: overlay
                .workbook
                .clone()
                .unwrap_or_else(|| self.workbook.clone()),
            default_threshold: overlay.default_threshold.unwrap_or(self.default_threshold),
            sheets: self.sheets.merge(&overlay.sheets),
        }
    }

    fn validate(&self) -> Result<(), ApplicationError> {
        if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&self.default_threshold) {
            return Err(ApplicationError::Config {
                message: format!(
                    "default_threshold must be between {} and {}, got {}",
                    MIN_WEIGHT, MAX_WEIGHT, self.default_threshold
                ),
            });
        }
        Ok(())
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.valtree.toml`
    ///
    /// # Precedence (lowest to highest)
    /// 1. Compiled defaults
    /// 2. Global config: `$XDG_CONFIG_HOME/valtree/valtree.toml`
    /// 3. Local config: `<local_dir>/.valtree.toml`
    /// 4. Environment variables: `VALTREE_*` prefix, `__` between sections
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), local_dir)
    }

    /// Same as [`Settings::load`] with an explicit global config file.
    pub fn load_from(
        global_path: Option<&Path>,
        local_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_path {
            if global_path.exists() {
                debug!("global config: {}", global_path.display());
                current = current.merge_with(&load_raw_settings(global_path)?);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("local config: {}", local_path.display());
                current = current.merge_with(&load_raw_settings(&local_path)?);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();
        current.validate()?;

        Ok(current)
    }

    /// Apply VALTREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("VALTREE").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("workbook") {
            settings.workbook = PathBuf::from(val);
        }
        match config.get_int("default_threshold") {
            Ok(val) => settings.default_threshold = val,
            Err(ConfigError::NotFound(_)) => {}
            Err(e) => return Err(config_err(e)),
        }
        if let Ok(val) = config.get_string("sheets.node_master") {
            settings.sheets.node_master = val;
        }
        if let Ok(val) = config.get_string("sheets.context_applicability") {
            settings.sheets.context_applicability = val;
        }
        if let Ok(val) = config.get_string("sheets.value_intent_summary") {
            settings.sheets.value_intent_summary = val;
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# valtree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/valtree/valtree.toml
#   Local:  <dir>/.valtree.toml
#   Env:    VALTREE_* environment variables, e.g. VALTREE_SHEETS__NODE_MASTER

# Workbook with the node catalog and applicability rules (~ and $VAR expand)
# workbook = "service_transformation_node_master.xlsx"

# Threshold for `valtree tree` when --threshold is omitted (1..=5)
# default_threshold = 3

[sheets]
# node_master = "Node_Master"
# context_applicability = "Context_Applicability"
# value_intent_summary = "Value_Intent_Summary"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_when_loading_then_uses_defaults() {
        let settings = Settings::load_from(None, None).expect("load defaults");
        assert_eq!(settings.workbook, PathBuf::from(DEFAULT_WORKBOOK));
        assert_eq!(settings.default_threshold, 3);
        assert_eq!(settings.sheets, SheetNames::default());
    }

    #[test]
    fn given_tilde_in_workbook_when_expand_paths_then_expands_to_home() {
        let mut settings = Settings {
            workbook: PathBuf::from("~/data/master.xlsx"),
            ..Settings::default()
        };

        settings.expand_paths();

        let home = std::env::var("HOME").expect("HOME should be set");
        let workbook = settings.workbook.to_string_lossy();
        assert!(workbook.starts_with(&home), "workbook: {}", workbook);
        assert!(!workbook.contains('~'));
    }

    #[test]
    fn given_partial_overlay_when_merging_then_keeps_unspecified_fields() {
        let overlay = RawSettings {
            default_threshold: Some(5),
            sheets: RawSheetNames {
                node_master: Some("Nodes".into()),
                ..RawSheetNames::default()
            },
            ..RawSettings::default()
        };

        let merged = Settings::default().merge_with(&overlay);

        assert_eq!(merged.default_threshold, 5);
        assert_eq!(merged.workbook, PathBuf::from(DEFAULT_WORKBOOK));
        assert_eq!(merged.sheets.node_master, "Nodes");
        assert_eq!(merged.sheets.context_applicability, "Context_Applicability");
    }

    #[test]
    fn given_out_of_range_threshold_when_validating_then_config_error() {
        let settings = Settings {
            default_threshold: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ApplicationError::Config { message }) if message.contains("got 0")
        ));
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).expect("parse template");
        assert!(raw.workbook.is_none());
    }
}
