//! Configuration file loading with precedence handling.
//!
//! Precedence, lowest to highest: built-in defaults, config file,
//! environment variables, command-line flags.

use crate::config::{DisplayConfig, DEFAULT_METRIC_BUDGET};
use crate::model::font::CellMetrics;
use crate::model::style::{HyphenRules, Justify, Style, StyleRef, TabStop, TabStyle, WrapMode};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "TEXTDISP_CONFIG";
/// Environment variable overriding the wrap mode.
pub const WRAP_ENV: &str = "TEXTDISP_WRAP";
/// Environment variable overriding the metric budget.
pub const BUDGET_ENV: &str = "TEXTDISP_BUDGET";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },

    /// A setting has a value outside its domain.
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Setting name, or environment variable.
        key: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional; missing ones take the built-in defaults.
/// Corresponds to `~/.config/textdisp/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Text area width in pixels.
    #[serde(default)]
    pub width: Option<i32>,
    /// Text area height in pixels.
    #[serde(default)]
    pub height: Option<i32>,
    /// Wrap mode: none, char, word or codepoint.
    #[serde(default)]
    pub wrap: Option<WrapMode>,
    /// Justification: left, right, center or full.
    #[serde(default)]
    pub justify: Option<Justify>,
    /// Tab stops, e.g. `[{ position = 64 }, { position = 160, align = "right" }]`.
    #[serde(default)]
    pub tab_stops: Option<Vec<TabStop>>,
    /// Tab style: tabular or wordprocessor.
    #[serde(default)]
    pub tab_style: Option<TabStyle>,
    /// Left margin of first display lines.
    #[serde(default)]
    pub lmargin1: Option<i32>,
    /// Left margin of continuation display lines.
    #[serde(default)]
    pub lmargin2: Option<i32>,
    /// Right margin.
    #[serde(default)]
    pub rmargin: Option<i32>,
    /// Space above logical lines.
    #[serde(default)]
    pub spacing1: Option<i32>,
    /// Space between display lines of one logical line.
    #[serde(default)]
    pub spacing2: Option<i32>,
    /// Space below logical lines.
    #[serde(default)]
    pub spacing3: Option<i32>,
    /// Pixels per character cell of the built-in font metrics.
    #[serde(default)]
    pub cell_width: Option<i32>,
    /// Line height of the built-in font metrics.
    #[serde(default)]
    pub line_height: Option<i32>,
    /// Display lines laid out per metric slice.
    #[serde(default)]
    pub metric_budget: Option<usize>,
    /// Language tag for line-break tailoring.
    #[serde(default)]
    pub lang: Option<String>,
    /// Whether soft hyphens may break lines.
    #[serde(default)]
    pub hyphenate: Option<bool>,
    /// Enabled spelling-change rules, e.g. `"ck, trema"`.
    #[serde(default)]
    pub hyphen_rules: Option<String>,
    /// Insertion cursor width.
    #[serde(default)]
    pub insert_width: Option<i32>,
    /// Whether the insertion cursor is shown.
    #[serde(default)]
    pub show_cursor: Option<bool>,
    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Text area width.
    pub width: i32,
    /// Text area height.
    pub height: i32,
    /// Wrap mode of the default style.
    pub wrap: WrapMode,
    /// Justification of the default style.
    pub justify: Justify,
    /// Tab stops of the default style.
    pub tab_stops: Vec<TabStop>,
    /// Tab style of the default style.
    pub tab_style: TabStyle,
    /// Left margin of first display lines.
    pub lmargin1: i32,
    /// Left margin of continuation lines.
    pub lmargin2: i32,
    /// Right margin.
    pub rmargin: i32,
    /// Space above logical lines.
    pub spacing1: i32,
    /// Space between display lines.
    pub spacing2: i32,
    /// Space below logical lines.
    pub spacing3: i32,
    /// Character cell width.
    pub cell_width: i32,
    /// Line height.
    pub line_height: i32,
    /// Display lines per metric slice.
    pub metric_budget: usize,
    /// Language tag.
    pub lang: Option<String>,
    /// Soft hyphen breaking.
    pub hyphenate: bool,
    /// Spelling-change rules.
    pub hyphen_rules: HyphenRules,
    /// Cursor width.
    pub insert_width: i32,
    /// Cursor visibility.
    pub show_cursor: bool,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let display = DisplayConfig::default();
        let style = Style::default();
        Self {
            width: 80 * 8,
            height: 24 * 16,
            wrap: style.wrap,
            justify: style.justify,
            tab_stops: Vec::new(),
            tab_style: style.tab_style,
            lmargin1: 0,
            lmargin2: 0,
            rmargin: 0,
            spacing1: 0,
            spacing2: 0,
            spacing3: 0,
            cell_width: 8,
            line_height: 16,
            metric_budget: DEFAULT_METRIC_BUDGET,
            lang: None,
            hyphenate: style.hyphenate,
            hyphen_rules: style.hyphen_rules,
            insert_width: display.insert_width,
            show_cursor: display.show_cursor,
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// View geometry and scheduling settings.
    pub fn display_config(&self) -> DisplayConfig {
        DisplayConfig {
            width: self.width,
            height: self.height,
            insert_width: self.insert_width,
            show_cursor: self.show_cursor,
            metric_budget: self.metric_budget,
        }
    }

    /// Style applied to text without explicit styling.
    pub fn default_style(&self) -> StyleRef {
        Style {
            lmargin1: self.lmargin1,
            lmargin2: self.lmargin2,
            rmargin: self.rmargin,
            spacing1: self.spacing1,
            spacing2: self.spacing2,
            spacing3: self.spacing3,
            justify: self.justify,
            wrap: self.wrap,
            tabs: self.tab_stops.clone(),
            tab_style: self.tab_style,
            lang: self.lang.clone(),
            hyphenate: self.hyphenate,
            hyphen_rules: self.hyphen_rules,
            ..Style::default()
        }
        .shared()
    }

    /// Fixed-cell font metrics with the configured cell size.
    pub fn font_metrics(&self) -> CellMetrics {
        CellMetrics::new(self.cell_width, self.line_height)
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/textdisp/textdisp.log` on Unix-like systems, or
/// the platform equivalent. Falls back to the current directory when no
/// state directory is known.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("textdisp").join("textdisp.log")
    } else {
        PathBuf::from("textdisp.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path: `~/.config/textdisp/config.toml` on
/// Unix, the platform equivalent elsewhere.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("textdisp").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `TEXTDISP_CONFIG` environment variable
/// 3. Default path `~/.config/textdisp/config.toml`
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved config.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for out-of-range sizes or unknown
/// hyphen rule names.
pub fn merge_config(config_file: Option<ConfigFile>) -> Result<ResolvedConfig, ConfigError> {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return Ok(defaults);
    };

    let hyphen_rules = match config.hyphen_rules {
        Some(list) => HyphenRules::parse_list(&list).map_err(|reason| ConfigError::InvalidValue {
            key: "hyphen_rules".to_owned(),
            reason,
        })?,
        None => defaults.hyphen_rules,
    };
    let mut tab_stops = config.tab_stops.unwrap_or(defaults.tab_stops);
    tab_stops.sort_by_key(|t| t.position);

    let resolved = ResolvedConfig {
        width: config.width.unwrap_or(defaults.width),
        height: config.height.unwrap_or(defaults.height),
        wrap: config.wrap.unwrap_or(defaults.wrap),
        justify: config.justify.unwrap_or(defaults.justify),
        tab_stops,
        tab_style: config.tab_style.unwrap_or(defaults.tab_style),
        lmargin1: config.lmargin1.unwrap_or(defaults.lmargin1),
        lmargin2: config.lmargin2.unwrap_or(defaults.lmargin2),
        rmargin: config.rmargin.unwrap_or(defaults.rmargin),
        spacing1: config.spacing1.unwrap_or(defaults.spacing1),
        spacing2: config.spacing2.unwrap_or(defaults.spacing2),
        spacing3: config.spacing3.unwrap_or(defaults.spacing3),
        cell_width: config.cell_width.unwrap_or(defaults.cell_width),
        line_height: config.line_height.unwrap_or(defaults.line_height),
        metric_budget: config.metric_budget.unwrap_or(defaults.metric_budget),
        lang: config.lang.or(defaults.lang),
        hyphenate: config.hyphenate.unwrap_or(defaults.hyphenate),
        hyphen_rules,
        insert_width: config.insert_width.unwrap_or(defaults.insert_width),
        show_cursor: config.show_cursor.unwrap_or(defaults.show_cursor),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    };
    validate(&resolved)?;
    Ok(resolved)
}

fn validate(config: &ResolvedConfig) -> Result<(), ConfigError> {
    let positive = [
        ("width", config.width),
        ("height", config.height),
        ("cell_width", config.cell_width),
        ("line_height", config.line_height),
    ];
    for (key, value) in positive {
        if value <= 0 {
            return Err(ConfigError::InvalidValue {
                key: key.to_owned(),
                reason: format!("must be positive, got {value}"),
            });
        }
    }
    if config.metric_budget == 0 {
        return Err(ConfigError::InvalidValue {
            key: "metric_budget".to_owned(),
            reason: "must be at least 1".to_owned(),
        });
    }
    Ok(())
}

/// Apply environment variable overrides to resolved config.
///
/// Checks for:
/// - `TEXTDISP_WRAP`: wrap mode
/// - `TEXTDISP_BUDGET`: metric budget
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if a variable is set to an
/// unparsable value.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> Result<ResolvedConfig, ConfigError> {
    if let Ok(wrap) = std::env::var(WRAP_ENV) {
        config.wrap = wrap.parse().map_err(|reason| ConfigError::InvalidValue {
            key: WRAP_ENV.to_owned(),
            reason,
        })?;
    }

    if let Ok(budget) = std::env::var(BUDGET_ENV) {
        config.metric_budget = match budget.trim().parse::<usize>() {
            Ok(n) if n > 0 => n,
            _ => {
                return Err(ConfigError::InvalidValue {
                    key: BUDGET_ENV.to_owned(),
                    reason: format!("expected a positive integer, got {budget:?}"),
                })
            }
        };
    }

    Ok(config)
}

/// Settings given on the command line; `None` leaves the value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliOverrides {
    /// `--width`.
    pub width: Option<i32>,
    /// `--height`.
    pub height: Option<i32>,
    /// `--wrap`.
    pub wrap: Option<WrapMode>,
    /// `--budget`.
    pub metric_budget: Option<usize>,
}

/// Apply CLI argument overrides to resolved config.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(mut config: ResolvedConfig, overrides: &CliOverrides) -> ResolvedConfig {
    if let Some(width) = overrides.width {
        config.width = width;
    }
    if let Some(height) = overrides.height {
        config.height = height;
    }
    if let Some(wrap) = overrides.wrap {
        config.wrap = wrap;
    }
    if let Some(budget) = overrides.metric_budget {
        config.metric_budget = budget;
    }
    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
