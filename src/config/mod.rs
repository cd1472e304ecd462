//! Configuration module.

pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, default_config_path, default_log_path, load_config_file,
    load_config_with_precedence, merge_config, CliOverrides, ConfigError, ConfigFile, ResolvedConfig,
};

/// Default number of display lines laid out per metric-update slice.
pub const DEFAULT_METRIC_BUDGET: usize = 200;

/// Geometry and scheduling settings of one text view.
///
/// Changing `width` (or anything else that affects line breaking) requires a
/// full metric invalidation; `height` only affects which lines are visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayConfig {
    /// Width of the text area in pixels.
    pub width: i32,
    /// Height of the text area in pixels.
    pub height: i32,
    /// Width of the insertion cursor.
    pub insert_width: i32,
    /// Whether the insertion cursor is laid out and drawn.
    pub show_cursor: bool,
    /// Display lines laid out per background metric slice.
    pub metric_budget: usize,
}

impl DisplayConfig {
    /// Configuration for a `width` by `height` text area.
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            insert_width: 2,
            show_cursor: true,
            metric_budget: DEFAULT_METRIC_BUDGET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_keeps_default_scheduling() {
        let config = DisplayConfig::new(300, 200);
        assert_eq!((config.width, config.height), (300, 200));
        assert_eq!(config.metric_budget, DEFAULT_METRIC_BUDGET);
        assert!(config.show_cursor);
    }
}
