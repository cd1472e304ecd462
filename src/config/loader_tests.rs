//! Tests for configuration file loading.

use super::*;
use serial_test::serial;
use std::env;
use std::fs;

fn write_temp_config(name: &str, contents: &str) -> PathBuf {
    let path = env::temp_dir().join(name);
    fs::write(&path, contents).expect("Failed to write test config");
    path
}

#[test]
fn default_config_path_ends_with_textdisp_config_toml() {
    let path = default_config_path().expect("Should have default path");
    let path_str = path.to_string_lossy();
    assert!(
        path_str.contains("textdisp") && path_str.ends_with("config.toml"),
        "Path should contain 'textdisp' and end with 'config.toml', got: {}",
        path_str
    );
}

#[test]
fn default_log_path_ends_with_textdisp_log() {
    let path = default_log_path();
    assert!(
        path.to_string_lossy().ends_with("textdisp.log"),
        "Default log path should end with 'textdisp.log', got: {:?}",
        path
    );
}

#[test]
fn load_config_file_returns_ok_none_for_missing_file() {
    let result = load_config_file("/nonexistent/path/to/config.toml");
    assert_eq!(result, Ok(None), "Missing config file is not an error");
}

#[test]
fn load_config_file_parses_valid_toml() {
    let config_path = write_temp_config(
        "textdisp_test_config.toml",
        r#"
width = 400
wrap = "char"
justify = "full"
tab_style = "wordprocessor"
tab_stops = [{ position = 64 }, { position = 160, align = "right" }]
spacing2 = 4
hyphen_rules = "ck, trema"
"#,
    );

    let config = load_config_file(&config_path)
        .expect("Should parse valid TOML")
        .expect("File exists");

    assert_eq!(config.width, Some(400));
    assert_eq!(config.wrap, Some(WrapMode::Char));
    assert_eq!(config.justify, Some(Justify::Full));
    assert_eq!(config.tab_style, Some(TabStyle::WordProcessor));
    assert_eq!(
        config.tab_stops,
        Some(vec![
            TabStop::left(64),
            TabStop {
                position: 160,
                align: crate::model::style::TabAlign::Right
            }
        ])
    );
    assert_eq!(config.spacing2, Some(4));

    fs::remove_file(config_path).ok();
}

#[test]
fn load_config_file_returns_error_for_invalid_toml() {
    let config_path = write_temp_config("textdisp_test_invalid.toml", "width = [unclosed");

    let result = load_config_file(&config_path);
    assert!(
        matches!(result, Err(ConfigError::ParseError { .. })),
        "Invalid TOML should be a parse error, got {result:?}"
    );

    fs::remove_file(config_path).ok();
}

#[test]
fn unknown_keys_are_rejected() {
    let config_path = write_temp_config("textdisp_test_unknown.toml", "theme = \"dark\"\n");

    let result = load_config_file(&config_path);
    assert!(matches!(result, Err(ConfigError::ParseError { .. })));

    fs::remove_file(config_path).ok();
}

#[test]
fn merge_config_without_file_uses_defaults() {
    let resolved = merge_config(None).expect("defaults are valid");
    assert_eq!(resolved, ResolvedConfig::default());
}

#[test]
fn merge_config_takes_file_values_and_sorts_tabs() {
    let file = ConfigFile {
        width: Some(300),
        wrap: Some(WrapMode::None),
        tab_stops: Some(vec![TabStop::left(90), TabStop::left(30)]),
        metric_budget: Some(50),
        ..ConfigFile::default()
    };

    let resolved = merge_config(Some(file)).expect("valid config");

    assert_eq!(resolved.width, 300);
    assert_eq!(resolved.wrap, WrapMode::None);
    assert_eq!(resolved.tab_stops, vec![TabStop::left(30), TabStop::left(90)]);
    assert_eq!(resolved.metric_budget, 50);
    assert_eq!(resolved.height, ResolvedConfig::default().height);
}

#[test]
fn merge_config_rejects_unknown_hyphen_rule() {
    let file = ConfigFile {
        hyphen_rules: Some("ck, bogus".to_owned()),
        ..ConfigFile::default()
    };

    let err = merge_config(Some(file)).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "hyphen_rules"));
}

#[test]
fn merge_config_rejects_zero_width() {
    let file = ConfigFile {
        width: Some(0),
        ..ConfigFile::default()
    };

    let err = merge_config(Some(file)).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "width"));
}

#[test]
fn config_file_log_path_overrides_default() {
    let custom_path = PathBuf::from("/custom/path/to/app.log");
    let file = ConfigFile {
        log_file_path: Some(custom_path.clone()),
        ..ConfigFile::default()
    };

    let resolved = merge_config(Some(file)).expect("valid config");
    assert_eq!(resolved.log_file_path, custom_path);
}

#[test]
fn resolved_config_builds_default_style() {
    let config = ResolvedConfig {
        wrap: WrapMode::Codepoint,
        spacing1: 3,
        lang: Some("ja".to_owned()),
        ..ResolvedConfig::default()
    };

    let style = config.default_style();
    assert_eq!(style.wrap, WrapMode::Codepoint);
    assert_eq!(style.spacing1, 3);
    assert_eq!(style.lang.as_deref(), Some("ja"));

    let display = config.display_config();
    assert_eq!(display.width, config.width);
    assert_eq!(display.metric_budget, config.metric_budget);
}

#[test]
#[serial(config_env)]
fn env_overrides_wrap_and_budget() {
    env::set_var(WRAP_ENV, "codepoint");
    env::set_var(BUDGET_ENV, "25");

    let result = apply_env_overrides(ResolvedConfig::default());

    env::remove_var(WRAP_ENV);
    env::remove_var(BUDGET_ENV);

    let config = result.expect("valid overrides");
    assert_eq!(config.wrap, WrapMode::Codepoint);
    assert_eq!(config.metric_budget, 25);
}

#[test]
#[serial(config_env)]
fn env_override_rejects_bad_budget() {
    env::set_var(BUDGET_ENV, "0");

    let result = apply_env_overrides(ResolvedConfig::default());

    env::remove_var(BUDGET_ENV);

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
#[serial(config_env)]
fn env_config_path_is_used_without_explicit_path() {
    let env_path = write_temp_config("textdisp_test_env_config.toml", "height = 123\n");
    env::set_var(CONFIG_ENV, &env_path);

    let result = load_config_with_precedence(None);

    env::remove_var(CONFIG_ENV);
    fs::remove_file(&env_path).ok();

    let config = result.expect("readable").expect("file exists");
    assert_eq!(config.height, Some(123));
}

#[test]
#[serial(config_env)]
fn explicit_path_beats_env_path() {
    let env_path = write_temp_config("textdisp_test_env_loses.toml", "height = 1\n");
    let cli_path = write_temp_config("textdisp_test_cli_wins.toml", "height = 2\n");
    env::set_var(CONFIG_ENV, &env_path);

    let result = load_config_with_precedence(Some(cli_path.clone()));

    env::remove_var(CONFIG_ENV);
    fs::remove_file(&env_path).ok();
    fs::remove_file(&cli_path).ok();

    let config = result.expect("readable").expect("file exists");
    assert_eq!(config.height, Some(2));
}

#[test]
fn cli_overrides_only_touch_given_values() {
    let base = ResolvedConfig::default();
    let overrides = CliOverrides {
        width: Some(123),
        wrap: Some(WrapMode::Char),
        ..CliOverrides::default()
    };

    let config = apply_cli_overrides(base.clone(), &overrides);

    assert_eq!(config.width, 123);
    assert_eq!(config.wrap, WrapMode::Char);
    assert_eq!(config.height, base.height);
    assert_eq!(config.metric_budget, base.metric_budget);
}
