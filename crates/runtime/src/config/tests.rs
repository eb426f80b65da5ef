use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;

const CONFIG: &str = r#"
	[dispatch]
	max_script_depth = 64
	max_dispatch_depth = 96
	no_ui = true

	[event_loop]
	max_sleep_ms = 20
"#;

#[test]
fn empty_config_uses_defaults() {
	let config = RuntimeConfig::from_toml_str("").unwrap();
	assert_eq!(config, RuntimeConfig::default());
	assert_eq!(config.dispatch_config(), DispatchConfig::default());
	assert_eq!(config.event_loop.max_sleep(), Duration::from_millis(250));
	assert_eq!(config.logging.filter, "info");
}

#[test]
fn sections_override_only_what_they_name() {
	let config = RuntimeConfig::from_toml_str(CONFIG).unwrap();

	let dispatch = config.dispatch_config();
	assert_eq!(dispatch.max_script_depth, 64);
	assert_eq!(dispatch.max_dispatch_depth, 96);
	assert!(dispatch.no_ui);
	assert_eq!(dispatch.program_name, "cardstack");
	assert_eq!(config.event_loop.max_sleep_ms, 20);
	assert!(!config.event_loop.high_priority_ping);
}

#[rstest]
#[case::unknown_section("[window]\nwidth = 3")]
#[case::unknown_key("[dispatch]\nmax_depth = 3")]
#[case::wrong_type("[event_loop]\nmax_sleep_ms = \"fast\"")]
fn malformed_config_is_a_parse_error(#[case] text: &str) {
	assert!(matches!(RuntimeConfig::from_toml_str(text), Err(ConfigError::Parse(_))));
}

#[rstest]
#[case::zero_depth("[dispatch]\nmax_script_depth = 0", "dispatch.max_script_depth")]
#[case::zero_dispatch_depth("[dispatch]\nmax_dispatch_depth = 0", "dispatch.max_dispatch_depth")]
#[case::zero_sleep("[event_loop]\nmax_sleep_ms = 0", "event_loop.max_sleep_ms")]
fn out_of_range_values_are_rejected(#[case] text: &str, #[case] expected: &str) {
	match RuntimeConfig::from_toml_str(text) {
		Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, expected),
		other => panic!("expected invalid value error, got {other:?}"),
	}
}

#[test]
fn load_reads_files_and_reports_missing_ones() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("runtime.toml");
	std::fs::write(&path, "[logging]\nfilter = \"cardstack=trace\"").unwrap();

	assert_eq!(RuntimeConfig::load(&path).unwrap().logging.filter, "cardstack=trace");

	let missing = dir.path().join("missing.toml");
	assert!(matches!(RuntimeConfig::load(&missing), Err(ConfigError::Io { path, .. }) if path == missing));
}
