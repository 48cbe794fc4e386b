// Config loading and validation tests

use utilization_report::config::{AppConfig, BackendKind, SheetFormat};
use utilization_report::controller::ControllerConfig;

const VALID_CONFIG: &str = r#"
[backend]
kind = "http"
base_url = "https://metrics.internal.example"
timeout_secs = 20
max_retries = 3
period_seconds = 3600

[auth]
token_dir = "/var/lib/reports/tokens"
login_command = ["aws", "sso", "login", "--profile", "{profile}"]
max_reauth_attempts = 1

[output]
directory = "reports"
format = "csv"
charts = false

[report]
network_capacity_mbps = 2500.0
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.backend.kind, BackendKind::Http);
    assert_eq!(config.backend.base_url, "https://metrics.internal.example");
    assert_eq!(config.backend.timeout_secs, 20);
    assert_eq!(config.backend.max_retries, 3);
    assert_eq!(config.auth.token_dir, "/var/lib/reports/tokens");
    assert_eq!(config.output.format, SheetFormat::Csv);
    assert!(!config.output.charts);
    assert_eq!(config.report.network_capacity_mbps, 2500.0);
}

#[test]
fn test_config_defaults_for_omitted_sections() {
    let config = AppConfig::load_from_str(
        r#"
[backend]
kind = "fixture"
fixture_path = "demos/fixture.json"
"#,
    )
    .expect("defaults");
    assert_eq!(config.backend.timeout_secs, 30);
    assert_eq!(config.backend.max_retries, 2);
    assert_eq!(config.backend.period_seconds, 3600);
    assert_eq!(config.auth.max_reauth_attempts, 1);
    assert_eq!(config.auth.token_dir, ".tokens");
    assert!(!config.auth.login_prints_token);
    assert_eq!(config.output.directory, ".");
    assert_eq!(config.output.format, SheetFormat::Xlsx);
    assert!(config.output.charts);
    assert_eq!(config.report.network_capacity_mbps, 1000.0);
}

#[test]
fn test_controller_config_from_app_config() {
    let config = AppConfig::load_from_str(VALID_CONFIG).unwrap();
    let controller = ControllerConfig::from(&config);
    assert_eq!(controller.output_directory.to_str(), Some("reports"));
    assert_eq!(controller.period_seconds, 3600);
    assert_eq!(controller.max_reauth_attempts, 1);
}

#[test]
fn test_config_validation_rejects_empty_base_url() {
    let bad = VALID_CONFIG.replace(
        "base_url = \"https://metrics.internal.example\"",
        "base_url = \"\"",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("backend.base_url"));
}

#[test]
fn test_config_validation_rejects_fixture_without_path() {
    let bad = VALID_CONFIG.replace("kind = \"http\"", "kind = \"fixture\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("backend.fixture_path"));
}

#[test]
fn test_config_validation_rejects_zero_timeout() {
    let bad = VALID_CONFIG.replace("timeout_secs = 20", "timeout_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("backend.timeout_secs"));
}

#[test]
fn test_config_validation_rejects_odd_period() {
    let bad = VALID_CONFIG.replace("period_seconds = 3600", "period_seconds = 90");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("backend.period_seconds"));
}

#[test]
fn test_config_validation_rejects_unbounded_reauth() {
    let bad = VALID_CONFIG.replace("max_reauth_attempts = 1", "max_reauth_attempts = 9");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("auth.max_reauth_attempts"));
}

#[test]
fn test_config_validation_rejects_empty_login_command() {
    let bad = VALID_CONFIG.replace(
        "login_command = [\"aws\", \"sso\", \"login\", \"--profile\", \"{profile}\"]",
        "login_command = []",
    );
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("auth.login_command"));
}

#[test]
fn test_config_validation_rejects_non_positive_capacity() {
    let bad = VALID_CONFIG.replace("network_capacity_mbps = 2500.0", "network_capacity_mbps = 0.0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("report.network_capacity_mbps"));
}

#[test]
fn test_config_rejects_unknown_format() {
    let bad = VALID_CONFIG.replace("format = \"csv\"", "format = \"pdf\"");
    assert!(AppConfig::load_from_str(&bad).is_err());
}

#[test]
fn test_config_load_reads_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, VALID_CONFIG).unwrap();
    let config = AppConfig::load(path.to_str()).expect("load");
    assert_eq!(config.output.directory, "reports");
}

#[test]
fn test_config_load_missing_file_names_path() {
    let err = AppConfig::load(Some("/nonexistent/report-config.toml")).unwrap_err();
    assert!(err.to_string().contains("/nonexistent/report-config.toml"));
}
