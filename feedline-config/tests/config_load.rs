use feedline_common::observability::LogFormat;
use feedline_config::{FeedlineConfigLoader, ProviderDetails};
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const FILE_YAML: &str = r#"
version: "1"
logging:
  format: json
  filter: info
providers:
  - id: twitter-main
    kind: twitter
    enabled: true
    config:
      consumer_key: "${TW_CONSUMER_KEY}"
      consumer_secret: "${TW_CONSUMER_SECRET}"
      access_token_key: "token-key"
      access_token_secret: "token-secret"
      screen_name: "alice"
  - id: instagram-main
    kind: instagram
    enabled: false
    config:
      client_id: "ig-client"
      client_secret: "${IG_SECRET}"
      redirect_uri: "https://example.com/callback"
      base_url: "http://localhost:9999"
"#;

#[test]
#[serial]
fn file_with_env_placeholders_loads() {
    let tmp = TempDir::new().unwrap();
    let p = write_yaml(&tmp, "feedline.yaml", FILE_YAML);

    temp_env::with_vars(
        [
            ("TW_CONSUMER_KEY", Some("ck-from-env")),
            ("TW_CONSUMER_SECRET", Some("cs-from-env")),
            ("IG_SECRET", Some("ig-secret-from-env")),
        ],
        || {
            let config = FeedlineConfigLoader::new()
                .with_file(&p)
                .load()
                .expect("load feedline config");

            assert_eq!(config.version.as_deref(), Some("1"));
            assert_eq!(config.logging.format, LogFormat::Json);
            assert_eq!(config.providers.len(), 2);

            match &config.provider("twitter-main").unwrap().details {
                ProviderDetails::Twitter { config } => {
                    assert_eq!(config.credentials.consumer_key, "ck-from-env");
                    assert_eq!(config.credentials.consumer_secret, "cs-from-env");
                    assert_eq!(config.credentials.screen_name, "alice");
                    assert!(config.base_url.is_none());
                }
                other => panic!("expected twitter entry, got {other:?}"),
            }

            match &config.provider("instagram-main").unwrap().details {
                ProviderDetails::Instagram { config } => {
                    assert_eq!(config.credentials.client_secret, "ig-secret-from-env");
                    assert_eq!(config.base_url.as_deref(), Some("http://localhost:9999"));
                    assert!(config.access_token.is_none());
                }
                other => panic!("expected instagram entry, got {other:?}"),
            }

            let enabled: Vec<_> = config.enabled_providers().map(|p| p.id.as_str()).collect();
            assert_eq!(enabled, vec!["twitter-main"]);
        },
    );
}

#[test]
#[serial]
fn env_overrides_win_over_yaml() {
    temp_env::with_vars(
        [
            ("FEEDLINE__LOGGING__FILTER", Some("feedline=trace")),
            ("FEEDLINE__LOGGING__EMIT_STDERR", Some("true")),
        ],
        || {
            let config = FeedlineConfigLoader::new()
                .with_yaml_str("version: '1'\nlogging:\n  filter: warn\nproviders: []")
                .load()
                .expect("load with env overrides");

            assert_eq!(config.logging.filter.as_deref(), Some("feedline=trace"));
            assert!(config.logging.emit_stderr);
        },
    );
}

#[test]
#[serial]
fn missing_file_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let result = FeedlineConfigLoader::new()
        .with_file(tmp.path().join("absent.yaml"))
        .load();
    assert!(result.is_err());
}

#[test]
#[serial]
fn unknown_kind_is_rejected() {
    let result = FeedlineConfigLoader::new()
        .with_yaml_str(
            r#"
providers:
  - id: mastodon
    kind: mastodon
    config: {}
"#,
        )
        .load();
    assert!(result.is_err());
}

#[test]
#[serial]
fn missing_credential_field_is_rejected() {
    let result = FeedlineConfigLoader::new()
        .with_yaml_str(
            r#"
providers:
  - id: twitter-main
    kind: twitter
    config:
      consumer_key: "ck"
"#,
        )
        .load();
    let err = result.unwrap_err().to_string();
    assert!(err.contains("missing field"), "{err}");
}
