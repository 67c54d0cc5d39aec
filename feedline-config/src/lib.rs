//! Loader for `feedline.yaml` with environment overlays.
//!
//! Sources are merged in order (YAML file or inline YAML, then
//! `FEEDLINE__`-prefixed environment variables with `__` as the nesting
//! separator), after which every string value has `${VAR}` placeholders
//! expanded. The merged tree is then deserialized into [`FeedlineConfig`].
use config::{Config, ConfigError, Environment, File};
use feedline_common::observability::{LogConfig, LogFormat};
use feedline_social::{InstagramCredentials, TwitterCredentials};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct FeedlineConfig {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub version: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub providers: Vec<ProviderSpec>,
}

impl FeedlineConfig {
    pub fn provider(&self, id: &str) -> Option<&ProviderSpec> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn enabled_providers(&self) -> impl Iterator<Item = &ProviderSpec> {
        self.providers.iter().filter(|p| p.is_enabled())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for p in &self.providers {
            if p.id.trim().is_empty() {
                return Err(ConfigError::Message("provider id must not be empty".into()));
            }
            if !seen.insert(p.id.as_str()) {
                return Err(ConfigError::Message(format!(
                    "duplicate provider id `{}`",
                    p.id
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default, deserialize_with = "lenient::bool")]
    pub emit_stderr: bool,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn to_log_config(&self, app_name: &'static str) -> LogConfig {
        let mut log = LogConfig {
            app_name,
            log_dir: self.dir.clone(),
            emit_stderr: self.emit_stderr,
            format: self.format,
            ..LogConfig::default()
        };
        if let Some(filter) = &self.filter {
            log.default_filter = filter.clone();
        }
        log
    }
}

/// Shared fields + the per-kind "details"
#[derive(Debug, Deserialize)]
pub struct ProviderSpec {
    pub id: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub details: ProviderDetails,
}

impl ProviderSpec {
    /// Entries without an `enabled` key are on.
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }
}

/// The tag is `kind`; the payload lives in `config`
#[derive(Debug, Deserialize)]
#[serde(tag = "kind")]
pub enum ProviderDetails {
    #[serde(rename = "twitter")]
    Twitter { config: TwitterConfig },

    #[serde(rename = "instagram")]
    Instagram { config: InstagramConfig },
}

#[derive(Debug, Deserialize)]
pub struct TwitterConfig {
    #[serde(flatten)]
    pub credentials: TwitterCredentials,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InstagramConfig {
    #[serde(flatten)]
    pub credentials: InstagramCredentials,
    /// A token from an earlier `instagram-auth` run.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Env overrides arrive as strings; accept those where YAML would give a scalar.
mod lenient {
    use super::*;

    pub fn opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s),
            Some(other) => Some(other.to_string()),
        })
    }

    pub fn bool<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
        match Value::deserialize(d)? {
            Value::Bool(b) => Ok(b),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("expected a boolean, got `{s}`"))),
            Value::Null => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "expected a boolean, got `{other}`"
            ))),
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct FeedlineConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for FeedlineConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedlineConfigLoader {
    /// Start with `FEEDLINE__` env overrides; add a file or inline YAML next.
    ///
    /// ```
    /// use feedline_config::FeedlineConfigLoader;
    ///
    /// let config = FeedlineConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nproviders: []")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert!(config.providers.is_empty());
    /// ```
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("FEEDLINE").separator("__"));
        Self { builder }
    }

    /// Attach a YAML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet.
    ///
    /// ```
    /// use feedline_config::{FeedlineConfigLoader, ProviderDetails};
    ///
    /// let cfg = FeedlineConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// version: "test"
    /// providers:
    ///   - id: "ig"
    ///     kind: "instagram"
    ///     config:
    ///       client_id: "id"
    ///       client_secret: "secret"
    ///       redirect_uri: "https://example.com/cb"
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.providers.len(), 1);
    /// assert!(cfg.providers[0].is_enabled());
    /// assert!(matches!(cfg.providers[0].details, ProviderDetails::Instagram { .. }));
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Build the merged sources, expand `${VAR}` placeholders and
    /// deserialize into [`FeedlineConfig`]. Duplicate or empty provider ids
    /// are rejected.
    pub fn load(self) -> Result<FeedlineConfig, ConfigError> {
        let cfg = self.builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: FeedlineConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed.validate()?;

        Ok(typed)
    }
}
