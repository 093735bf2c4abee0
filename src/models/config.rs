//! Configuration model loaded from external sources.
//!
//! The service reads layered YAML files plus `APP`-prefixed environment
//! variables once at startup. The populated [`ServiceConfig`] is validated
//! before anything binds a socket and is immutable afterwards; handlers see
//! it through shared app data only.

use std::env;
use std::fmt;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Base runtime settings for the HTTP listener.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct ServerConfig {
    pub name: String,
    pub host: String,
    #[validate(range(min = 1, message = "must be between 1 and 65535"))]
    pub port: u16,
    /// Client request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Access-token signing settings. The secret is sensitive and is kept out of
/// logs and error messages.
#[derive(Clone, Deserialize, Validate)]
pub struct AuthConfig {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub access_secret: String,
    /// Token validity window in seconds.
    #[validate(range(min = 1, message = "must be greater than zero"))]
    pub access_expire: i64,
}

/// Rotation pair for verifying tokens while the signing secret changes.
///
/// An empty `prev_secret` is the steady state: no rotation in progress,
/// only the current secret is accepted.
#[derive(Clone, Deserialize, Validate)]
pub struct TransConfig {
    #[validate(length(min = 1, message = "must not be empty"))]
    pub secret: String,
    #[serde(default)]
    pub prev_secret: String,
}

/// Aggregate configuration for the whole service.
#[derive(Clone, Debug, Deserialize)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub trans: TransConfig,
}

fn default_timeout() -> u64 {
    30
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"<redacted>")
            .field("access_expire", &self.access_expire)
            .finish()
    }
}

impl fmt::Debug for TransConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransConfig")
            .field("secret", &"<redacted>")
            .field("prev_secret", &"<redacted>")
            .finish()
    }
}

/// Errors produced while loading or validating configuration.
///
/// Messages name the offending field and the violated constraint, never the
/// supplied value: secrets must not leak through startup logs.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required field `{0}`")]
    MissingField(String),
    #[error("field `{field}` has the wrong type, expected {expected}")]
    TypeMismatch { field: String, expected: String },
    #[error("field `{field}` {constraint}")]
    ValidationFailed { field: String, constraint: String },
    #[error("unable to load configuration: {0}")]
    Load(String),
}

impl ServiceConfig {
    /// Load configuration the way the service does in production: the
    /// `config/default.yaml` base, an optional `config/{APP_ENV}.yaml`
    /// profile override, then `APP`-prefixed environment variables with
    /// `__` separating nested sections (e.g. `APP__AUTH__ACCESS_SECRET`).
    pub fn load() -> Result<Self, ConfigError> {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

        let settings = Config::builder()
            .add_source(File::with_name("config/default"))
            .add_source(File::with_name(&format!("config/{app_env}")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(classify)?;

        Self::from_settings(settings)
    }

    /// Load configuration from a single explicit file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(classify)?;

        Self::from_settings(settings)
    }

    /// Load configuration from a YAML document held in memory.
    pub fn from_yaml(document: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(document, FileFormat::Yaml))
            .build()
            .map_err(classify)?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<Self, ConfigError> {
        let config: Self = settings.try_deserialize().map_err(classify)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the domain constraints that the type system cannot express.
    /// Runs once as part of every load, before the service accepts traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (section, result) in [
            ("server", self.server.validate()),
            ("auth", self.auth.validate()),
            ("trans", self.trans.validate()),
        ] {
            if let Err(errors) = result {
                let (field, constraint) = first_violation(section, &errors)
                    .unwrap_or_else(|| (section.to_string(), "is invalid".to_string()));
                return Err(ConfigError::ValidationFailed { field, constraint });
            }
        }

        Ok(())
    }
}

/// Pick one violation out of a `validator` report and reduce it to a dotted
/// field path plus the constraint message. Violation parameters carry the
/// rejected value and never make it into the result.
fn first_violation(section: &str, errors: &ValidationErrors) -> Option<(String, String)> {
    errors.errors().iter().find_map(|(field, kind)| match kind {
        ValidationErrorsKind::Field(violations) => violations.first().map(|violation| {
            let constraint = violation
                .message
                .as_ref()
                .map(|message| message.to_string())
                .unwrap_or_else(|| format!("violates `{}`", violation.code));
            (format!("{section}.{field}"), constraint)
        }),
        _ => None,
    })
}

/// Sort a raw `config` crate error into the startup taxonomy. Only field
/// names and expectations survive; raw values are discarded.
fn classify(err: config::ConfigError) -> ConfigError {
    match err {
        config::ConfigError::NotFound(key) => ConfigError::MissingField(key),
        config::ConfigError::Type { key, expected, .. } => ConfigError::TypeMismatch {
            field: key.unwrap_or_else(|| "<unknown>".into()),
            expected: expected.to_string(),
        },
        config::ConfigError::Message(message) => classify_message(message),
        other => ConfigError::Load(other.to_string()),
    }
}

fn classify_message(message: String) -> ConfigError {
    if let Some(rest) = message.strip_prefix("missing field `") {
        if let Some(field) = rest.split('`').next() {
            return ConfigError::MissingField(field.to_string());
        }
    }

    // Serde type errors embed the offending value; keep only the expectation.
    if message.starts_with("invalid type") || message.starts_with("invalid value") {
        let expected = message
            .rsplit("expected ")
            .next()
            .map(str::to_string)
            .unwrap_or_else(|| "a different type".into());
        return ConfigError::TypeMismatch {
            field: "<unknown>".into(),
            expected,
        };
    }

    ConfigError::Load(message)
}
