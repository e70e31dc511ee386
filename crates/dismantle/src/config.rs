//! Settings resolution over an ordered list of named sources.
//!
//! The standard order is the process environment, then an optional TOML
//! secrets file, then built-in defaults. The first source that has a value
//! wins. Required values missing from every source are reported at startup.
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, File, FileFormat, Map, Value};
#[cfg(test)]
use mockall::automock;

use crate::aws::credentials::Credentials;
use crate::errors::ConfigError;
use crate::store::client::DEFAULT_ARTIFACT_PREFIX;

pub const REGION: &str = "AWS_REGION";
pub const AGENT_ID: &str = "AWS_AGENT_ID";
pub const AGENT_ALIAS_ID: &str = "AWS_AGENT_ALIAS_ID";
pub const BUCKET: &str = "AWS_S3_BUCKET";
pub const ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const AGENT_ENDPOINT: &str = "DISMANTLE_AGENT_ENDPOINT";
pub const STORE_ENDPOINT: &str = "DISMANTLE_STORE_ENDPOINT";
pub const ARTIFACT_PREFIX: &str = "DISMANTLE_ARTIFACT_PREFIX";
pub const AGENT_TIMEOUT_SECS: &str = "DISMANTLE_AGENT_TIMEOUT_SECS";
pub const ENABLE_TRACE: &str = "DISMANTLE_ENABLE_TRACE";
pub const SECRETS_FILE: &str = "DISMANTLE_SECRETS_FILE";

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_SECRETS_FILE: &str = "secrets.toml";

#[cfg_attr(test, automock)]
pub trait ConfigSource: Send + Sync {
    /// Shown in errors so users know where we looked.
    fn name(&self) -> String;
    fn get(&self, key: &str) -> Option<String>;
}

/// Process environment. Empty variables count as unset.
pub struct EnvironmentSource;

impl ConfigSource for EnvironmentSource {
    fn name(&self) -> String {
        "environment".to_string()
    }

    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|value| !value.trim().is_empty())
    }
}

/// A TOML secrets file. Keys may sit at the top level or inside any table,
/// e.g. `[aws_credentials]`.
pub struct SecretsFile {
    path: PathBuf,
    values: Map<String, Value>,
}

impl SecretsFile {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let secrets_error = |message: String| ConfigError::SecretsFile {
            path: path.display().to_string(),
            message,
        };

        let contents = fs::read_to_string(path).map_err(|e| secrets_error(e.to_string()))?;
        let values = Config::builder()
            .add_source(File::from_str(&contents, FileFormat::Toml))
            .build()
            .and_then(|config| config.try_deserialize::<Map<String, Value>>())
            .map_err(|e| secrets_error(e.to_string()))?;

        Ok(Self {
            path: path.to_path_buf(),
            values,
        })
    }

    /// Like [`Self::load`], but a file that does not exist is simply skipped.
    pub fn optional<P: AsRef<Path>>(path: P) -> Result<Option<Self>, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl ConfigSource for SecretsFile {
    fn name(&self) -> String {
        format!("secrets file {}", self.path.display())
    }

    fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = lookup(&self.values, key).and_then(scalar) {
            return Some(value);
        }
        self.values
            .values()
            .filter_map(|value| value.clone().into_table().ok())
            .find_map(|table| lookup(&table, key).and_then(scalar))
    }
}

// Key case is not guaranteed to survive loading.
fn lookup<'a>(table: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(key))
        .map(|(_, value)| value)
}

fn scalar(value: &Value) -> Option<String> {
    value
        .clone()
        .into_string()
        .ok()
        .filter(|s| !s.trim().is_empty())
}

/// Built-in fallbacks.
pub struct Defaults {
    values: HashMap<String, String>,
}

impl Defaults {
    pub fn new() -> Self {
        let values = [
            (REGION, DEFAULT_REGION),
            (ARTIFACT_PREFIX, DEFAULT_ARTIFACT_PREFIX),
            (ENABLE_TRACE, "true"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
        Self { values }
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigSource for Defaults {
    fn name(&self) -> String {
        "defaults".to_string()
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

pub fn resolve_first(key: &str, sources: &[&dyn ConfigSource]) -> Option<String> {
    sources.iter().find_map(|source| source.get(key))
}

pub struct ConfigResolver {
    sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigResolver {
    pub fn new(sources: Vec<Box<dyn ConfigSource>>) -> Self {
        Self { sources }
    }

    /// Environment, then the secrets file if present, then defaults.
    ///
    /// The secrets file path comes from `DISMANTLE_SECRETS_FILE`, else `secrets.toml`.
    pub fn standard() -> Result<Self, ConfigError> {
        let path = EnvironmentSource
            .get(SECRETS_FILE)
            .unwrap_or_else(|| DEFAULT_SECRETS_FILE.to_string());

        let mut sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(EnvironmentSource)];
        if let Some(secrets) = SecretsFile::optional(&path)? {
            sources.push(Box::new(secrets));
        }
        sources.push(Box::new(Defaults::new()));
        Ok(Self::new(sources))
    }

    pub fn resolve(&self, key: &str) -> Option<String> {
        let sources: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| s.as_ref()).collect();
        resolve_first(key, &sources)
    }

    pub fn require(&self, key: &str) -> Result<String, ConfigError> {
        self.resolve(key).ok_or_else(|| ConfigError::MissingValue {
            key: key.to_string(),
            sources: self
                .sources
                .iter()
                .map(|source| source.name())
                .collect::<Vec<_>>()
                .join(", "),
        })
    }
}

/// Everything the clients need, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub region: String,
    pub agent_id: String,
    pub agent_alias_id: String,
    pub bucket: String,
    pub credentials: Credentials,
    pub agent_endpoint: Option<String>,
    pub store_endpoint: Option<String>,
    pub artifact_prefix: String,
    pub agent_timeout: Option<Duration>,
    pub enable_trace: bool,
}

impl Settings {
    pub fn resolve(resolver: &ConfigResolver) -> Result<Self, ConfigError> {
        let mut credentials = Credentials::new(
            resolver.require(ACCESS_KEY_ID)?,
            resolver.require(SECRET_ACCESS_KEY)?,
        );
        if let Some(token) = resolver.resolve(SESSION_TOKEN) {
            credentials = credentials.with_session_token(token);
        }

        let agent_timeout = resolver
            .resolve(AGENT_TIMEOUT_SECS)
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| ConfigError::InvalidValue {
                        key: AGENT_TIMEOUT_SECS.to_string(),
                        message: format!("{:?}: {}", value, e),
                    })
            })
            .transpose()?;

        let enable_trace = match resolver.resolve(ENABLE_TRACE) {
            Some(value) => parse_flag(ENABLE_TRACE, &value)?,
            None => true,
        };

        Ok(Self {
            region: resolver.require(REGION)?,
            agent_id: resolver.require(AGENT_ID)?,
            agent_alias_id: resolver.require(AGENT_ALIAS_ID)?,
            bucket: resolver.require(BUCKET)?,
            credentials,
            agent_endpoint: resolver.resolve(AGENT_ENDPOINT),
            store_endpoint: resolver.resolve(STORE_ENDPOINT),
            artifact_prefix: resolver
                .resolve(ARTIFACT_PREFIX)
                .unwrap_or_else(|| DEFAULT_ARTIFACT_PREFIX.to_string()),
            agent_timeout,
            enable_trace,
        })
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected true or false, got {:?}", value),
        }),
    }
}
