use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use hoard_fetch::ProcessorOptions;
use hoard_remote::{ApiClient, ApiError, PollOptions};
use hoard_sniff::AllowList;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variables that override the bookmark service settings.
pub const URL_ENV: &str = "HOARD_KARAKEEP_URL";
pub const TOKEN_ENV: &str = "HOARD_KARAKEEP_TOKEN";

static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ak1_[a-f0-9]{20}_[a-f0-9]{20}$").unwrap());

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub karakeep: KarakeepConfig,
    pub fileprocessor: FileProcessorConfig,
    pub logging: LoggingConfig,
}

/// Bookmark service endpoint and tagging wait policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KarakeepConfig {
    /// Server root; `/api/v1` is appended.
    pub url: String,
    pub token: Secret,
    /// Seconds between tagging status polls.
    pub interval: u64,
    pub max_attempts: Option<u32>,
    /// Seconds after which a pending bookmark is given up on.
    pub deadline: Option<u64>,
}

impl Default for KarakeepConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000".to_owned(),
            token: Secret::default(),
            interval: 5,
            max_attempts: None,
            deadline: None,
        }
    }
}

/// Download bounds and accepted content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileProcessorConfig {
    /// Empty means the OS temporary directory.
    pub tempdir: PathBuf,
    /// Bytes.
    pub maxsize: u64,
    /// Seconds.
    pub timeout: u64,
    /// Accepted media types. Empty accepts anything.
    pub mimetypes: Vec<String>,
}

impl Default for FileProcessorConfig {
    fn default() -> Self {
        Self {
            tempdir: PathBuf::new(),
            maxsize: 10 * 1024 * 1024,
            timeout: 30,
            mimetypes: vec![
                "image/jpeg".to_owned(),
                "image/png".to_owned(),
                "image/webp".to_owned(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// A string that never shows up in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Config {
    /// Read, apply environment overrides, and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&raw)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating. Missing keys take their defaults.
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Override the service URL and token from [`URL_ENV`] and [`TOKEN_ENV`]
    /// as reported by `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(URL_ENV) {
            self.karakeep.url = url;
        }
        if let Some(token) = lookup(TOKEN_ENV) {
            self.karakeep.token = Secret::new(token);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.karakeep.validate()?;
        self.fileprocessor.validate()?;
        self.logging.validate()
    }
}

impl KarakeepConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !hoard_remote::is_web_url(&self.url) {
            return Err(ConfigError::invalid(
                "url",
                format!("`{}` is not an http(s) URL with a host", self.url),
            ));
        }
        if !TOKEN_PATTERN.is_match(self.token.expose()) {
            return Err(ConfigError::invalid("token", "not a valid API key"));
        }
        if self.interval == 0 {
            return Err(ConfigError::invalid("interval", "must be a positive value"));
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigError::invalid("max_attempts", "must be a positive value"));
        }
        if self.deadline == Some(0) {
            return Err(ConfigError::invalid("deadline", "must be a positive value"));
        }
        Ok(())
    }

    pub fn poll_options(&self) -> PollOptions {
        PollOptions {
            interval: Duration::from_secs(self.interval),
            max_attempts: self.max_attempts,
            deadline: self.deadline.map(Duration::from_secs),
        }
    }

    /// A client authenticated with the configured token.
    pub fn api_client(&self) -> Result<ApiClient, ApiError> {
        ApiClient::builder(&self.url)
            .token(self.token.expose())
            .build()
    }
}

impl FileProcessorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maxsize == 0 {
            return Err(ConfigError::invalid("maxsize", "must be a positive value"));
        }
        if self.timeout == 0 {
            return Err(ConfigError::invalid("timeout", "must be a positive value"));
        }

        let mut seen = HashSet::new();
        for mime in &self.mimetypes {
            if mime.trim().is_empty() {
                return Err(ConfigError::invalid("mimetypes", "contains an empty entry"));
            }
            if !seen.insert(mime.as_str()) {
                return Err(ConfigError::invalid(
                    "mimetypes",
                    format!("contains duplicate entry '{mime}'"),
                ));
            }
        }
        Ok(())
    }

    pub fn processor_options(&self) -> ProcessorOptions {
        let options = ProcessorOptions::default()
            .max_bytes(self.maxsize)
            .timeout(Duration::from_secs(self.timeout));
        if self.tempdir.as_os_str().is_empty() {
            options
        } else {
            options.temp_dir(&self.tempdir)
        }
    }

    /// `None` when every media type is accepted.
    pub fn allow_list(&self) -> Option<AllowList> {
        if self.mimetypes.is_empty() {
            None
        } else {
            Some(AllowList::new(&self.mimetypes))
        }
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::invalid(
                "level",
                format!("`{other}` is not one of trace, debug, info, warn, error"),
            )),
        }
    }
}
