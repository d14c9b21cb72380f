//! Publisher configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via BINTRAY_CONFIG)
//! 3. Environment variables
//!
//! Credentials are never read from the YAML file.

use crate::classify::RepoKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default REST API base URL.
pub const DEFAULT_API_URL: &str = "https://bintray.com/api/v1";

/// Default package name.
pub const DEFAULT_PACKAGE: &str = "libteonet";

/// Default description attached to created versions.
pub const DEFAULT_DESCRIPTION: &str = "Teonet network library";

/// Default number of files kept per retention group.
pub const DEFAULT_RETENTION_KEEP: usize = 5;

/// Publisher configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BintrayConfig {
    /// REST API base URL.
    pub api_url: String,
    /// Account name (BINTRAY_USER).
    #[serde(skip)]
    pub user: Option<String>,
    /// API key (BINTRAY_PASS).
    #[serde(skip)]
    pub pass: Option<String>,
    /// Organisation owning the repositories; falls back to `user`.
    pub org: Option<String>,
    /// Remote repository name overriding the classified one.
    pub repo: Option<String>,
    /// Debian component overriding the derived one.
    pub component: Option<String>,
    /// Package name.
    pub package: String,
    /// Description for created versions.
    pub description: String,
    /// Files kept per group by `prune`.
    pub retention_keep: usize,
}

impl Default for BintrayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user: None,
            pass: None,
            org: None,
            repo: None,
            component: None,
            package: DEFAULT_PACKAGE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            retention_keep: DEFAULT_RETENTION_KEEP,
        }
    }
}

impl BintrayConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Loads configuration using `lookup` in place of the process environment.
    pub fn load_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match non_empty(&lookup, "BINTRAY_CONFIG") {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_env_overrides(&lookup);

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e))?;
        let config: BintrayConfig = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;
        Ok(config)
    }

    fn apply_env_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(user) = non_empty(lookup, "BINTRAY_USER") {
            self.user = Some(user);
        }
        if let Some(pass) = non_empty(lookup, "BINTRAY_PASS") {
            self.pass = Some(pass);
        }
        if let Some(repo) = non_empty(lookup, "BINTRAY_REPO") {
            self.repo = Some(repo);
        }
        if let Some(component) = non_empty(lookup, "BINTRAY_COMPONENT") {
            self.component = Some(component);
        }
        if let Some(org) = non_empty(lookup, "BINTRAY_ORG") {
            self.org = Some(org);
        }
        if let Some(api) = non_empty(lookup, "BINTRAY_API") {
            self.api_url = api;
        }
    }

    /// Returns `(user, pass)` or `MissingCredentials`.
    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        match (self.user.as_deref(), self.pass.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Ok((user, pass)),
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    /// Organisation used in REST paths.
    pub fn org(&self) -> &str {
        self.org
            .as_deref()
            .or(self.user.as_deref())
            .unwrap_or_default()
    }

    /// Remote repository for artifacts of `kind`.
    pub fn repo_for(&self, kind: RepoKind) -> String {
        self.repo
            .clone()
            .unwrap_or_else(|| kind.as_str().to_string())
    }
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

/// Configuration error.
#[derive(Debug)]
pub enum ConfigError {
    IoError(PathBuf, std::io::Error),
    ParseError(PathBuf, String),
    MissingCredentials,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, e) => {
                write!(f, "failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::MissingCredentials => {
                write!(f, "No credentials: BINTRAY_USER and BINTRAY_PASS must be set")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
