// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Per-backend generation settings loaded from modules.yaml.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::PackageSpec;

#[cfg(test)]
#[path = "./config_test.rs"]
mod config_test;

/// API version for config files.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum ConfigApiVersion {
    #[serde(rename = "spmod/v0/config")]
    V0,
}

impl Default for ConfigApiVersion {
    fn default() -> Self {
        Self::V0
    }
}

/// Helper for two-stage deserialization to determine API version first.
#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: ConfigApiVersion,
}

/// Which dependencies a module should load automatically.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Autoload {
    /// No dependency loads are emitted.
    #[default]
    None,
    /// Direct dependencies only.
    Direct,
    /// The full transitive closure.
    All,
}

/// Settings for one module backend.
///
/// Include and exclude filters take tokens of the form `name` or
/// `name@versionprefix`; a non-empty include list acts as an allowlist.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendSettings {
    /// Whether this backend participates in generation. Backends are
    /// opt-in: listing one without enabling it generates nothing.
    #[serde(default)]
    pub enable: bool,

    /// Hierarchy root directory module files are written under.
    pub root: PathBuf,

    /// Naming scheme for module keys.
    #[serde(default = "default_projection")]
    pub projection: String,

    /// Hash prefix length for hash tokens and hash-qualified fallbacks.
    #[serde(default = "default_hash_length")]
    pub hash_length: usize,

    /// Dependency autoload policy.
    #[serde(default)]
    pub autoload: Autoload,

    /// Allowlist of spec filters; empty means everything is eligible.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include: Vec<String>,

    /// Specs matching any of these filters are skipped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,

    /// Conflict declarations, as projection templates over the spec.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflict: Vec<String>,
}

fn default_projection() -> String {
    crate::DEFAULT_PROJECTION.to_string()
}

fn default_hash_length() -> usize {
    crate::DEFAULT_HASH_LENGTH
}

impl BackendSettings {
    /// Enabled settings with defaults for everything but the root.
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            enable: true,
            root: root.into(),
            projection: default_projection(),
            hash_length: default_hash_length(),
            autoload: Autoload::default(),
            include: Vec::new(),
            exclude: Vec::new(),
            conflict: Vec::new(),
        }
    }

    /// The filter that rules this spec out, if any.
    pub fn excluded_by(&self, spec: &PackageSpec) -> Option<String> {
        if !self.include.is_empty()
            && !self.include.iter().any(|token| matches_token(token, spec))
        {
            return Some("not in include list".to_string());
        }
        self.exclude
            .iter()
            .find(|token| matches_token(token, spec))
            .map(|token| format!("excluded by {token:?}"))
    }
}

/// Match a `name` or `name@versionprefix` filter token against a spec.
fn matches_token(token: &str, spec: &PackageSpec) -> bool {
    match token.split_once('@') {
        Some((name, version)) => spec.name() == name && spec.version().starts_with(version),
        None => spec.name() == token,
    }
}

/// Ordered backend-identifier to settings mapping.
///
/// Loaded once per invocation and immutable afterwards. An empty mapping,
/// or one with nothing enabled, means "generate nothing" and is not an
/// error.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModulesConfig {
    /// API version identifier.
    #[serde(default)]
    pub api: ConfigApiVersion,

    /// Backend identifier to settings, iterated in key order.
    #[serde(default)]
    pub backends: BTreeMap<String, BackendSettings>,

    /// Path to the file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Default for ModulesConfig {
    fn default() -> Self {
        Self {
            api: ConfigApiVersion::default(),
            backends: BTreeMap::new(),
            source_path: None,
        }
    }
}

impl ModulesConfig {
    /// Parse config from YAML string.
    pub fn from_yaml<S: Into<String>>(yaml: S) -> crate::Result<Self> {
        let yaml = yaml.into();

        // Stage 1: Parse to get API version
        let value: serde_yaml::Value =
            serde_yaml::from_str(&yaml).map_err(|e| crate::Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        let with_version: ApiVersionMapping =
            serde_yaml::from_value(value.clone()).map_err(|e| crate::Error::InvalidYaml {
                error: e,
                yaml_content: yaml.clone(),
            })?;

        // Stage 2: Deserialize based on version
        let mut config: Self = match with_version.api {
            ConfigApiVersion::V0 => {
                serde_yaml::from_value(value).map_err(|e| crate::Error::InvalidYaml {
                    error: e,
                    yaml_content: yaml,
                })?
            }
        };

        for settings in config.backends.values_mut() {
            settings.root = expand_root(&settings.root)?;
        }
        Ok(config)
    }

    /// Load config from file path.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| crate::Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;

        let mut config = Self::from_yaml(yaml)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Validate settings after loading.
    pub fn validate(&self) -> crate::Result<()> {
        for (name, settings) in &self.backends {
            if !settings.root.is_absolute() {
                return Err(crate::Error::ValidationFailed(format!(
                    "backend {name}: root {:?} is not absolute",
                    settings.root
                )));
            }
            if settings.projection.is_empty() {
                return Err(crate::Error::ValidationFailed(format!(
                    "backend {name}: projection is empty"
                )));
            }
            if settings.hash_length == 0 || settings.hash_length > 64 {
                return Err(crate::Error::ValidationFailed(format!(
                    "backend {name}: hash_length {} out of range 1..=64",
                    settings.hash_length
                )));
            }
        }
        Ok(())
    }

    /// Enabled backends, in deterministic identifier order.
    pub fn enabled_backends(&self) -> impl Iterator<Item = (&str, &BackendSettings)> {
        self.backends
            .iter()
            .filter(|(_, settings)| settings.enable)
            .map(|(name, settings)| (name.as_str(), settings))
    }

    /// Whether any backend is enabled at all.
    pub fn any_enabled(&self) -> bool {
        self.enabled_backends().next().is_some()
    }
}

/// Expand a leading `~` and normalize roots that already exist on disk.
fn expand_root(root: &Path) -> crate::Result<PathBuf> {
    let expanded = match root.to_str().and_then(|s| s.strip_prefix("~/")) {
        Some(rel) => {
            let home = dirs::home_dir().ok_or_else(|| {
                crate::Error::ValidationFailed("Cannot resolve ~ without HOME".to_string())
            })?;
            home.join(rel)
        }
        None => root.to_path_buf(),
    };

    if expanded.exists() {
        Ok(dunce::canonicalize(&expanded)?)
    } else {
        Ok(expanded)
    }
}
