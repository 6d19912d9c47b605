// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Spec file parsing and data types for concretized package specs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::environment::EnvOp;

#[cfg(test)]
#[path = "./spec_test.rs"]
mod spec_test;

/// API version for spec files.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum ApiVersion {
    #[serde(rename = "spmod/v0")]
    V0,
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::V0
    }
}

/// Helper for two-stage deserialization to determine API version first.
#[derive(Deserialize)]
struct ApiVersionMapping {
    #[serde(default)]
    api: ApiVersion,
}

/// Compiler the package was built with, when one applies.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CompilerSpec {
    pub name: String,
    pub version: String,
}

/// One fully concretized package build.
///
/// Specs are immutable once constructed; generators only borrow them for
/// the duration of a single write or remove call. Dependencies are nested
/// specs: diamond fan-in appears as structurally equal duplicate subtrees
/// and is collapsed by hash during collection, never by object identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PackageSpec {
    /// API version identifier.
    #[serde(default)]
    pub api: ApiVersion,

    /// Package name.
    pub name: String,

    /// Concrete version string.
    pub version: String,

    /// Opaque content hash, unique per concrete build.
    pub hash: String,

    /// Optional one-line description for module help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional upstream homepage for module help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,

    /// Compiler used for this build (drives hierarchical projections).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compiler: Option<CompilerSpec>,

    /// Install prefix on disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<PathBuf>,

    /// Environment variable operations declared by this package.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvOp>,

    /// Direct dependencies, in declaration order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<PackageSpec>,

    /// Path to the file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl PackageSpec {
    /// Parse spec from YAML string.
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
        match with_version.api {
            ApiVersion::V0 => {
                serde_yaml::from_value(value).map_err(|e| crate::Error::InvalidYaml {
                    error: e,
                    yaml_content: yaml,
                })
            }
        }
    }

    /// Load spec from file path.
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| crate::Error::ReadFailed {
            path: path.to_path_buf(),
            error: e,
        })?;

        let mut spec = Self::from_yaml(yaml)?;
        spec.source_path = Some(path.to_path_buf());
        Ok(spec)
    }

    /// Package name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Concrete version string.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Full build hash.
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Hash truncated to at most `length` characters.
    pub fn short_hash(&self, length: usize) -> &str {
        &self.hash[..length.min(self.hash.len())]
    }

    /// Direct dependencies, in declaration order.
    pub fn dependencies(&self) -> &[PackageSpec] {
        &self.dependencies
    }

    /// Environment operations declared by this package alone.
    pub fn declared_env_ops(&self) -> &[EnvOp] {
        &self.environment
    }

    /// Validate the concretization contract over the whole dependency tree.
    ///
    /// A concretized spec must carry a non-empty name and hash, and none of
    /// the fields that feed the naming policy may contain path separators
    /// or `..` segments.
    pub fn validate(&self) -> crate::Result<()> {
        self.validate_node()?;
        for dep in &self.dependencies {
            dep.validate()?;
        }
        Ok(())
    }

    fn validate_node(&self) -> crate::Result<()> {
        if self.name.is_empty() {
            return Err(crate::Error::MalformedSpec {
                reason: "spec has an empty name".to_string(),
            });
        }
        if self.hash.is_empty() {
            return Err(crate::Error::MalformedSpec {
                reason: format!("spec {} has an empty hash", self.name),
            });
        }
        if !self.hash.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(crate::Error::MalformedSpec {
                reason: format!("spec {} has a non-alphanumeric hash", self.name),
            });
        }

        check_path_safe("name", &self.name)?;
        check_path_safe("version", &self.version)?;
        if let Some(compiler) = &self.compiler {
            check_path_safe("compiler.name", &compiler.name)?;
            check_path_safe("compiler.version", &compiler.version)?;
        }
        Ok(())
    }
}

impl Default for PackageSpec {
    fn default() -> Self {
        Self {
            api: ApiVersion::default(),
            name: String::new(),
            version: String::new(),
            hash: String::new(),
            description: None,
            homepage: None,
            compiler: None,
            prefix: None,
            environment: Vec::new(),
            dependencies: Vec::new(),
            source_path: None,
        }
    }
}

/// Reject values that could escape the module root once joined into a path.
fn check_path_safe(field: &str, value: &str) -> crate::Result<()> {
    if value.contains('/') || value.contains('\\') || value.contains("..") {
        return Err(crate::Error::MalformedSpec {
            reason: format!("{field} {value:?} contains path separators"),
        });
    }
    Ok(())
}
