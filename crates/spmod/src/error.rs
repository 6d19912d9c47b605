// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for spmod operations.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience Result type with spmod Error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during module file generation.
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Spec violates the concretization contract (caller bug)
    #[error("Malformed spec: {reason}")]
    #[diagnostic(
        code(spmod::malformed_spec),
        help("A concretized spec always carries a non-empty name and hash; fix the caller")
    )]
    MalformedSpec { reason: String },

    /// Configured backend identifier has no registered generator
    #[error("Unknown module backend: {name}")]
    #[diagnostic(
        code(spmod::unknown_backend),
        help("{}", suggestion_message(similar))
    )]
    UnknownBackend {
        name: String,
        similar: Vec<String>,
    },

    /// Environment operations on one variable cannot be ordered meaningfully
    #[error("Unresolvable environment conflict on {variable}: {detail}")]
    #[diagnostic(
        code(spmod::environment_conflict),
        help("Remove the unset, or declare a base value for the variable earlier in the chain")
    )]
    UnresolvableEnvironmentConflict {
        variable: String,
        detail: String,
    },

    /// Module file could not be written
    #[error("Failed to write module file: {path:?}")]
    #[diagnostic(code(spmod::write_failed))]
    WriteFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Module file could not be removed
    #[error("Failed to remove module file: {path:?}")]
    #[diagnostic(code(spmod::remove_failed))]
    RemoveFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Projection template references an unknown token or expands badly
    #[error("Invalid projection {projection:?}: {detail}")]
    #[diagnostic(
        code(spmod::invalid_projection),
        help("Valid tokens are {{name}}, {{version}}, {{hash}}, {{hash:N}}, {{compiler.name}}, {{compiler.version}}")
    )]
    InvalidProjection {
        projection: String,
        detail: String,
    },

    /// Invalid YAML in a spec or config file
    #[error("Invalid YAML: {error}")]
    #[diagnostic(code(spmod::invalid_yaml))]
    InvalidYaml {
        #[source]
        error: serde_yaml::Error,
        yaml_content: String,
    },

    /// Failed to read file
    #[error("Failed to read file: {path:?}")]
    #[diagnostic(code(spmod::read_failed))]
    ReadFailed {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Validation error
    #[error("Validation failed: {0}")]
    #[diagnostic(code(spmod::validation_failed))]
    ValidationFailed(String),

    /// IO error passthrough
    #[error(transparent)]
    #[diagnostic(code(spmod::io_error))]
    Io(#[from] std::io::Error),
}

fn suggestion_message(similar: &[String]) -> String {
    if similar.is_empty() {
        "Check the backend name in your modules.yaml".to_string()
    } else {
        format!("Did you mean one of: {}?", similar.join(", "))
    }
}
