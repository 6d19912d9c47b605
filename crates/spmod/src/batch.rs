// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Batch dispatch across enabled backends.
//!
//! Module generation is best-effort relative to the install or uninstall
//! it is attached to: every per-backend failure is captured as a report
//! entry, and only a malformed spec (a caller contract violation) makes
//! these functions return an error.

use std::path::PathBuf;

use crate::config::ModulesConfig;
use crate::generator::{Generator, RemoveOutcome, WriteOutcome};
use crate::{Error, PackageSpec};

#[cfg(test)]
#[path = "./batch_test.rs"]
mod batch_test;

/// What a successful backend operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleAction {
    Written,
    UpToDate,
    Removed,
    AlreadyAbsent,
}

impl std::fmt::Display for ModuleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            ModuleAction::Written => "written",
            ModuleAction::UpToDate => "up to date",
            ModuleAction::Removed => "removed",
            ModuleAction::AlreadyAbsent => "already absent",
        };
        f.write_str(text)
    }
}

/// Per-backend result of one batch entry.
#[derive(Debug)]
pub enum BackendResult {
    Done { action: ModuleAction, path: PathBuf },
    Excluded { pattern: String },
    Failed { error: Error },
}

/// One backend's contribution to a batch report.
#[derive(Debug)]
pub struct BackendOutcome {
    pub backend: String,
    pub result: BackendResult,
    pub warnings: Vec<String>,
}

/// Aggregated outcomes for one spec across all enabled backends.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BackendOutcome>,
}

impl BatchReport {
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Number of backends that completed their operation.
    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, BackendResult::Done { .. }))
            .count()
    }

    /// Number of backends skipped by filters.
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, BackendResult::Excluded { .. }))
            .count()
    }

    /// Number of backends that failed.
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.result, BackendResult::Failed { .. }))
            .count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Write module files for a spec across all enabled backends.
///
/// Every configured backend identifier is evaluated independently; a
/// misconfigured entry is reported and never prevents later entries from
/// running. An empty enabled set produces an empty report.
pub fn write_modules(spec: &PackageSpec, config: &ModulesConfig) -> crate::Result<BatchReport> {
    spec.validate()?;

    let mut report = BatchReport::default();
    for (name, settings) in config.enabled_backends() {
        let outcome = match Generator::from_backend_name(name, settings.clone()) {
            Err(error) => failed(name, error),
            Ok(generator) => match generator.write(spec) {
                Ok(WriteOutcome::Written { location, warnings }) => BackendOutcome {
                    backend: name.to_string(),
                    result: BackendResult::Done {
                        action: ModuleAction::Written,
                        path: location.path,
                    },
                    warnings,
                },
                Ok(WriteOutcome::UpToDate { location, warnings }) => BackendOutcome {
                    backend: name.to_string(),
                    result: BackendResult::Done {
                        action: ModuleAction::UpToDate,
                        path: location.path,
                    },
                    warnings,
                },
                Ok(WriteOutcome::Excluded { pattern }) => BackendOutcome {
                    backend: name.to_string(),
                    result: BackendResult::Excluded { pattern },
                    warnings: Vec::new(),
                },
                Err(error) => failed(name, error),
            },
        };
        report.outcomes.push(outcome);
    }

    Ok(report)
}

/// Remove module files for a spec across all enabled backends.
///
/// Removal ignores include/exclude filters: a module written under an
/// older configuration must still be removable, and one that was never
/// written reports `AlreadyAbsent` anyway.
pub fn remove_modules(spec: &PackageSpec, config: &ModulesConfig) -> crate::Result<BatchReport> {
    spec.validate()?;

    let mut report = BatchReport::default();
    for (name, settings) in config.enabled_backends() {
        let outcome = match Generator::from_backend_name(name, settings.clone()) {
            Err(error) => failed(name, error),
            Ok(generator) => match generator.remove(spec) {
                Ok(RemoveOutcome::Removed { location }) => BackendOutcome {
                    backend: name.to_string(),
                    result: BackendResult::Done {
                        action: ModuleAction::Removed,
                        path: location.path,
                    },
                    warnings: Vec::new(),
                },
                Ok(RemoveOutcome::AlreadyAbsent { location }) => BackendOutcome {
                    backend: name.to_string(),
                    result: BackendResult::Done {
                        action: ModuleAction::AlreadyAbsent,
                        path: location.path,
                    },
                    warnings: Vec::new(),
                },
                Err(error) => failed(name, error),
            },
        };
        report.outcomes.push(outcome);
    }

    Ok(report)
}

fn failed(backend: &str, error: Error) -> BackendOutcome {
    tracing::warn!(backend, %error, "module file operation failed");
    BackendOutcome {
        backend: backend.to_string(),
        result: BackendResult::Failed { error },
        warnings: Vec::new(),
    }
}
