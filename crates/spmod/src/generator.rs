// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Per-backend module generator: render, idempotent write, idempotent remove.

use std::collections::HashSet;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use sha2::{Digest, Sha256};

use crate::backend::{backend_for, ModuleBackend, ModuleContext};
use crate::config::{Autoload, BackendSettings};
use crate::environment::collect_environment;
use crate::naming::{self, ModuleLocation};
use crate::PackageSpec;

#[cfg(test)]
#[path = "./generator_test.rs"]
mod generator_test;

/// A rendered module body that has not been written anywhere.
#[derive(Debug, Clone)]
pub struct ModulePreview {
    pub location: ModuleLocation,
    pub body: String,
    pub warnings: Vec<String>,
}

/// Result of one `write` call.
#[derive(Debug)]
pub enum WriteOutcome {
    /// A new or changed module file was committed.
    Written {
        location: ModuleLocation,
        warnings: Vec<String>,
    },
    /// The file already holds identical content; nothing was touched.
    UpToDate {
        location: ModuleLocation,
        warnings: Vec<String>,
    },
    /// An include/exclude filter ruled the spec out for this backend.
    Excluded { pattern: String },
}

/// Result of one `remove` call.
#[derive(Debug)]
pub enum RemoveOutcome {
    Removed { location: ModuleLocation },
    /// Removing a module that was never written is a successful no-op.
    AlreadyAbsent { location: ModuleLocation },
}

/// Generates and retires module files for one backend.
///
/// Holds only the backend and its settings; specs are borrowed per call.
/// Repeated `write` or `remove` calls for the same spec have no cumulative
/// effect beyond the first successful mutation.
pub struct Generator {
    backend: Box<dyn ModuleBackend>,
    settings: BackendSettings,
}

impl Generator {
    pub fn new(backend: Box<dyn ModuleBackend>, settings: BackendSettings) -> Self {
        Self { backend, settings }
    }

    /// Construct via the backend registry.
    pub fn from_backend_name(name: &str, settings: BackendSettings) -> crate::Result<Self> {
        Ok(Self::new(backend_for(name)?, settings))
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Deterministic module location for a spec under this backend.
    pub fn location(&self, spec: &PackageSpec) -> crate::Result<ModuleLocation> {
        naming::project(spec, &self.settings, self.backend.extension())
    }

    /// Render the module body without touching the filesystem.
    ///
    /// Ignores include/exclude filters: previewing an excluded spec is
    /// still meaningful for inspection commands.
    pub fn preview(&self, spec: &PackageSpec) -> crate::Result<ModulePreview> {
        let location = self.location(spec)?;
        let collected = collect_environment(spec)?;
        let context = self.build_context(spec, &location, collected.ops)?;
        let body = self.backend.render(&context);
        Ok(ModulePreview {
            location,
            body,
            warnings: collected.warnings,
        })
    }

    /// Create or update the module file for a spec.
    ///
    /// The commit is a write-to-temp-then-rename in the target directory,
    /// so a crash mid-write leaves either the previous file or nothing.
    pub fn write(&self, spec: &PackageSpec) -> crate::Result<WriteOutcome> {
        if let Some(pattern) = self.settings.excluded_by(spec) {
            tracing::debug!(
                backend = self.backend.name(),
                spec = spec.name(),
                %pattern,
                "module write skipped by filter"
            );
            return Ok(WriteOutcome::Excluded { pattern });
        }

        let ModulePreview {
            location,
            body,
            warnings,
        } = self.preview(spec)?;

        if file_matches(&location.path, &body) {
            tracing::debug!(path = %location.path.display(), "module file already up to date");
            return Ok(WriteOutcome::UpToDate { location, warnings });
        }

        let parent = module_parent(&location.path)?;
        fs::create_dir_all(parent).map_err(|error| crate::Error::WriteFailed {
            path: location.path.clone(),
            error,
        })?;

        let _lock = PathLock::acquire(&location.path).map_err(|error| {
            crate::Error::WriteFailed {
                path: location.path.clone(),
                error,
            }
        })?;

        // Re-check under the lock: a concurrent writer may have committed
        // identical content between the first check and lock acquisition.
        if file_matches(&location.path, &body) {
            tracing::debug!(path = %location.path.display(), "module file already up to date");
            return Ok(WriteOutcome::UpToDate { location, warnings });
        }

        let mut staged =
            tempfile::NamedTempFile::new_in(parent).map_err(|error| crate::Error::WriteFailed {
                path: location.path.clone(),
                error,
            })?;
        staged
            .write_all(body.as_bytes())
            .map_err(|error| crate::Error::WriteFailed {
                path: location.path.clone(),
                error,
            })?;
        staged
            .persist(&location.path)
            .map_err(|persist| crate::Error::WriteFailed {
                path: location.path.clone(),
                error: persist.error,
            })?;

        tracing::debug!(path = %location.path.display(), "module file written");
        Ok(WriteOutcome::Written { location, warnings })
    }

    /// Delete the module file for a spec.
    ///
    /// The path is recomputed from the spec, so removal finds exactly what
    /// `write` created. An absent file is a successful no-op.
    pub fn remove(&self, spec: &PackageSpec) -> crate::Result<RemoveOutcome> {
        let location = self.location(spec)?;

        if !location.path.exists() {
            tracing::debug!(path = %location.path.display(), "module file already absent");
            return Ok(RemoveOutcome::AlreadyAbsent { location });
        }

        let _lock = PathLock::acquire(&location.path).map_err(|error| {
            crate::Error::RemoveFailed {
                path: location.path.clone(),
                error,
            }
        })?;

        match fs::remove_file(&location.path) {
            Ok(()) => {
                tracing::debug!(path = %location.path.display(), "module file removed");
                Ok(RemoveOutcome::Removed { location })
            }
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                Ok(RemoveOutcome::AlreadyAbsent { location })
            }
            Err(error) => Err(crate::Error::RemoveFailed {
                path: location.path.clone(),
                error,
            }),
        }
    }

    fn build_context(
        &self,
        spec: &PackageSpec,
        location: &ModuleLocation,
        ops: Vec<crate::EnvOp>,
    ) -> crate::Result<ModuleContext> {
        let mut conflicts = Vec::new();
        for template in &self.settings.conflict {
            let (expanded, _) =
                naming::expand_projection(template, spec, self.settings.hash_length)?;
            conflicts.push(expanded);
        }

        Ok(ModuleContext {
            key: location.key.clone(),
            name: spec.name().to_string(),
            version: spec.version().to_string(),
            hash: spec.hash().to_string(),
            description: spec.description.clone(),
            homepage: spec.homepage.clone(),
            conflicts,
            autoloads: self.autoload_keys(spec)?,
            ops,
        })
    }

    /// Module keys of dependencies to load, per the autoload policy.
    fn autoload_keys(&self, spec: &PackageSpec) -> crate::Result<Vec<String>> {
        let deps: Vec<&PackageSpec> = match self.settings.autoload {
            Autoload::None => return Ok(Vec::new()),
            Autoload::Direct => spec.dependencies().iter().collect(),
            Autoload::All => {
                let mut seen = HashSet::new();
                let mut ordered = Vec::new();
                transitive_deps(spec, &mut seen, &mut ordered);
                ordered
            }
        };

        deps.into_iter()
            .map(|dep| self.location(dep).map(|location| location.key))
            .collect()
    }
}

/// Transitive dependencies, dependencies-first, each hash once.
fn transitive_deps<'s>(
    spec: &'s PackageSpec,
    seen: &mut HashSet<&'s str>,
    out: &mut Vec<&'s PackageSpec>,
) {
    for dep in spec.dependencies() {
        if seen.insert(dep.hash()) {
            transitive_deps(dep, seen, out);
            out.push(dep);
        }
    }
}

fn module_parent(path: &Path) -> crate::Result<&Path> {
    path.parent().ok_or_else(|| crate::Error::WriteFailed {
        path: path.to_path_buf(),
        error: std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "module path has no parent directory",
        ),
    })
}

fn content_digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Whether the file at `path` already holds exactly `body`.
fn file_matches(path: &Path, body: &str) -> bool {
    match fs::read(path) {
        Ok(existing) => content_digest(&existing) == content_digest(body.as_bytes()),
        Err(_) => false,
    }
}

/// Exclusive advisory lock scoped to one module file path.
///
/// The lock file sits next to the target and is left in place after the
/// operation; deleting it would race other holders.
struct PathLock {
    file: fs::File,
}

impl PathLock {
    fn acquire(target: &Path) -> std::io::Result<Self> {
        let file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .open(lock_path_for(target))?;
        file.lock_exclusive()?;
        Ok(Self { file })
    }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn lock_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.lock"))
}
