// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Deterministic mapping from a spec to a module key and file path.

use std::path::PathBuf;

use crate::config::BackendSettings;
use crate::PackageSpec;

#[cfg(test)]
#[path = "./naming_test.rs"]
mod naming_test;

/// Placeholder for compiler tokens when a spec has no compiler.
pub const NO_COMPILER: &str = "none";

/// Where a module file lives and the key it is loaded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleLocation {
    /// Absolute path of the module file.
    pub path: PathBuf,

    /// Module key as presented to the module system (no extension).
    pub key: String,
}

/// Compute the module location for a spec under one backend's settings.
///
/// Pure function of its inputs: the same spec, settings, and extension
/// produce the same location on every call and across process restarts,
/// so a later `remove` can find what `write` created.
///
/// Projections without a hash token cannot distinguish two builds that
/// differ only in hash (hierarchical schemes keyed on compiler and
/// version are the usual case), so the expansion is hash-qualified with
/// a truncated hash suffix and the fallback is logged.
pub fn project(
    spec: &PackageSpec,
    settings: &BackendSettings,
    extension: Option<&str>,
) -> crate::Result<ModuleLocation> {
    let (mut key, saw_hash) = expand_projection(&settings.projection, spec, settings.hash_length)?;

    for component in key.split('/') {
        if component.is_empty() || component == "." || component == ".." {
            return Err(crate::Error::InvalidProjection {
                projection: settings.projection.clone(),
                detail: format!("expanded to unsafe path component {component:?}"),
            });
        }
    }

    if !saw_hash {
        key = format!("{key}-{}", spec.short_hash(settings.hash_length));
        tracing::debug!(
            key = %key,
            projection = %settings.projection,
            "projection has no hash token, hash-qualifying module name"
        );
    }

    let relative = match extension {
        Some(ext) => format!("{key}.{ext}"),
        None => key.clone(),
    };

    Ok(ModuleLocation {
        path: settings.root.join(relative),
        key,
    })
}

/// Expand projection tokens against a spec.
///
/// Returns the expansion and whether any hash token appeared.
pub(crate) fn expand_projection(
    projection: &str,
    spec: &PackageSpec,
    hash_length: usize,
) -> crate::Result<(String, bool)> {
    let mut out = String::with_capacity(projection.len());
    let mut saw_hash = false;
    let mut rest = projection;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open + 1..];
        let close = tail.find('}').ok_or_else(|| crate::Error::InvalidProjection {
            projection: projection.to_string(),
            detail: "unterminated token".to_string(),
        })?;
        let token = &tail[..close];

        match token {
            "name" => out.push_str(spec.name()),
            "version" => out.push_str(spec.version()),
            "hash" => {
                out.push_str(spec.short_hash(hash_length));
                saw_hash = true;
            }
            "compiler.name" => {
                out.push_str(spec.compiler.as_ref().map_or(NO_COMPILER, |c| c.name.as_str()))
            }
            "compiler.version" => {
                out.push_str(
                    spec.compiler
                        .as_ref()
                        .map_or(NO_COMPILER, |c| c.version.as_str()),
                )
            }
            _ => {
                if let Some(length) = token.strip_prefix("hash:") {
                    let length: usize =
                        length
                            .parse()
                            .ok()
                            .filter(|n| *n > 0)
                            .ok_or_else(|| crate::Error::InvalidProjection {
                                projection: projection.to_string(),
                                detail: format!("bad hash length in {{{token}}}"),
                            })?;
                    out.push_str(spec.short_hash(length));
                    saw_hash = true;
                } else {
                    return Err(crate::Error::InvalidProjection {
                        projection: projection.to_string(),
                        detail: format!("unknown token {{{token}}}"),
                    });
                }
            }
        }

        rest = &tail[close + 1..];
    }
    out.push_str(rest);

    Ok((out, saw_hash))
}
