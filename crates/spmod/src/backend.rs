// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Backend trait, render context, and the backend registry.

use crate::environment::EnvOp;

#[cfg(test)]
#[path = "./backend_test.rs"]
mod backend_test;

/// Backend identifiers with a registered generator.
pub const KNOWN_BACKENDS: &[&str] = &["lua", "tcl"];

/// Everything a renderer needs to produce one module file body.
///
/// Assembled by the generator from the spec, the naming policy, and the
/// collected environment; renderers treat it as read-only.
#[derive(Debug, Clone, Default)]
pub struct ModuleContext {
    /// Module key the file is loaded under.
    pub key: String,

    /// Package name.
    pub name: String,

    /// Concrete version string.
    pub version: String,

    /// Full build hash.
    pub hash: String,

    /// One-line description for whatis/help text.
    pub description: Option<String>,

    /// Upstream homepage for help text.
    pub homepage: Option<String>,

    /// Module keys this module conflicts with.
    pub conflicts: Vec<String>,

    /// Dependency module keys to load automatically.
    pub autoloads: Vec<String>,

    /// Ordered, conflict-resolved environment operations.
    pub ops: Vec<EnvOp>,
}

/// One module-system flavor.
///
/// `render` must be a pure function of the context: identical inputs
/// produce byte-identical output, which is what makes the generator's
/// content-hash no-op detection sound.
pub trait ModuleBackend {
    /// Registry identifier for this backend.
    fn name(&self) -> &'static str;

    /// File extension appended to module paths, if the flavor uses one.
    fn extension(&self) -> Option<&'static str>;

    /// Render the full module file body.
    fn render(&self, context: &ModuleContext) -> String;
}

/// Look up a backend generator by its configured identifier.
///
/// Unknown identifiers are a configuration problem and fail loudly; the
/// "module generation is globally disabled" case is decided by the caller
/// before this registry is ever consulted.
pub fn backend_for(name: &str) -> crate::Result<Box<dyn ModuleBackend>> {
    match name {
        "tcl" => Ok(Box::new(crate::tcl::TclBackend)),
        "lua" => Ok(Box::new(crate::lua::LuaBackend)),
        other => Err(crate::Error::UnknownBackend {
            name: other.to_string(),
            similar: similar_backends(other),
        }),
    }
}

fn similar_backends(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    KNOWN_BACKENDS
        .iter()
        .filter(|known| {
            lower.starts_with(&known[..1]) || known.contains(&lower) || lower.contains(*known)
        })
        .map(|known| known.to_string())
        .collect()
}
