// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! spmod - Environment-Module File Generation Engine
//!
//! This crate renders module files (TCL modulefiles, Lmod Lua modules) for
//! fully concretized package specs, and removes them again. Both operations
//! are idempotent and best-effort: a failing backend is reported, never
//! allowed to abort the install or uninstall it is attached to.
//!
//! # Overview
//!
//! A caller (install hook or CLI) hands the engine a [`PackageSpec`] and a
//! [`ModulesConfig`] naming the enabled backends. For each backend the
//! engine computes a deterministic module path, collects environment
//! operations across the spec's dependency graph, renders the module body
//! in the backend's syntax, and commits it with an atomic
//! write-to-temp-then-rename.
//!
//! # Example
//!
//! ```yaml
//! # zlib.spec.yaml
//! api: spmod/v0
//! name: zlib
//! version: 1.2.13
//! hash: o5m4u7qbnrfupuyxagy2vrnxfrgdxcp3
//!
//! environment:
//!   - set: ZLIB_ROOT
//!     value: /opt/pkgs/zlib-1.2.13
//!   - prepend: LD_LIBRARY_PATH
//!     value: /opt/pkgs/zlib-1.2.13/lib
//! ```

pub mod backend;
pub mod batch;
pub mod config;
pub mod environment;
pub mod error;
pub mod generator;
pub mod lua;
pub mod naming;
pub mod spec;
pub mod tcl;

pub use backend::{backend_for, ModuleBackend, ModuleContext, KNOWN_BACKENDS};
pub use batch::{
    remove_modules, write_modules, BackendOutcome, BackendResult, BatchReport, ModuleAction,
};
pub use config::{Autoload, BackendSettings, ModulesConfig};
pub use environment::{collect_environment, CollectedEnvironment, EnvOp};
pub use error::{Error, Result};
pub use generator::{Generator, ModulePreview, RemoveOutcome, WriteOutcome};
pub use naming::ModuleLocation;
pub use spec::{ApiVersion, CompilerSpec, PackageSpec};

/// Well-known filename for the modules configuration.
pub const MODULES_CONFIG_FILENAME: &str = "modules.yaml";

/// Projection applied when a backend does not configure one.
pub const DEFAULT_PROJECTION: &str = "{name}/{version}-{hash:7}";

/// Hash prefix length used when a projection must be hash-qualified.
pub const DEFAULT_HASH_LENGTH: usize = 7;
