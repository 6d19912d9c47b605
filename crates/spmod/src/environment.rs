// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Environment variable operations and the dependency-graph collector.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::PackageSpec;

#[cfg(test)]
#[path = "./environment_test.rs"]
mod environment_test;

/// Set a variable to a value, replacing any prior value.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct SetEnv {
    pub set: String,
    pub value: String,
}

/// Unset a variable entirely.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UnsetEnv {
    pub unset: String,
}

/// Prepend a value to a path-like variable.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PrependEnv {
    pub prepend: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

/// Append a value to a path-like variable.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AppendEnv {
    pub append: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

/// Remove a value from a path-like variable.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RemoveEnv {
    pub remove: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

/// A single environment variable operation.
///
/// Serialized field-keyed, so spec files read naturally:
///
/// ```yaml
/// environment:
///   - set: FOO
///     value: bar
///   - prepend: PATH
///     value: /opt/pkgs/foo/bin
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum EnvOp {
    Set(SetEnv),
    Unset(UnsetEnv),
    Prepend(PrependEnv),
    Append(AppendEnv),
    Remove(RemoveEnv),
}

impl EnvOp {
    /// The variable this operation targets.
    pub fn variable(&self) -> &str {
        match self {
            EnvOp::Set(op) => &op.set,
            EnvOp::Unset(op) => &op.unset,
            EnvOp::Prepend(op) => &op.prepend,
            EnvOp::Append(op) => &op.append,
            EnvOp::Remove(op) => &op.remove,
        }
    }

    /// Short operation name for messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            EnvOp::Set(_) => "set",
            EnvOp::Unset(_) => "unset",
            EnvOp::Prepend(_) => "prepend",
            EnvOp::Append(_) => "append",
            EnvOp::Remove(_) => "remove",
        }
    }
}

/// Ordered, conflict-resolved operations for one module render.
#[derive(Debug, Clone, Default)]
pub struct CollectedEnvironment {
    /// Operations in final render order.
    pub ops: Vec<EnvOp>,

    /// Recoverable conflicts encountered while merging.
    pub warnings: Vec<String>,
}

/// Collect environment operations across the spec's dependency graph.
///
/// The graph is walked depth-first in declaration order, dependencies
/// before dependents, and each node contributes exactly once: the visited
/// set is keyed by build hash, so diamond fan-in expressed as duplicate
/// structurally-equal subtrees still collapses to a single visit. The
/// resulting order means a dependent's prepend lands later in the list and
/// therefore closer to the front of PATH-like variables.
pub fn collect_environment(root: &PackageSpec) -> crate::Result<CollectedEnvironment> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut flat: Vec<&EnvOp> = Vec::new();
    collect_node(root, &mut seen, &mut flat);
    resolve_conflicts(&flat)
}

fn collect_node<'s>(
    spec: &'s PackageSpec,
    seen: &mut HashSet<&'s str>,
    out: &mut Vec<&'s EnvOp>,
) {
    if !seen.insert(spec.hash()) {
        return;
    }
    for dep in spec.dependencies() {
        collect_node(dep, seen, out);
    }
    out.extend(spec.declared_env_ops().iter());
}

/// Merge the flat operation list under the conflict policy.
///
/// Later `set` wins over an earlier `set` or `unset` on the same variable,
/// recorded as a warning. An `unset` drops everything before it on that
/// variable. A path operation after a surviving `unset` has no base value
/// to act on and fails the render.
fn resolve_conflicts(ops: &[&EnvOp]) -> crate::Result<CollectedEnvironment> {
    let mut resolved: Vec<EnvOp> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    for op in ops {
        match op {
            EnvOp::Set(set) => {
                for kind in drop_terminal_ops(&mut resolved, &set.set) {
                    let warning = format!(
                        "{} is assigned more than once: set overrides an earlier {}",
                        set.set, kind
                    );
                    tracing::warn!("{warning}");
                    warnings.push(warning);
                }
            }
            EnvOp::Unset(unset) => {
                let before = resolved.len();
                resolved.retain(|prior| prior.variable() != unset.unset);
                if resolved.len() != before {
                    let warning = format!(
                        "unset {} discards earlier operations on the same variable",
                        unset.unset
                    );
                    tracing::warn!("{warning}");
                    warnings.push(warning);
                }
            }
            EnvOp::Prepend(_) | EnvOp::Append(_) | EnvOp::Remove(_) => {
                let unset_pending = resolved
                    .iter()
                    .any(|prior| matches!(prior, EnvOp::Unset(u) if u.unset == op.variable()));
                if unset_pending {
                    return Err(crate::Error::UnresolvableEnvironmentConflict {
                        variable: op.variable().to_string(),
                        detail: format!(
                            "{} follows an unset and has no base value to act on",
                            op.kind_name()
                        ),
                    });
                }
            }
        }
        resolved.push((*op).clone());
    }

    Ok(CollectedEnvironment {
        ops: resolved,
        warnings,
    })
}

/// Drop earlier set/unset operations on `variable`, returning their kinds.
fn drop_terminal_ops(resolved: &mut Vec<EnvOp>, variable: &str) -> Vec<&'static str> {
    let mut dropped = Vec::new();
    resolved.retain(|op| {
        let terminal =
            matches!(op, EnvOp::Set(_) | EnvOp::Unset(_)) && op.variable() == variable;
        if terminal {
            dropped.push(op.kind_name());
        }
        !terminal
    });
    dropped
}
