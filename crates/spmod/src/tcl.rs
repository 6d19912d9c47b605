// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! TCL modulefile rendering.

use crate::backend::{ModuleBackend, ModuleContext};
use crate::environment::EnvOp;

#[cfg(test)]
#[path = "./tcl_test.rs"]
mod tcl_test;

/// Renders classic TCL modulefiles.
pub struct TclBackend;

impl ModuleBackend for TclBackend {
    fn name(&self) -> &'static str {
        "tcl"
    }

    fn extension(&self) -> Option<&'static str> {
        // TCL module files are identified by the magic cookie, not a suffix
        None
    }

    fn render(&self, context: &ModuleContext) -> String {
        let mut out = String::new();
        out.push_str("#%Module1.0\n");
        out.push_str("##\n");
        out.push_str(&format!("## {}\n", context.key));
        out.push_str("## Generated module file, do not edit by hand.\n");
        out.push_str("##\n\n");

        let whatis = match &context.description {
            Some(description) => format!("{}: {}", context.name, description),
            None => context.name.clone(),
        };
        out.push_str(&format!("module-whatis \"{}\"\n\n", escape(&whatis)));

        out.push_str("proc ModulesHelp { } {\n");
        out.push_str(&format!(
            "    puts stderr \"Name   : {}\"\n",
            escape(&context.name)
        ));
        out.push_str(&format!(
            "    puts stderr \"Version: {}\"\n",
            escape(&context.version)
        ));
        if let Some(description) = &context.description {
            out.push_str("    puts stderr \"\"\n");
            out.push_str(&format!("    puts stderr \"{}\"\n", escape(description)));
        }
        if let Some(homepage) = &context.homepage {
            out.push_str(&format!(
                "    puts stderr \"Homepage: {}\"\n",
                escape(homepage)
            ));
        }
        out.push_str("}\n");

        if !context.conflicts.is_empty() {
            out.push('\n');
            for conflict in &context.conflicts {
                out.push_str(&format!("conflict {conflict}\n"));
            }
        }

        if !context.autoloads.is_empty() {
            out.push('\n');
            for autoload in &context.autoloads {
                out.push_str(&format!("module load {autoload}\n"));
            }
        }

        if !context.ops.is_empty() {
            out.push('\n');
            for op in &context.ops {
                out.push_str(&render_op(op));
            }
        }

        out
    }
}

fn render_op(op: &EnvOp) -> String {
    match op {
        EnvOp::Set(set) => format!("setenv {} \"{}\"\n", set.set, escape(&set.value)),
        EnvOp::Unset(unset) => format!("unsetenv {}\n", unset.unset),
        EnvOp::Prepend(p) => path_op("prepend-path", &p.prepend, &p.value, p.separator.as_deref()),
        EnvOp::Append(a) => path_op("append-path", &a.append, &a.value, a.separator.as_deref()),
        EnvOp::Remove(r) => path_op("remove-path", &r.remove, &r.value, r.separator.as_deref()),
    }
}

fn path_op(command: &str, variable: &str, value: &str, separator: Option<&str>) -> String {
    match separator {
        Some(sep) => format!(
            "{command} --delim \"{}\" {variable} \"{}\"\n",
            escape(sep),
            escape(value)
        ),
        None => format!("{command} {variable} \"{}\"\n", escape(value)),
    }
}

/// Escape a value for use inside a double-quoted TCL word.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '"' | '$' | '[' | ']' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
