// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Lmod (Lua) module file rendering.

use crate::backend::{ModuleBackend, ModuleContext};
use crate::environment::EnvOp;

#[cfg(test)]
#[path = "./lua_test.rs"]
mod lua_test;

/// Renders Lmod Lua module files.
pub struct LuaBackend;

impl ModuleBackend for LuaBackend {
    fn name(&self) -> &'static str {
        "lua"
    }

    fn extension(&self) -> Option<&'static str> {
        Some("lua")
    }

    fn render(&self, context: &ModuleContext) -> String {
        let mut out = String::new();
        out.push_str("-- -*- lua -*-\n");
        out.push_str(&format!("-- {}\n", context.key));
        out.push_str("-- Generated module file, do not edit by hand.\n\n");

        out.push_str("help([[");
        out.push_str(&help_body(context));
        out.push_str("]])\n\n");

        out.push_str(&format!("whatis(\"Name : {}\")\n", escape(&context.name)));
        out.push_str(&format!(
            "whatis(\"Version : {}\")\n",
            escape(&context.version)
        ));
        if let Some(description) = &context.description {
            out.push_str(&format!("whatis(\"Description : {}\")\n", escape(description)));
        }

        if !context.conflicts.is_empty() {
            out.push('\n');
            for conflict in &context.conflicts {
                out.push_str(&format!("conflict(\"{}\")\n", escape(conflict)));
            }
        }

        if !context.autoloads.is_empty() {
            out.push('\n');
            for autoload in &context.autoloads {
                out.push_str(&format!("depends_on(\"{}\")\n", escape(autoload)));
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

fn help_body(context: &ModuleContext) -> String {
    let mut body = format!(
        "Name   : {}\nVersion: {}\n",
        context.name, context.version
    );
    if let Some(description) = &context.description {
        body.push('\n');
        body.push_str(description);
        body.push('\n');
    }
    if let Some(homepage) = &context.homepage {
        body.push_str(&format!("Homepage: {homepage}\n"));
    }
    // Long bracket strings cannot contain a closing bracket pair
    body.replace("]]", "] ]")
}

fn render_op(op: &EnvOp) -> String {
    match op {
        EnvOp::Set(set) => format!(
            "setenv(\"{}\", \"{}\")\n",
            escape(&set.set),
            escape(&set.value)
        ),
        EnvOp::Unset(unset) => format!("unsetenv(\"{}\")\n", escape(&unset.unset)),
        EnvOp::Prepend(p) => path_op("prepend_path", &p.prepend, &p.value, p.separator.as_deref()),
        EnvOp::Append(a) => path_op("append_path", &a.append, &a.value, a.separator.as_deref()),
        EnvOp::Remove(r) => path_op("remove_path", &r.remove, &r.value, r.separator.as_deref()),
    }
}

fn path_op(function: &str, variable: &str, value: &str, separator: Option<&str>) -> String {
    match separator {
        Some(sep) => format!(
            "{function}(\"{}\", \"{}\", \"{}\")\n",
            escape(variable),
            escape(value),
            escape(sep)
        ),
        None => format!("{function}(\"{}\", \"{}\")\n", escape(variable), escape(value)),
    }
}

/// Escape a value for use inside a double-quoted Lua string.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' | '"' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}
