// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `spmod init` command.

use clap::Args;
use miette::Result;
use std::path::PathBuf;

#[cfg(test)]
#[path = "./cmd_init_test.rs"]
mod cmd_init_test;

/// Create a starter modules.yaml
#[derive(Debug, Args)]
pub struct CmdInit {
    /// Directory to create file in
    #[clap(default_value = ".")]
    path: PathBuf,

    /// Module root directory to preconfigure
    #[clap(long, default_value = "/opt/modules")]
    root: String,

    /// Template to use: minimal, standard
    #[clap(long, default_value = "standard")]
    template: String,
}

impl CmdInit {
    pub fn run(&mut self) -> Result<i32> {
        let config_path = self.path.join(spmod::MODULES_CONFIG_FILENAME);

        // Check if file already exists
        if config_path.exists() {
            return Err(miette::miette!(
                "modules.yaml already exists at {:?}",
                config_path
            ));
        }

        let content = match self.template.as_str() {
            "minimal" => self.generate_minimal_template(),
            _ => self.generate_standard_template(),
        };

        std::fs::write(&config_path, content)
            .map_err(|e| miette::miette!("Failed to write modules.yaml: {}", e))?;

        println!("Created modules.yaml at {:?}", config_path);
        println!();
        println!("Next steps:");
        println!("  1. Edit the file to enable the backends you need");
        println!("  2. Run 'spmod paths -f <spec>' to preview module locations");
        println!("  3. Run 'spmod write <spec>' to generate module files");

        Ok(0)
    }

    fn generate_minimal_template(&self) -> String {
        format!(
            r#"api: spmod/v0/config

backends:
  tcl:
    enable: true
    root: {}/tcl
"#,
            self.root
        )
    }

    fn generate_standard_template(&self) -> String {
        format!(
            r#"# spmod modules configuration
# Each backend is opt-in and writes below its own root.

api: spmod/v0/config

backends:
  tcl:
    enable: true
    root: {root}/tcl

    # Naming scheme for module keys
    # projection: "{{name}}/{{version}}-{{hash:7}}"

    # Load dependencies automatically: none, direct, all
    # autoload: direct

    # Filters take 'name' or 'name@versionprefix' tokens
    # exclude:
    #   - gcc

  lua:
    enable: false
    root: {root}/lua

    # Hierarchical naming; collisions fall back to hash suffixes
    # projection: "{{compiler.name}}/{{compiler.version}}/{{name}}/{{version}}"

    # Declare conflicts with other builds of the same package
    # conflict:
    #   - "{{name}}"
"#,
            root = self.root
        )
    }
}
