// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `spmod show` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Print rendered module bodies without writing anything
#[derive(Debug, Args)]
pub struct CmdShow {
    /// Spec file to render
    #[clap(short = 'f', long)]
    file: PathBuf,

    #[clap(flatten)]
    config: crate::ConfigFlags,

    /// Render only this backend (even if disabled)
    #[clap(short, long)]
    backend: Option<String>,
}

impl CmdShow {
    pub fn run(&mut self) -> Result<i32> {
        let config = self.config.load()?;
        let spec = spmod::PackageSpec::load(&self.file)?;
        spec.validate()?;

        let selected: Vec<(&str, &spmod::BackendSettings)> = match &self.backend {
            Some(name) => {
                let settings = config.backends.get(name).ok_or_else(|| {
                    miette::miette!("backend {:?} is not configured in modules.yaml", name)
                })?;
                vec![(name.as_str(), settings)]
            }
            None => config.enabled_backends().collect(),
        };

        if selected.is_empty() {
            println!("{}", "(no backends enabled)".dimmed());
            return Ok(0);
        }

        for (index, (name, settings)) in selected.iter().enumerate() {
            let generator = spmod::Generator::from_backend_name(name, (*settings).clone())?;
            let preview = generator.preview(&spec)?;

            if index > 0 {
                println!();
            }
            println!(
                "{}",
                format!("# {} ({})", preview.location.key, name).bold()
            );
            for warning in &preview.warnings {
                eprintln!("{} {}", "warning:".yellow(), warning);
            }
            print!("{}", preview.body);
        }

        Ok(0)
    }
}
