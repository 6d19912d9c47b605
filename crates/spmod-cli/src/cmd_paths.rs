// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `spmod paths` command.

use std::path::PathBuf;

use clap::Args;
use colored::Colorize;
use miette::Result;

/// Print computed module keys and file paths
#[derive(Debug, Args)]
pub struct CmdPaths {
    /// Spec file to project
    #[clap(short = 'f', long)]
    file: PathBuf,

    #[clap(flatten)]
    config: crate::ConfigFlags,
}

impl CmdPaths {
    pub fn run(&mut self) -> Result<i32> {
        let config = self.config.load()?;
        let spec = spmod::PackageSpec::load(&self.file)?;
        spec.validate()?;

        if !config.any_enabled() {
            println!("{}", "(no backends enabled)".dimmed());
            return Ok(0);
        }

        for (name, settings) in config.enabled_backends() {
            let generator = spmod::Generator::from_backend_name(name, settings.clone())?;
            let location = generator.location(&spec)?;
            println!(
                "{}: {} {}",
                name.cyan(),
                location.key.green(),
                location.path.display()
            );
        }

        Ok(0)
    }
}
