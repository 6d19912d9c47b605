// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! Implementation of the `spmod remove` command.

use std::path::PathBuf;

use clap::Args;
use miette::Result;

/// Remove module files for one or more spec files
#[derive(Debug, Args)]
pub struct CmdRemove {
    /// Spec files to process
    #[clap(required = true)]
    specs: Vec<PathBuf>,

    #[clap(flatten)]
    config: crate::ConfigFlags,

    /// Exit nonzero if any backend fails
    #[clap(long)]
    strict: bool,
}

impl CmdRemove {
    pub fn run(&mut self) -> Result<i32> {
        let config = self.config.load()?;

        let mut failures = 0;
        for path in &self.specs {
            let spec = spmod::PackageSpec::load(path)?;
            let report = spmod::remove_modules(&spec, &config)?;
            crate::print_report("remove", &spec, &report);
            failures += report.failed();
        }

        if self.strict && failures > 0 {
            Ok(1)
        } else {
            Ok(0)
        }
    }
}
