// Copyright (c) Contributors to the spmod project.
// SPDX-License-Identifier: Apache-2.0

//! spmod - Environment-Module File Generation CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::Result;

mod cmd_init;
mod cmd_paths;
mod cmd_remove;
mod cmd_show;
mod cmd_write;

use cmd_init::CmdInit;
use cmd_paths::CmdPaths;
use cmd_remove::CmdRemove;
use cmd_show::CmdShow;
use cmd_write::CmdWrite;

#[derive(Parser)]
#[clap(
    name = "spmod",
    about = "Environment-module file generation for concretized package specs",
    version,
    long_about = "Render, write, and retire TCL and Lua module files for concretized package specs"
)]
struct Opt {
    #[clap(flatten)]
    logging: Logging,

    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Parser)]
struct Logging {
    /// Increase verbosity (-v, -vv, -vvv)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[clap(short, long)]
    quiet: bool,
}

/// Shared configuration selection flags.
#[derive(Parser, Clone, Debug, Default)]
pub struct ConfigFlags {
    /// Path to modules.yaml (defaults to the user config directory)
    #[clap(short = 'c', long = "config", env = "SPMOD_CONFIG")]
    pub config: Option<PathBuf>,
}

impl ConfigFlags {
    /// Load and validate the modules configuration.
    pub fn load(&self) -> Result<spmod::ModulesConfig> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => default_config_path()?,
        };
        let config = spmod::ModulesConfig::load(&path)?;
        config.validate()?;
        Ok(config)
    }
}

fn default_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| miette::miette!("Cannot locate a config directory for this user"))?;
    Ok(base.join("spmod").join(spmod::MODULES_CONFIG_FILENAME))
}

#[derive(Subcommand)]
enum Command {
    /// Create a starter modules.yaml
    Init(CmdInit),

    /// Print rendered module bodies without writing anything
    Show(CmdShow),

    /// Print computed module keys and file paths
    Paths(CmdPaths),

    /// Write module files for one or more spec files
    Write(CmdWrite),

    /// Remove module files for one or more spec files
    Remove(CmdRemove),
}

impl Opt {
    fn run(self) -> Result<i32> {
        // Setup logging
        let log_level = match (self.logging.quiet, self.logging.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .init();

        // Dispatch to command
        match self.cmd {
            Command::Init(mut cmd) => cmd.run(),
            Command::Show(mut cmd) => cmd.run(),
            Command::Paths(mut cmd) => cmd.run(),
            Command::Write(mut cmd) => cmd.run(),
            Command::Remove(mut cmd) => cmd.run(),
        }
    }
}

/// Print one spec's batch report.
pub fn print_report(heading: &str, spec: &spmod::PackageSpec, report: &spmod::BatchReport) {
    println!(
        "{} {}@{} [{}]",
        heading.bold(),
        spec.name(),
        spec.version(),
        spec.short_hash(7)
    );

    if report.is_empty() {
        println!("  {}", "(no backends enabled)".dimmed());
        return;
    }

    for outcome in &report.outcomes {
        match &outcome.result {
            spmod::BackendResult::Done { action, path } => {
                println!(
                    "  {}: {} {}",
                    outcome.backend.cyan(),
                    action.to_string().green(),
                    path.display()
                );
            }
            spmod::BackendResult::Excluded { pattern } => {
                println!(
                    "  {}: {} ({})",
                    outcome.backend.cyan(),
                    "skipped".yellow(),
                    pattern
                );
            }
            spmod::BackendResult::Failed { error } => {
                println!(
                    "  {}: {} {}",
                    outcome.backend.cyan(),
                    "failed".red(),
                    error
                );
            }
        }
        for warning in &outcome.warnings {
            println!("      {} {}", "warning:".yellow(), warning);
        }
    }
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    let code = opt.run()?;
    std::process::exit(code);
}
