//! Command line argument handling with clap v4 and subcommands.
use crate::core::config::RewriteConfig;
use crate::driver::config::{load_config, ConfigError};
use clap::{Args, Parser, Subcommand};
use itertools::Itertools;
use std::path::PathBuf;

/// Mixology - rewrite mixin modules as host-targeted classes
#[derive(Parser, Debug, Clone)]
#[command(name = "mixology")]
#[command(about = "Rewrite mixin modules against their host")]
#[command(version)]
pub struct MixologyCli {
    /// Format to write output in (json or pretty)
    #[arg(short = 'x', long = "format", default_value = "pretty")]
    pub format: String,

    /// Output file (standard out if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// TOML configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Additional name never qualified with the host
    #[arg(long = "exempt", action = clap::ArgAction::Append)]
    pub exempt: Vec<String>,

    /// Additional record-mutating operation
    #[arg(long = "mutating", action = clap::ArgAction::Append)]
    pub mutating: Vec<String>,

    /// Write extracted module metadata as JSON to this file
    #[arg(long = "metadata")]
    pub metadata: Option<PathBuf>,

    /// Turn on debug logging
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Files to process (used when no subcommand specified)
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Dump intermediate representations
    Dump(DumpArgs),
    /// Explain what would be executed
    Explain,
}

#[derive(Args, Debug, Clone)]
pub struct DumpArgs {
    /// Phase to dump
    #[arg(value_enum)]
    pub phase: DumpPhase,

    /// Files to dump
    #[arg(value_name = "FILES")]
    pub files: Vec<PathBuf>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpPhase {
    /// Node tree as read
    Input,
    /// Cleaned statements and side table before rewriting
    Extracted,
    /// Node tree after rewriting
    Rewritten,
}

/// What the driver has been asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Transform,
    Dump(DumpPhase),
    Explain,
}

/// Options flattened from the command line
#[derive(Debug, Clone)]
pub struct MixologyOptions {
    pub mode: Mode,
    pub files: Vec<PathBuf>,
    pub format: String,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub exempt: Vec<String>,
    pub mutating: Vec<String>,
    pub metadata: Option<PathBuf>,
    pub debug: bool,
}

impl From<MixologyCli> for MixologyOptions {
    fn from(cli: MixologyCli) -> Self {
        let (mode, files) = match cli.command {
            Some(Commands::Dump(args)) => (Mode::Dump(args.phase), args.files),
            Some(Commands::Explain) => (Mode::Explain, cli.files),
            None => (Mode::Transform, cli.files),
        };

        MixologyOptions {
            mode,
            files,
            format: cli.format,
            output: cli.output,
            config: cli.config,
            exempt: cli.exempt,
            mutating: cli.mutating,
            metadata: cli.metadata,
            debug: cli.debug,
        }
    }
}

impl MixologyOptions {
    pub fn from_args() -> Self {
        MixologyCli::parse().into()
    }

    pub fn explain(&self) -> bool {
        self.mode == Mode::Explain
    }

    pub fn dump_phase(&self) -> Option<DumpPhase> {
        match self.mode {
            Mode::Dump(phase) => Some(phase),
            _ => None,
        }
    }

    /// The effective rewrite configuration: defaults, then the
    /// config file, then command line additions
    pub fn rewrite_config(&self) -> Result<RewriteConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => load_config(path)?,
            None => RewriteConfig::default(),
        };
        Ok(base
            .with_exempt(&self.exempt)
            .with_mutating(&self.mutating))
    }

    /// Produce a dry run explanation of the selected options
    pub fn explanation(&self, config: &RewriteConfig) -> String {
        let mut explanation = String::new();

        explanation.push_str("Mixology will ");
        match self.mode {
            Mode::Transform => explanation.push_str(&format!(
                "rewrite mixin modules in the inputs and write them as {}",
                self.format
            )),
            Mode::Dump(DumpPhase::Input) => {
                explanation.push_str("read the inputs and dump the node trees")
            }
            Mode::Dump(DumpPhase::Extracted) => explanation
                .push_str("dump the cleaned statements and side table of each mixin module"),
            Mode::Dump(DumpPhase::Rewritten) => {
                explanation.push_str("dump the rewritten node trees")
            }
            Mode::Explain => explanation.push_str("explain its configuration"),
        }
        explanation.push_str("\n\n");

        if !self.files.is_empty() {
            explanation.push_str("Inputs:\n");
            for f in &self.files {
                explanation.push_str(&format!("  - {}\n", f.display()));
            }
            explanation.push('\n');
        }

        explanation.push_str("Configuration:\n");
        explanation.push_str(&format!(
            "  marker: {} {}::{}\n",
            config.marker_call, config.marker_constant.0, config.marker_constant.1
        ));
        explanation.push_str(&format!("  hooks: {}\n", joined(&config.hooks)));
        explanation.push_str(&format!(
            "  dropped: {}\n",
            joined(&config.dropped_declarations)
        ));
        for (name, kind) in &config.associations {
            explanation.push_str(&format!("  association {}: {}\n", name, kind.name()));
        }
        explanation.push_str(&format!("  exempt: {}\n", joined(&config.exempt)));
        explanation.push_str(&format!("  mutating: {}\n", joined(&config.mutating)));
        explanation.push_str(&format!("  raw attributes: {}\n", config.raw_attributes));
        explanation.push_str(&format!("  transaction: {}\n", config.transaction));

        if let Some(m) = &self.metadata {
            explanation.push_str(&format!("\nMetadata will be written to {}\n", m.display()));
        }

        explanation
    }
}

fn joined<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    names.into_iter().join(", ")
}
