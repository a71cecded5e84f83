//! Overall high-level error type for mixology
use crate::driver::config::ConfigError;
use crate::import::error::SourceError;
use codespan_reporting::diagnostic::Diagnostic;
use std::fmt::Display;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MixologyError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("path {0} could not be read")]
    FileCouldNotBeRead(String),
    #[error("unknown output format {0}")]
    UnknownFormat(String),
}

fn default_diagnostic<E>(e: &E) -> Diagnostic<usize>
where
    E: Display,
{
    Diagnostic::error().with_message(format!("{}", e))
}

impl MixologyError {
    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        match self {
            MixologyError::Source(e) => e.to_diagnostic(),
            e => default_diagnostic(e),
        }
    }
}
