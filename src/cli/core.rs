//! Error and control-flow types shared by the shell loop and command handlers.

use std::io;

use thiserror::Error;

use crate::errors::CustomsError;

/// Failure that terminates the shell.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CustomsError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("Line editor failed: {0}")]
    Readline(#[from] rustyline::error::ReadlineError),
}

/// Failure of a single command; reported and the shell keeps running.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] CustomsError),
    #[error("exit requested")]
    ExitRequested,
}

impl CommandError {
    pub(crate) fn usage(usage: &str) -> Self {
        CommandError::InvalidArguments(format!("usage: {}", usage))
    }
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}
