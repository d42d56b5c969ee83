use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameError
{
    #[error("Terminal I/O failed: {0}")]
    Terminal(#[from] io::Error),

    #[error("{0}")]
    InvalidOption(String),

    #[error("Unknown game '{0}'. Run with --help.")]
    UnknownGame(String),

    #[error("Invalid selection.")]
    InvalidSelection,

    #[error("Level {level} of {game} has no path from start to end")]
    UnsolvableLevel { game: &'static str, level: usize },

    #[error("Malformed expression '{0}'")]
    MalformedExpression(String),
}
