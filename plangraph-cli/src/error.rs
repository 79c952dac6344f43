use std::io;

use plangraph::utils::error::FactParseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Failed to read `{path}`: {source}")]
    Read { path: String, source: io::Error },

    #[error("Failed to write `{path}`: {source}")]
    Write { path: String, source: io::Error },

    /// Grammar errors, kept with the text so they can be rendered in context.
    #[error("Failed to parse `{file}`: {} error(s)", .errors.len())]
    Parse {
        file: String,
        text: String,
        errors: Vec<FactParseError>,
    },

    #[error("No answer set found in `{0}`")]
    NoAnswer(String),

    #[error(transparent)]
    Graph(#[from] plangraph::Error),

    #[error(transparent)]
    Roles(#[from] planroles::Error),
}

pub type CliResult<T> = Result<T, CliError>;
