use std::{fmt, ops::Range};

use thiserror::Error;

use crate::identity::StateId;

/// A single grammar error produced while reading a fact document.
///
/// The span is a byte range into the parsed source so callers can render it
/// (the command-line driver uses `ariadne`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactParseError {
    pub message: String,
    pub span: Range<usize>,
}

impl fmt::Display for FactParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (at bytes {}..{})",
            self.message, self.span.start, self.span.end
        )
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParseError {
        source: toml::de::Error,
        file: String,
    },

    #[error("Failed to serialize configuration: {0}")]
    ConfigSerializeError(#[from] toml::ser::Error),

    /// The fact document does not follow the fact grammar.
    #[error(
        "Failed to parse fact document: {} error(s), first: {}",
        .errors.len(),
        .errors.first().map(|e| e.to_string()).unwrap_or_default()
    )]
    ParserErrors { errors: Vec<FactParseError> },

    /// Two distinct valuations were mapped onto the same identifier. States are
    /// never merged silently, the exploration is aborted instead.
    #[error(
        "State identity collision on `{id}`: valuation {incoming} hashes to the same identifier as {existing}."
    )]
    IdentityCollision {
        id: StateId,
        existing: String,
        incoming: String,
    },

    #[error("No initial state was found. A fact document must contain an `init/1` fact.")]
    MissingInitialState,

    #[error("Malformed state token `{0}`, expected `s_<problem>_<p|m><magnitude>`.")]
    MalformedStateToken(String),

    #[error("An exploration worker terminated abnormally: {0}")]
    WorkerPanicked(String),

    #[error("An unknown error occurred: {0}")]
    Unknown(String),
}

pub type PgResult<T> = Result<T, Error>;
