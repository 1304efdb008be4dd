//! Error types shared by the rendering entry points

use std::fmt;
use std::path::PathBuf;

/// How a grammar was looked up, used to word "grammar not found" errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarLookup {
    Extension,
    Language,
}

impl GrammarLookup {
    pub fn from_is_extension(is_extension: bool) -> Self {
        if is_extension {
            Self::Extension
        } else {
            Self::Language
        }
    }
}

impl fmt::Display for GrammarLookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extension => f.write_str("file extension"),
            Self::Language => f.write_str("language"),
        }
    }
}

/// Failure inside the syntect tokenizer for a single line
#[derive(Debug, thiserror::Error)]
pub enum TokenizeError {
    #[error("parse error: {0}")]
    Parse(#[from] syntect::parsing::ParsingError),
    #[error("scope stack error: {0:?}")]
    Scope(syntect::parsing::ScopeError),
}

impl From<syntect::parsing::ScopeError> for TokenizeError {
    fn from(err: syntect::parsing::ScopeError) -> Self {
        Self::Scope(err)
    }
}

/// Errors surfaced to callers of the rendering entry points
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Unknown language id or file extension
    #[error("Grammar not found for {lookup}: {id}")]
    GrammarNotFound { id: String, lookup: GrammarLookup },

    /// Bad argument, raised before any work begins
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// The tokenizer failed part way through a render call
    #[error("rendering failed with grammar '{grammar}' at line {line}")]
    RenderingFailed {
        grammar: String,
        line: usize,
        #[source]
        source: TokenizeError,
    },

    #[error("failed to load theme from {path}")]
    ThemeLoad {
        path: PathBuf,
        #[source]
        source: syntect::LoadingError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn grammar_not_found(id: &str, is_extension: bool) -> Self {
        Self::GrammarNotFound {
            id: id.to_string(),
            lookup: GrammarLookup::from_is_extension(is_extension),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
