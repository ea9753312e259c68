use crate::lexer::{Token, escape_string};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ShellError>;

/// Failures of the line-processing pipeline. All of them are recoverable by the command loop.
#[derive(Error, Debug)]
pub enum ShellError {
    #[error("Unknown command: {}", escape_string(.0))]
    CommandNotFound(String),

    #[error("There's no command {} taking {} arguments", escape_string(.name), .arg_count)]
    ArityMismatch { name: String, arg_count: usize },

    #[error("Ambiguous command {} taking {} arguments", escape_string(.name), .arg_count)]
    AmbiguousCommand { name: String, arg_count: usize },

    #[error("{}", .message)]
    TokenConversion { token: Token, message: String },

    #[error("{}", .0)]
    Conversion(String),
}

impl ShellError {
    pub fn arity_mismatch(name: &str, arg_count: usize) -> Self {
        Self::ArityMismatch {
            name: name.to_string(),
            arg_count,
        }
    }

    pub fn ambiguous_command(name: &str, arg_count: usize) -> Self {
        Self::AmbiguousCommand {
            name: name.to_string(),
            arg_count,
        }
    }

    /// Attaches the offending token to a conversion failure.
    pub fn for_token(self, token: &Token) -> Self {
        match self {
            Self::TokenConversion { .. } => self,
            other => Self::TokenConversion {
                token: token.clone(),
                message: other.to_string(),
            },
        }
    }

    /// The token pointed at by this error, if any.
    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::TokenConversion { token, .. } => Some(token),
            _ => None,
        }
    }
}
