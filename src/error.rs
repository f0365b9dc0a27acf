//! The Errors that may occur within the crate.

use thiserror::Error;

pub type Result<T, E = crate::Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    // Surface syntax errors (preprocessor and parser)
    #[error("Syntax error at offset {offset}: {message}")]
    Syntax { message: String, offset: usize },
    // Core construction errors (postfix tree build)
    #[error("Malformed postfix expression: {0}")]
    MalformedExpression(String),
    #[error("End marker carries no position in the annotated tree")]
    EndMarkerNotFound,
}

impl Error {
    pub fn syntax(message: impl Into<String>, offset: usize) -> Self {
        Self::Syntax {
            message: message.into(),
            offset,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedExpression(_))
    }
}
