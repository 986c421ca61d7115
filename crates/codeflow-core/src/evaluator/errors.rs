use rquickjs::CaughtError;
use thiserror::Error;

use super::values::Snapshotter;

/// Errors raised while executing an instrumented program
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluatorError {
    /// The program threw; `Display` is the thrown message alone
    #[error("{message}")]
    Thrown {
        name: Option<String>,
        message: String,
        stack: Option<String>,
    },

    #[error("Engine error: {0}")]
    Engine(String),
}

impl EvaluatorError {
    /// A thrown `Error` object with the given constructor name
    pub fn thrown(name: &str, message: &str) -> Self {
        Self::Thrown {
            name: Some(name.to_string()),
            message: message.to_string(),
            stack: None,
        }
    }

    /// Interpreter setup or binding installation failed
    pub fn engine(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Engine(format!("{context}: {err}"))
    }

    /// Constructor name of the thrown error, e.g. `ReferenceError`
    pub fn error_name(&self) -> Option<&str> {
        match self {
            Self::Thrown { name, .. } => name.as_deref(),
            Self::Engine(_) => None,
        }
    }

    pub(crate) fn from_caught(caught: CaughtError<'_>, snapshotter: &Snapshotter) -> Self {
        match caught {
            CaughtError::Exception(exception) => {
                let name = exception.as_object().get::<_, String>("name").ok();
                let message = exception
                    .message()
                    .filter(|message| !message.is_empty())
                    .or_else(|| name.clone())
                    .unwrap_or_else(|| "Uncaught exception".to_string());
                Self::Thrown {
                    name,
                    message,
                    stack: exception.stack().filter(|stack| !stack.is_empty()),
                }
            }
            CaughtError::Value(value) => Self::Thrown {
                name: None,
                message: snapshotter.describe(&value),
                stack: None,
            },
            CaughtError::Error(err) => Self::Engine(err.to_string()),
        }
    }
}
