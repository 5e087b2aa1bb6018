//! Domain error types.

/// A parse error with position information for expression parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("parse error at position {position}: {message}")]
pub struct ParseError {
    pub message: String,
    pub position: usize,
}

impl ParseError {
    /// Format the error with a caret pointing at the error position in the input.
    pub fn display_with_context(&self, input: &str) -> String {
        let caret = " ".repeat(self.position) + "^";
        format!(
            "{input}\n{caret}\n{err}",
            input = input,
            caret = caret,
            err = self
        )
    }
}

/// A single schema-validation failure, attributed to a document field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for signalbox.
#[derive(Debug, thiserror::Error)]
pub enum SignalboxError {
    #[error("document parse error in {file}: {reason}")]
    DocumentParse { file: String, reason: String },

    #[error("invalid strategy document ({} errors)", errors.len())]
    StrategyInvalid { errors: Vec<ValidationError> },

    #[error("market data error: {reason}")]
    MarketData { reason: String },

    #[error("replay error: {reason}")]
    Replay { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SignalboxError> for std::process::ExitCode {
    fn from(err: &SignalboxError) -> Self {
        let code: u8 = match err {
            SignalboxError::Io(_) => 1,
            SignalboxError::DocumentParse { .. } => 2,
            SignalboxError::StrategyInvalid { .. } => 3,
            SignalboxError::MarketData { .. } => 4,
            SignalboxError::Replay { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
