use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidOperator,  // Operator not valid for the field's type
    InvalidField,     // Field not addressable by the rule family
    MissingOperand,   // between without upper bound, empty inList, ...
    Parse,
    InvalidState,     // Index/store divergence
}

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: String) -> Self {
        Error { kind, context }
    }

    pub fn invalid_operator(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidOperator, context.into())
    }

    pub fn invalid_field(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidField, context.into())
    }

    pub fn missing_operand(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::MissingOperand, context.into())
    }

    pub fn invalid_state(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::InvalidState, context.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Parse,
            context: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
