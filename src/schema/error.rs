use thiserror::Error;

use crate::syntax::LineError;

/// Why one data line failed to become a [`Record`](super::Record).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("missing mandatory field '{field}'")]
    MissingField { field: &'static str },

    #[error("field '{field}': cannot read '{token}' as {expected}")]
    InvalidField {
        field: &'static str,
        token: String,
        expected: &'static str,
    },

    #[error("unexpected extra data: '{0}'")]
    ExtraData(String),

    #[error("unknown function type {func} in [ {section} ]")]
    UnknownFunction { section: &'static str, func: u8 },

    #[error("expected a data line, found '{0}'")]
    NotData(String),

    #[error(transparent)]
    Line(#[from] LineError),
}

impl RecordError {
    pub fn invalid(field: &'static str, token: impl Into<String>, expected: &'static str) -> Self {
        Self::InvalidField {
            field,
            token: token.into(),
            expected,
        }
    }
}
