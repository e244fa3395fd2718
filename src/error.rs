use thiserror::Error;

/// Everything that can go wrong while modelling a form or a link.
///
/// All failures are local and synchronous: they are raised at the point of
/// violation and surfaced to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("Malformed field path \"{0}\"")]
    MalformedFieldName(String),

    #[error("Unreachable field \"{0}\"")]
    UnreachableField(String),

    #[error("Cannot set value on a compound field \"{0}\".")]
    CompoundFieldMutation(String),

    #[error("\"{0}\" is a compound field, not a single field")]
    CompoundField(String),

    #[error("Current URI must be an absolute URL (\"{0}\").")]
    InvalidCurrentUri(String),

    #[error("Expected {expected}, found a \"{found}\" element")]
    LogicalTagMismatch { expected: String, found: String },

    #[error("Input \"{field}\" cannot take \"{value}\" as a value (possible values: {available}).")]
    InvalidOption {
        field: String,
        value: String,
        available: String,
    },

    #[error("The value for \"{field}\" must be {expected}.")]
    ValueTypeMismatch { field: String, expected: String },

    #[error("Unable to add a choice for \"{0}\" as it is not a radio button.")]
    NotARadioInput(String),

    #[error("Invalid selector \"{0}\"")]
    InvalidSelector(String),

    #[error("No element matches \"{0}\"")]
    NoMatch(String),
}

impl Error {
    pub(crate) fn tag_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::LogicalTagMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub(crate) fn type_mismatch(field: &str, expected: &str) -> Self {
        Self::ValueTypeMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
