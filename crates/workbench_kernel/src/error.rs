use thiserror::Error;

use crate::dataframe::Dtype;
use crate::number_format::FormatError;
use crate::validate::ValidationError;

/// Errors raised by coercion, validation and the Arrow codec.
///
/// `Type` and `Value` are the two classes `ProcessResult::coerce` tells
/// apart: some dispatch branches degrade a `Type` failure into a bug-report
/// result while letting every other failure propagate.
#[derive(Debug, Error)]
pub enum KernelError {
    /// Wrong type for the slot
    #[error("{0}")]
    Type(String),
    /// Right type, bad shape
    #[error("{0}")]
    Value(String),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("Unknown dtype: {0}")]
    UnknownDtype(Dtype),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Unhandled dtype {dtype} in column \"{column}\"")]
    UnsupportedDtype { column: String, dtype: Dtype },
    #[error(transparent)]
    Protocol(#[from] workbench_protocol::ProtocolError),
    #[error("{message}")]
    Artifact {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type KernelResult<T> = std::result::Result<T, KernelError>;

impl KernelError {
    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        KernelError::Type(message.into())
    }

    pub(crate) fn value_error(message: impl Into<String>) -> Self {
        KernelError::Value(message.into())
    }

    /// True for the TypeError class only.
    pub fn is_type_error(&self) -> bool {
        matches!(self, KernelError::Type(_))
    }

    /// True for the classes the catch-all coercion branch tolerates.
    pub(crate) fn is_type_or_value_error(&self) -> bool {
        matches!(
            self,
            KernelError::Type(_) | KernelError::Value(_) | KernelError::Format(_)
        )
    }
}

impl From<anyhow::Error> for KernelError {
    fn from(err: anyhow::Error) -> Self {
        KernelError::Artifact {
            message: format!("{:#}", err),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_error_classes() {
        assert!(KernelError::type_error("x").is_type_error());
        assert!(!KernelError::value_error("x").is_type_error());
        assert!(KernelError::value_error("x").is_type_or_value_error());
        assert!(KernelError::from(FormatError::MissingField).is_type_or_value_error());
        assert!(!KernelError::UnknownDtype(Dtype::Timedelta).is_type_or_value_error());
    }

    #[test]
    fn test_anyhow_wraps_into_artifact() {
        let err: KernelError = anyhow!("disk full").context("writing x.arrow").into();
        assert!(matches!(err, KernelError::Artifact { .. }));
        assert_eq!(err.to_string(), "writing x.arrow: disk full");
    }

    #[test]
    fn test_format_error_message_passes_through() {
        let err: KernelError = FormatError::MultipleFields.into();
        assert_eq!(err.to_string(), "Can only format one number");
    }
}
