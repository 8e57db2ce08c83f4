//! Contains the `Error` and `Result` types that `mongodb-bulk-compiler` uses.

use std::{any::Any, fmt::Debug, sync::Arc};

use thiserror::Error;

/// The result type for all methods that can return an error in the `mongodb-bulk-compiler` crate.
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur in the `mongodb-bulk-compiler` crate. The inner
/// [`ErrorKind`](enum.ErrorKind.html) is wrapped in a `Box` to keep `Result`s small.
#[derive(Clone, Debug, Error)]
#[error("Kind: {kind}")]
#[non_exhaustive]
pub struct Error {
    /// The type of error that occurred.
    pub kind: Box<ErrorKind>,
}

impl Error {
    /// Create a new `Error` wrapping an arbitrary value. Intended for [`BulkAccumulator`]
    /// implementations that need to surface a failure of the underlying driver.
    ///
    /// [`BulkAccumulator`]: crate::BulkAccumulator
    pub fn custom(e: impl Any + Send + Sync) -> Self {
        ErrorKind::Custom(Arc::new(e)).into()
    }

    /// Retrieve a reference to a value provided to `Error::custom`. Returns `None` if this is not
    /// a custom error or if the payload types mismatch.
    pub fn get_custom<E: Any>(&self) -> Option<&E> {
        if let ErrorKind::Custom(c) = &*self.kind {
            c.downcast_ref()
        } else {
            None
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Error {
        ErrorKind::InvalidArgument {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn bad_method_call(message: impl Into<String>) -> Error {
        ErrorKind::BadMethodCall {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Error {
        ErrorKind::Unsupported {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn logic(message: impl Into<String>) -> Error {
        ErrorKind::Logic {
            message: message.into(),
        }
        .into()
    }

    pub(crate) fn internal(message: impl Into<String>) -> Error {
        ErrorKind::Internal {
            message: message.into(),
        }
        .into()
    }

    /// Whether this error was caused by malformed input.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::InvalidArgument { .. })
    }

    /// Whether this error was caused by calling a write method outside of compilation.
    pub fn is_bad_method_call(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::BadMethodCall { .. })
    }

    /// Whether this error was caused by an option the server does not support.
    pub fn is_unsupported(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::Unsupported { .. })
    }

    /// Whether this error was caused by an inconsistency between a document and the accumulator.
    pub fn is_logic_error(&self) -> bool {
        matches!(self.kind.as_ref(), ErrorKind::Logic { .. })
    }

    /// The human-readable message carried by this error, if it has one.
    pub fn message(&self) -> Option<&str> {
        match self.kind.as_ref() {
            ErrorKind::InvalidArgument { message }
            | ErrorKind::BadMethodCall { message }
            | ErrorKind::Unsupported { message }
            | ErrorKind::Logic { message }
            | ErrorKind::Internal { message } => Some(message.as_str()),
            _ => None,
        }
    }
}

impl<E> From<E> for Error
where
    ErrorKind: From<E>,
{
    fn from(err: E) -> Self {
        Self {
            kind: Box::new(err.into()),
        }
    }
}

impl From<bson::de::Error> for ErrorKind {
    fn from(err: bson::de::Error) -> Self {
        Self::BsonDeserialization(err)
    }
}

impl From<bson::ser::Error> for ErrorKind {
    fn from(err: bson::ser::Error) -> Self {
        Self::BsonSerialization(err)
    }
}

/// The types of errors that can occur.
#[allow(missing_docs)]
#[derive(Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorKind {
    /// An invalid argument was provided.
    #[error("An invalid argument was provided: {message}")]
    #[non_exhaustive]
    InvalidArgument { message: String },

    /// A write method was invoked outside of a compile pass.
    #[error("Bad method call: {message}")]
    #[non_exhaustive]
    BadMethodCall { message: String },

    /// The connected server does not support a requested option.
    #[error("The server does not support a requested option: {message}")]
    #[non_exhaustive]
    Unsupported { message: String },

    /// A document's identifier disagrees with the one produced by the accumulator.
    #[error("Logic error: {message}")]
    #[non_exhaustive]
    Logic { message: String },

    /// Wrapper around `bson::de::Error`.
    #[error("{0}")]
    BsonDeserialization(bson::de::Error),

    /// Wrapper around `bson::ser::Error`.
    #[error("{0}")]
    BsonSerialization(bson::ser::Error),

    #[error("Internal error: {message}")]
    #[non_exhaustive]
    Internal { message: String },

    /// A custom value produced by an accumulator implementation.
    #[error("Custom accumulator error{string}", string = display_custom(.0))]
    Custom(Arc<dyn Any + Send + Sync>),
}

fn display_custom(custom: &Arc<dyn Any + Send + Sync>) -> String {
    if let Some(string) = custom.downcast_ref::<String>() {
        format!(": {string}")
    } else if let Some(string) = custom.downcast_ref::<&'static str>() {
        format!(": {string}")
    } else {
        String::new()
    }
}

impl ErrorKind {
    #[cfg(feature = "tracing-unstable")]
    pub(crate) fn name(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument { .. } => "InvalidArgument",
            ErrorKind::BadMethodCall { .. } => "BadMethodCall",
            ErrorKind::Unsupported { .. } => "Unsupported",
            ErrorKind::Logic { .. } => "Logic",
            ErrorKind::BsonDeserialization(..) => "BsonDeserialization",
            ErrorKind::BsonSerialization(..) => "BsonSerialization",
            ErrorKind::Internal { .. } => "Internal",
            ErrorKind::Custom(..) => "Custom",
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn custom_payloads() {
        #[derive(Debug, PartialEq)]
        struct DriverFailure(u32);

        let error = Error::custom(DriverFailure(11000));
        assert_eq!(error.get_custom::<DriverFailure>(), Some(&DriverFailure(11000)));
        assert_eq!(error.get_custom::<String>(), None);
        assert_eq!(error.message(), None);

        let error = Error::custom("network unreachable");
        assert_eq!(
            error.to_string(),
            "Kind: Custom accumulator error: network unreachable"
        );
    }

    #[test]
    fn kind_predicates() {
        let error = Error::logic("id mismatch");
        assert!(error.is_logic_error());
        assert!(!error.is_invalid_argument());
        assert_eq!(error.message(), Some("id mismatch"));
        assert_eq!(error.to_string(), "Kind: Logic error: id mismatch");
    }
}
