//! Error type for ordered-object JSON encoding.

use thiserror::Error;

/// Boxed error carried by [`EncodeError::Marshaler`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A value could not be represented as JSON.
///
/// Any of these aborts the serialization in progress; no partial output is
/// returned alongside it.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A [`MarshalJson`](crate::MarshalJson) implementation reported failure.
    #[error("marshal_json failed: {0}")]
    Marshaler(#[source] BoxError),
    /// The structural (serde) encoder rejected the value.
    #[error("structural encoding failed: {0}")]
    Structural(#[from] serde_json::Error),
    /// NaN and the infinities have no JSON representation.
    #[error("unsupported value: {0}")]
    UnsupportedFloat(f64),
    #[error("encoded output is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

impl EncodeError {
    /// Wraps the error of a custom [`MarshalJson`](crate::MarshalJson) implementation.
    pub fn marshaler<E: Into<BoxError>>(err: E) -> Self {
        EncodeError::Marshaler(err.into())
    }

    /// A marshaler failure described only by a message.
    pub fn custom(msg: impl std::fmt::Display) -> Self {
        EncodeError::Marshaler(msg.to_string().into())
    }
}
