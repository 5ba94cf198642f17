//! Error types shared by the control-plane client and its body type.
//! The `Error`/`BoxError` split below follows the pattern `axum` uses at its
//! HTTP boundary (the `body` module in this crate is itself adapted from
//! `axum`'s body type).
use std::fmt;

/// An error that can occur when talking to the control plane, or any error
/// produced by a user-supplied body stream.
pub struct Error(Box<dyn std::error::Error + Send + Sync>);

/// A type-erased, `Send + Sync` error. Used at every crate boundary in this
/// workspace so that handler and transport errors can be reported uniformly.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

impl Error {
    /// Create a new `Error` from a boxable error.
    pub fn new(error: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(error.into())
    }

    /// Consume `self`, returning the underlying error.
    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.0
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<Error> for BoxError {
    fn from(value: Error) -> Self {
        value.0
    }
}
