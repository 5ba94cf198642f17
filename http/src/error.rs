//! Errors raised while translating between the control plane's JSON
//! envelope and `http::Request`/`http::Response`.
//!
//! Every variant here is an invocation-level failure (spec §7): the
//! fetch from `/invocation/next` already succeeded and a request-id is
//! known, so these are reported to `/invocation/{id}/error`, never to
//! `/init/error`.
use std::fmt;

/// Failures that can occur while translating an invocation event into a
/// request the handler can act on, or while reading its response back out.
#[derive(Debug)]
pub enum TranslationError {
    /// The event body was not valid JSON, or did not match the invocation
    /// event's shape.
    InvalidEvent(serde_json::Error),
    /// The event carried no `x-forwarded-proto` header. Spec §9 leaves
    /// this case underspecified; this runtime fails the invocation rather
    /// than fabricate a scheme.
    MissingForwardedProto,
    /// The event's `encoding` field was set to something other than
    /// `base64`. Spec §9 leaves non-`base64` encodings unconfirmed; this
    /// runtime treats them as unsupported until the control plane's
    /// behavior is confirmed.
    UnsupportedEncoding(String),
    /// The body was declared `base64`-encoded but did not decode.
    InvalidBodyEncoding(base64::DecodeError),
    /// The constructed URL was not a valid URI.
    InvalidUrl(http::uri::InvalidUri),
    /// A header name or value in the event could not be represented as an
    /// HTTP header.
    InvalidHeader(String),
}

impl fmt::Display for TranslationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranslationError::InvalidEvent(err) => write!(f, "invalid invocation event: {err}"),
            TranslationError::MissingForwardedProto => {
                write!(f, "invocation event is missing the x-forwarded-proto header")
            }
            TranslationError::UnsupportedEncoding(encoding) => {
                write!(f, "unsupported body encoding: {encoding}")
            }
            TranslationError::InvalidBodyEncoding(err) => write!(f, "failed to decode base64 body: {err}"),
            TranslationError::InvalidUrl(err) => write!(f, "constructed an invalid request URL: {err}"),
            TranslationError::InvalidHeader(name) => write!(f, "invalid header: {name}"),
        }
    }
}

impl std::error::Error for TranslationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TranslationError::InvalidEvent(err) => Some(err),
            TranslationError::InvalidBodyEncoding(err) => Some(err),
            TranslationError::InvalidUrl(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TranslationError> for bun_lambda_runtime::Diagnostic {
    fn from(err: TranslationError) -> Self {
        let error_type = match &err {
            TranslationError::InvalidEvent(_) => "InvalidEvent",
            TranslationError::MissingForwardedProto => "MissingForwardedProto",
            TranslationError::UnsupportedEncoding(_) => "UnsupportedEncoding",
            TranslationError::InvalidBodyEncoding(_) => "InvalidBodyEncoding",
            TranslationError::InvalidUrl(_) => "InvalidUrl",
            TranslationError::InvalidHeader(_) => "InvalidHeader",
        };
        bun_lambda_runtime::Diagnostic::new(error_type, err.to_string())
    }
}
