//! The request/response body entity used at the translation boundary.

use std::{borrow::Cow, ops::Deref};

/// A fully-buffered HTTP body.
///
/// The control plane never streams a body across this boundary (see the
/// runtime's non-goals); every invocation and response body is read into
/// memory in full before it crosses into or out of the handler.
///
/// * `Empty` — no body.
/// * `Text` — UTF-8 text, shipped back to the control plane unencoded.
/// * `Binary` — raw bytes, always base64-encoded before being sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// An empty body.
    Empty,
    /// A body containing UTF-8 text.
    Text(String),
    /// A body containing arbitrary bytes.
    Binary(Vec<u8>),
}

impl Body {
    /// `true` for a zero-length body, matching spec's empty-body invariant:
    /// a handler response with no bytes must omit `encoding` entirely
    /// rather than emit `encoding: "base64"` with an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Text(s) => s.is_empty(),
            Body::Binary(b) => b.is_empty(),
        }
    }
}

impl Default for Body {
    fn default() -> Self {
        Body::Empty
    }
}

impl From<()> for Body {
    fn from(_: ()) -> Self {
        Body::Empty
    }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self {
        Body::Text(s.into())
    }
}

impl From<String> for Body {
    fn from(b: String) -> Self {
        Body::Text(b)
    }
}

impl From<Cow<'static, str>> for Body {
    fn from(cow: Cow<'static, str>) -> Body {
        Body::Text(cow.into_owned())
    }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Self {
        Body::Binary(b)
    }
}

impl From<&[u8]> for Body {
    fn from(b: &[u8]) -> Self {
        Body::Binary(b.to_vec())
    }
}

impl Deref for Body {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_ref()
    }
}

impl AsRef<[u8]> for Body {
    fn as_ref(&self) -> &[u8] {
        match self {
            Body::Empty => &[],
            Body::Text(bytes) => bytes.as_ref(),
            Body::Binary(bytes) => bytes.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_has_default() {
        assert_eq!(Body::default(), Body::Empty);
    }

    #[test]
    fn from_unit() {
        assert_eq!(Body::from(()), Body::Empty);
    }

    #[test]
    fn from_str() {
        assert!(matches!(Body::from("foo"), Body::Text(_)));
    }

    #[test]
    fn from_bytes() {
        assert!(matches!(Body::from("foo".as_bytes()), Body::Binary(_)));
    }

    #[test]
    fn empty_variants_report_empty() {
        assert!(Body::Empty.is_empty());
        assert!(Body::Text(String::new()).is_empty());
        assert!(Body::Binary(Vec::new()).is_empty());
        assert!(!Body::Text("x".into()).is_empty());
    }
}
