//! A fully-buffered HTTP body.
//!
//! The control plane never streams a request or response body across this
//! boundary (see the runtime's non-goals), so unlike `hyper`'s own body type
//! this one is backed by a single `Bytes` buffer rather than a frame stream.
//! Adapted from the simpler of the two body representations `axum` keeps
//! around internally.

use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use http_body_util::{BodyExt, Full};
use std::{
    convert::Infallible,
    pin::Pin,
    task::{Context, Poll},
};

/// The body type used for requests sent to, and responses received from,
/// the control plane.
#[derive(Debug, Default, Clone)]
pub struct Body(Full<Bytes>);

impl Body {
    /// An empty body.
    pub fn empty() -> Self {
        Self(Full::default())
    }

    /// Collect the whole body into a single contiguous buffer.
    pub async fn collect(self) -> Bytes {
        self.0
            .collect()
            .await
            .expect("a Full<Bytes> body never yields an error frame")
            .to_bytes()
    }
}

macro_rules! body_from_impl {
    ($ty:ty) => {
        impl From<$ty> for Body {
            fn from(buf: $ty) -> Self {
                Self(Full::from(buf))
            }
        }
    };
}

body_from_impl!(&'static [u8]);
body_from_impl!(std::borrow::Cow<'static, [u8]>);
body_from_impl!(Vec<u8>);
body_from_impl!(&'static str);
body_from_impl!(std::borrow::Cow<'static, str>);
body_from_impl!(String);
body_from_impl!(Bytes);

impl HttpBody for Body {
    type Data = Bytes;
    type Error = Infallible;

    #[inline]
    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.0).poll_frame(cx)
    }

    #[inline]
    fn size_hint(&self) -> SizeHint {
        self.0.size_hint()
    }

    #[inline]
    fn is_end_stream(&self) -> bool {
        self.0.is_end_stream()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_body_collects_to_nothing() {
        let body = Body::empty();
        assert!(body.collect().await.is_empty());
    }

    #[tokio::test]
    async fn body_from_string_round_trips() {
        let body = Body::from("hello".to_string());
        assert_eq!(&body.collect().await[..], b"hello");
    }
}
