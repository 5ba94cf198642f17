//! Wraps a handler that speaks `http::Request`/`http::Response` so it can
//! be driven by [`bun_lambda_runtime`]'s event loop, which only knows how
//! to deserialize a payload type and serialize a response type.
use std::{
    fmt,
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use bun_lambda_runtime::{Diagnostic, LambdaEvent};
use tower::Service;

use crate::{body::Body, event::InvocationEvent, response::InvocationResponse};

/// Adapts a `Service<http::Request<Body>, Response = http::Response<Body>>`
/// into a `Service<LambdaEvent<InvocationEvent>, Response =
/// InvocationResponse>`, performing the request/response translation of
/// spec §4.4 around every call.
///
/// The adapter's `Error` is [`Diagnostic`] rather than a boxed error: the
/// inner service's failures must be able to supply their own `errorType`
/// (spec §3 Error envelope) rather than fall back to a Rust type name,
/// which is the only way a dynamic error classification — such as one
/// proxied in from a child process speaking another language — survives
/// translation.
#[derive(Clone)]
pub(crate) struct HttpAdapter<S> {
    inner: S,
}

impl<S> HttpAdapter<S> {
    pub(crate) fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S> Service<LambdaEvent<InvocationEvent>> for HttpAdapter<S>
where
    S: Service<http::Request<Body>, Response = http::Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<Diagnostic> + fmt::Debug,
{
    type Response = InvocationResponse;
    type Error = Diagnostic;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, event: LambdaEvent<InvocationEvent>) -> Self::Future {
        let mut inner = self.inner.clone();
        Box::pin(async move {
            let (payload, _ctx) = event.into_parts();
            let request: http::Request<Body> = payload.try_into().map_err(Diagnostic::from)?;
            let response = inner.call(request).await.map_err(Into::into)?;
            let translated: InvocationResponse = response.try_into().map_err(Diagnostic::from)?;
            Ok(translated)
        })
    }
}
