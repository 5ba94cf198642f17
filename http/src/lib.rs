#![warn(missing_docs)]
//! Translates between the control plane's JSON invocation envelope (spec
//! §3/§4.4) and plain `http::Request`/`http::Response` values, so handlers
//! can be written as ordinary [`tower::Service`]s over HTTP types instead
//! of the envelope's wire shape.
//!
//! ```rust,no_run
//! use bun_lambda_http::{run, service_fn, Body, Error, IntoResponse, Request, Response};
//!
//! async fn handler(_req: Request) -> Result<Response, Error> {
//!     Ok(Response::new(Body::from("hello")))
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     run(service_fn(handler)).await
//! }
//! ```
mod adapter;
mod body;
mod error;
mod event;
mod request;
mod response;

pub use body::Body;
pub use bun_lambda_runtime::{service_fn, Diagnostic, Error, LambdaEvent};
pub use error::TranslationError;
pub use event::InvocationEvent;
pub use response::{InvocationResponse, IntoResponse};

use adapter::HttpAdapter;
use tower::Service;

/// An incoming request, translated from the control plane's envelope.
pub type Request = http::Request<Body>;
/// A handler's response, to be translated back into the control plane's
/// envelope.
pub type Response = http::Response<Body>;

/// Starts the event loop, dispatching each invocation to `service` as an
/// `http::Request<Body>` and reporting its `http::Response<Body>` back to
/// the control plane.
///
/// This is `bun_lambda_runtime::run` specialized to the HTTP translation
/// of spec §4.4: it is the entry point a handler binary's `main` calls.
pub async fn run<S>(service: S) -> Result<(), Error>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Into<Diagnostic> + std::fmt::Debug,
{
    bun_lambda_runtime::run(HttpAdapter::new(service)).await
}
