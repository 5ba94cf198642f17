#![deny(clippy::all, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]
#![warn(missing_docs, nonstandard_style, rust_2018_idioms)]

//! The event loop that bridges a Lambda-style polling control plane to a
//! handler.
//!
//! The mechanism available for defining a handler is as follows: create a
//! type that conforms to the [`tower::Service`] trait, then pass it to
//! [`run`], which polls the control plane for invocations and drives the
//! handler to completion for each one.
use http::Request;
use bun_lambda_runtime_api_client::{body::Body, BoxError, Client};
use serde::{Deserialize, Serialize};
use std::{
    env,
    fmt::{self, Debug},
    future::Future,
    panic,
    sync::Arc,
    time::Duration,
};
use tokio_stream::{Stream, StreamExt};
pub use tower::{self, service_fn, Service};
use tower::{util::ServiceFn, ServiceExt};
use tracing::{error, trace, Instrument};

mod deserializer;
mod diagnostic;
mod requests;
/// Types available to a Lambda-style handler.
mod types;

use requests::{EventCompletionRequest, EventErrorRequest, InitErrorRequest, IntoRequest, NextEventRequest};
pub use types::{Context, Diagnostic, LambdaEvent};

use types::{invoke_request_id, RefConfig};

/// Error type that handlers may result in.
pub type Error = bun_lambda_runtime_api_client::BoxError;

/// How long the init-error reporting loop waits between POST attempts to
/// `/runtime/init/error` before giving up and exiting the process.
const INIT_ERROR_RETRY_BACKOFF: Duration = Duration::from_millis(100);
/// Number of attempts made to report an init failure before giving up.
const INIT_ERROR_MAX_ATTEMPTS: u32 = 3;

/// Configuration derived from environment variables.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// The name of the function.
    pub function_name: String,
    /// The amount of memory available to the function in MB.
    pub memory: i32,
    /// The version of the function being executed.
    pub version: String,
    /// The name of the log stream for the function, if configured.
    pub log_stream: String,
    /// The name of the log group for the function, if configured.
    pub log_group: String,
}

impl Config {
    /// Attempts to read configuration from environment variables. Only
    /// `AWS_LAMBDA_RUNTIME_API` is strictly required for the runtime to
    /// operate; the remaining fields default when absent so local testing
    /// doesn't require the full Lambda environment.
    pub fn from_env() -> Self {
        Config {
            function_name: env::var("AWS_LAMBDA_FUNCTION_NAME").unwrap_or_default(),
            memory: env::var("AWS_LAMBDA_FUNCTION_MEMORY_SIZE")
                .ok()
                .and_then(|v| v.parse::<i32>().ok())
                .unwrap_or_default(),
            version: env::var("AWS_LAMBDA_FUNCTION_VERSION").unwrap_or_default(),
            log_stream: env::var("AWS_LAMBDA_LOG_STREAM_NAME").unwrap_or_default(),
            log_group: env::var("AWS_LAMBDA_LOG_GROUP_NAME").unwrap_or_default(),
        }
    }
}

/// Return a new [`ServiceFn`] with a closure that takes an event and context as separate arguments.
#[deprecated(since = "0.1.0", note = "Use `service_fn` and `LambdaEvent` instead")]
pub fn handler_fn<A, F, Fut>(f: F) -> ServiceFn<impl Fn(LambdaEvent<A>) -> Fut>
where
    F: Fn(A, Context) -> Fut,
{
    service_fn(move |req: LambdaEvent<A>| f(req.payload, req.context))
}

struct Runtime {
    client: Client,
    config: RefConfig,
}

impl Runtime {
    async fn run<F, A, R>(
        &self,
        incoming: impl Stream<Item = Result<http::Response<hyper::body::Incoming>, Error>> + Send,
        mut handler: F,
    ) -> Result<(), BoxError>
    where
        F: Service<LambdaEvent<A>>,
        F::Future: Future<Output = Result<R, F::Error>>,
        F::Error: fmt::Debug + Into<Diagnostic>,
        A: for<'de> Deserialize<'de>,
        R: Serialize,
    {
        let client = &self.client;
        tokio::pin!(incoming);
        while let Some(next_event_response) = incoming.next().await {
            trace!("New event arrived (run loop)");
            let event = next_event_response?;
            let (parts, body) = event.into_parts();
            let request_id = invoke_request_id(&parts.headers)?;

            let ctx: Context = Context::new(request_id, self.config.clone(), &parts.headers)?;
            let request_span = ctx.request_span();

            // Group the handling in one future and instrument it with the span
            async {
                let body = http_body_util::BodyExt::collect(body).await?.to_bytes();
                trace!("invocation body - {}", String::from_utf8_lossy(&body));

                let lambda_event = match deserializer::deserialize(&body, ctx) {
                    Ok(lambda_event) => lambda_event,
                    Err(err) => {
                        let req = build_event_error_request(request_id, err)?;
                        client.call(req).await.expect("Unable to send response to control plane");
                        return Ok(());
                    }
                };

                let req = match handler.ready().await {
                    Ok(handler) => {
                        // Catches panics outside of a `Future`
                        let task = panic::catch_unwind(panic::AssertUnwindSafe(|| handler.call(lambda_event)));

                        let task = match task {
                            // Catches panics inside of the `Future`
                            Ok(task) => panic::AssertUnwindSafe(task).catch_unwind().await,
                            Err(err) => Err(err),
                        };

                        match task {
                            Ok(response) => match response {
                                Ok(response) => {
                                    trace!("Ok response from handler (run loop)");
                                    EventCompletionRequest::new(request_id, response).into_req()
                                }
                                Err(err) => build_event_error_request(request_id, err),
                            },
                            Err(err) => {
                                error!("{:?}", err);
                                let error_type = type_name_of_val(&err);
                                let msg = if let Some(msg) = err.downcast_ref::<&str>() {
                                    format!("handler panicked: {msg}")
                                } else {
                                    "handler panicked".to_string()
                                };
                                EventErrorRequest::new(request_id, error_type, &msg).into_req()
                            }
                        }
                    }
                    Err(err) => build_event_error_request(request_id, err),
                }?;

                client.call(req).await.expect("Unable to send response to control plane");
                Ok::<(), Error>(())
            }
            .instrument(request_span)
            .await?;
        }
        Ok(())
    }
}

fn incoming(client: &Client) -> impl Stream<Item = Result<http::Response<hyper::body::Incoming>, Error>> + Send + '_ {
    async_stream::stream! {
        loop {
            trace!("Waiting for next event (incoming loop)");
            let req = NextEventRequest.into_req().expect("Unable to construct request");
            let res = client.call(req).await;
            yield res;
        }
    }
}

/// Starts the event loop and begins polling for invocations on the control
/// plane exposed through `AWS_LAMBDA_RUNTIME_API`.
///
/// # Example
/// ```no_run
/// use bun_lambda_runtime::{Error, service_fn, LambdaEvent};
/// use serde_json::Value;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Error> {
///     let func = service_fn(func);
///     bun_lambda_runtime::run(func).await?;
///     Ok(())
/// }
///
/// async fn func(event: LambdaEvent<Value>) -> Result<Value, Error> {
///     Ok(event.payload)
/// }
/// ```
pub async fn run<A, F, R>(handler: F) -> Result<(), Error>
where
    F: Service<LambdaEvent<A>>,
    F::Future: Future<Output = Result<R, F::Error>>,
    F::Error: fmt::Debug + Into<Diagnostic>,
    A: for<'de> Deserialize<'de>,
    R: Serialize,
{
    trace!("Loading config from env");
    let config = Config::from_env();
    let client = match Client::builder().build() {
        Ok(client) => client,
        Err(err) => {
            report_init_error(&err.to_string()).await;
            return Err(err.into());
        }
    };
    let runtime = Runtime {
        client,
        config: Arc::new(config),
    };

    let client = &runtime.client;
    let incoming = incoming(client);
    runtime.run(incoming, handler).await
}

/// Reports an initialization failure to the control plane before the process
/// exits, retrying with a short, fixed backoff if the POST itself fails
/// (the control plane endpoint may not be reachable yet during a cold
/// restart of the local proxy).
///
/// Exposed so that callers with their own pre-[`run`] setup (spawning a
/// child process before the event loop starts, say) can report a failure
/// there through the same channel, rather than invent a second one.
pub async fn report_init_error(message: &str) {
    let client = match Client::builder().build() {
        Ok(client) => client,
        Err(err) => {
            error!("unable to build a client to report init error: {err}");
            return;
        }
    };
    let req = InitErrorRequest::new("runtime.InitError", message);
    for attempt in 1..=INIT_ERROR_MAX_ATTEMPTS {
        let Ok(req) = req_clone(&req) else { break };
        match client.call(req).await {
            Ok(_) => return,
            Err(err) if attempt < INIT_ERROR_MAX_ATTEMPTS => {
                error!("attempt {attempt} to report init error failed: {err}, retrying");
                tokio::time::sleep(INIT_ERROR_RETRY_BACKOFF).await;
            }
            Err(err) => {
                error!("giving up reporting init error after {attempt} attempts: {err}");
            }
        }
    }
}

fn req_clone(req: &InitErrorRequest) -> Result<Request<Body>, Error> {
    InitErrorRequest::new(&req.diagnostic.error_type, &req.diagnostic.error_message).into_req()
}

fn type_name_of_val<T>(_: T) -> &'static str {
    std::any::type_name::<T>()
}

fn build_event_error_request<T>(request_id: &str, err: T) -> Result<Request<Body>, Error>
where
    T: Debug + Into<Diagnostic>,
{
    error!("{:?}", err);
    let diagnostic = err.into();
    EventErrorRequest { request_id, diagnostic }.into_req()
}

#[cfg(test)]
mod endpoint_tests {
    use crate::{
        incoming,
        requests::{EventCompletionRequest, EventErrorRequest, IntoRequest, NextEventRequest},
        types::Diagnostic,
        Config, Error, Runtime,
    };
    use futures::future::BoxFuture;
    use http::{HeaderValue, StatusCode};
    use http_body_util::BodyExt;
    use httpmock::prelude::*;

    use bun_lambda_runtime_api_client::Client;
    use std::sync::Arc;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_next_event() -> Result<(), Error> {
        let server = MockServer::start();
        let request_id = "156cb537-e2d4-11e8-9b34-d36013741fb9";
        let deadline = "1542409706888";

        let mock = server.mock(|when, then| {
            when.method(GET).path("/2018-06-01/runtime/invocation/next");
            then.status(200)
                .header("content-type", "application/json")
                .header("lambda-runtime-aws-request-id", request_id)
                .header("lambda-runtime-deadline-ms", deadline)
                .body("{}");
        });

        let base = server.base_url().parse().expect("Invalid mock server Uri");
        let client = Client::builder().with_endpoint(base).build()?;

        let req = NextEventRequest.into_req()?;
        let rsp = client.call(req).await.expect("Unable to send request");

        mock.assert_async().await;
        assert_eq!(rsp.status(), StatusCode::OK);
        assert_eq!(
            rsp.headers()["lambda-runtime-aws-request-id"],
            &HeaderValue::from_static(request_id)
        );
        assert_eq!(
            rsp.headers()["lambda-runtime-deadline-ms"],
            &HeaderValue::from_static(deadline)
        );

        let body = rsp.into_body().collect().await?.to_bytes();
        assert_eq!("{}", std::str::from_utf8(&body)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_ok_response() -> Result<(), Error> {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/2018-06-01/runtime/invocation/156cb537-e2d4-11e8-9b34-d36013741fb9/response")
                .body("\"{}\"");
            then.status(200).body("");
        });

        let base = server.base_url().parse().expect("Invalid mock server Uri");
        let client = Client::builder().with_endpoint(base).build()?;

        let req = EventCompletionRequest::new("156cb537-e2d4-11e8-9b34-d36013741fb9", "{}");
        let req = req.into_req()?;

        let rsp = client.call(req).await?;

        mock.assert_async().await;
        assert_eq!(rsp.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn test_error_response() -> Result<(), Error> {
        let diagnostic = Diagnostic::new("InvalidEventDataError", "Error parsing event data");
        let body = serde_json::to_string(&diagnostic)?;

        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/2018-06-01/runtime/invocation/156cb537-e2d4-11e8-9b34-d36013741fb9/error")
                .header("lambda-runtime-function-error-type", "unhandled")
                .body(body);
            then.status(200).body("");
        });

        let base = server.base_url().parse().expect("Invalid mock server Uri");
        let client = Client::builder().with_endpoint(base).build()?;

        let req = EventErrorRequest {
            request_id: "156cb537-e2d4-11e8-9b34-d36013741fb9",
            diagnostic,
        };
        let req = req.into_req()?;
        let rsp = client.call(req).await?;

        mock.assert_async().await;
        assert_eq!(rsp.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn successful_end_to_end_run() -> Result<(), Error> {
        let server = MockServer::start();
        let request_id = "156cb537-e2d4-11e8-9b34-d36013741fb9";
        let deadline = "1542409706888";

        let next_request = server.mock(|when, then| {
            when.method(GET).path("/2018-06-01/runtime/invocation/next");
            then.status(200)
                .header("content-type", "application/json")
                .header("lambda-runtime-aws-request-id", request_id)
                .header("lambda-runtime-deadline-ms", deadline)
                .body("{}");
        });
        let next_response = server.mock(|when, then| {
            when.method(POST)
                .path(format!("/2018-06-01/runtime/invocation/{}/response", request_id))
                .body("{}");
            then.status(200).body("");
        });

        let base = server.base_url().parse().expect("Invalid mock server Uri");
        let client = Client::builder().with_endpoint(base).build()?;

        async fn func(event: crate::LambdaEvent<serde_json::Value>) -> Result<serde_json::Value, Error> {
            let (event, _) = event.into_parts();
            Ok(event)
        }
        let f = crate::service_fn(func);

        let config = Config::default();

        let runtime = Runtime {
            client,
            config: Arc::new(config),
        };
        let client = &runtime.client;
        let incoming = incoming(client).take(1);
        runtime.run(incoming, f).await?;

        next_request.assert_async().await;
        next_response.assert_async().await;
        Ok(())
    }

    async fn run_panicking_handler<F>(func: F) -> Result<(), Error>
    where
        F: FnMut(crate::LambdaEvent<serde_json::Value>) -> BoxFuture<'static, Result<serde_json::Value, Error>>,
    {
        let server = MockServer::start();
        let request_id = "156cb537-e2d4-11e8-9b34-d36013741fb9";
        let deadline = "1542409706888";

        let next_request = server.mock(|when, then| {
            when.method(GET).path("/2018-06-01/runtime/invocation/next");
            then.status(200)
                .header("content-type", "application/json")
                .header("lambda-runtime-aws-request-id", request_id)
                .header("lambda-runtime-deadline-ms", deadline)
                .body("{}");
        });

        let next_response = server.mock(|when, then| {
            when.method(POST)
                .path(format!("/2018-06-01/runtime/invocation/{}/error", request_id))
                .header("lambda-runtime-function-error-type", "unhandled");
            then.status(200).body("");
        });

        let base = server.base_url().parse().expect("Invalid mock server Uri");
        let client = Client::builder().with_endpoint(base).build()?;

        let f = crate::service_fn(func);
        let config = Arc::new(Config::default());

        let runtime = Runtime { client, config };
        let client = &runtime.client;
        let incoming = incoming(client).take(1);
        runtime.run(incoming, f).await?;

        next_request.assert_async().await;
        next_response.assert_async().await;
        Ok(())
    }

    #[tokio::test]
    async fn panic_in_async_run() -> Result<(), Error> {
        run_panicking_handler(|_| Box::pin(async { panic!("This is intentionally here") })).await
    }

    #[tokio::test]
    async fn panic_outside_async_run() -> Result<(), Error> {
        run_panicking_handler(|_| {
            panic!("This is intentionally here");
        })
        .await
    }
}
