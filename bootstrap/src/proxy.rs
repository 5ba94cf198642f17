//! Proxies a translated request to the Bun child process over a Unix
//! domain socket, and translates its response back (spec §4.4, §9 Design
//! Notes option (c)).
use std::fmt;

use bun_lambda_http::{Body, Diagnostic, Request, Response};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use tokio::net::UnixStream;

/// The status the dispatcher shim (`runtime/index.js`) uses on its
/// responses to signal a handler-resolution or handler-execution failure,
/// rather than an actual response from the user's handler.
pub const DISPATCH_ERROR_STATUS: u16 = 569;

/// A dispatch error reported by the child process on [`DISPATCH_ERROR_STATUS`].
#[derive(Debug, serde::Deserialize)]
struct DispatchErrorEnvelope {
    #[serde(rename = "errorType")]
    error_type: String,
    #[serde(rename = "errorMessage")]
    error_message: String,
    #[serde(rename = "stackTrace", default)]
    stack_trace: Vec<String>,
}

/// Everything that can go wrong proxying a request to the child process.
///
/// The [`Handler`][DispatchError::Handler] variant carries the guest
/// language's own `errorType`/`errorMessage`/`stackTrace` verbatim (spec
/// §3 Error envelope) rather than collapsing them into a single message —
/// the dynamic, handler-supplied classification (e.g. `ValidationError`)
/// is the whole point; a Rust type name would lose it.
#[derive(Debug)]
pub enum DispatchError {
    /// Could not reach, or lost the connection to, the child process's
    /// socket.
    Transport(Box<dyn std::error::Error + Send + Sync>),
    /// The child reported a handler-resolution or handler-execution
    /// failure on [`DISPATCH_ERROR_STATUS`].
    Handler {
        /// The error's type, as reported by the guest handler or the
        /// dispatcher shim (e.g. `HandlerNotFound`, `ValidationError`).
        error_type: String,
        /// A human-readable description of the failure.
        error_message: String,
        /// Stack frames, oldest call first.
        stack_trace: Vec<String>,
    },
    /// The child's error envelope on [`DISPATCH_ERROR_STATUS`] was not
    /// valid JSON, or did not match the expected shape.
    MalformedErrorEnvelope(serde_json::Error),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Transport(err) => write!(f, "dispatcher socket error: {err}"),
            DispatchError::Handler { error_type, error_message, .. } => {
                write!(f, "{error_type}: {error_message}")
            }
            DispatchError::MalformedErrorEnvelope(err) => {
                write!(f, "dispatcher returned a malformed error envelope: {err}")
            }
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DispatchError::Transport(err) => Some(err.as_ref()),
            DispatchError::MalformedErrorEnvelope(err) => Some(err),
            DispatchError::Handler { .. } => None,
        }
    }
}

impl From<DispatchError> for Diagnostic {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Handler { error_type, error_message, stack_trace } => {
                Diagnostic { error_type, error_message, stack_trace }
            }
            other => Diagnostic::new("DispatchError", other.to_string()),
        }
    }
}

impl From<hyper::Error> for DispatchError {
    fn from(err: hyper::Error) -> Self {
        DispatchError::Transport(Box::new(err))
    }
}

impl From<std::io::Error> for DispatchError {
    fn from(err: std::io::Error) -> Self {
        DispatchError::Transport(Box::new(err))
    }
}

/// Opens a fresh HTTP/1.1 connection to `socket_path`, sends `request`,
/// and translates the dispatcher's response back into an
/// `http::Response<Body>`.
///
/// A fresh connection per call is correct here, not merely simple: the
/// concurrency model guarantees exactly one invocation is ever in flight
/// (spec §5), so there is never a second request to multiplex alongside
/// this one.
pub async fn dispatch(request: Request, socket_path: &str) -> Result<Response, DispatchError> {
    let stream = UnixStream::connect(socket_path).await?;
    let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;

    tokio::spawn(async move {
        if let Err(err) = connection.await {
            tracing::error!(error = %err, "dispatcher connection closed with an error");
        }
    });

    let (parts, body) = request.into_parts();
    let outgoing = http::Request::from_parts(parts, Full::new(Bytes::from(body.as_ref().to_vec())));

    let incoming = sender.send_request(outgoing).await?;
    let (parts, body) = incoming.into_parts();
    let collected = body.collect().await?.to_bytes();

    if parts.status.as_u16() == DISPATCH_ERROR_STATUS {
        let envelope: DispatchErrorEnvelope =
            serde_json::from_slice(&collected).map_err(DispatchError::MalformedErrorEnvelope)?;
        return Err(DispatchError::Handler {
            error_type: envelope.error_type,
            error_message: envelope.error_message,
            stack_trace: envelope.stack_trace,
        });
    }

    let body = if collected.is_empty() { Body::Empty } else { Body::Binary(collected.to_vec()) };
    Ok(http::Response::from_parts(parts, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_error_preserves_dynamic_error_type_and_stack() {
        let err = DispatchError::Handler {
            error_type: "ValidationError".to_string(),
            error_message: "bad input".to_string(),
            stack_trace: vec!["at handler (index.ts:3:1)".to_string()],
        };
        let diagnostic: Diagnostic = err.into();
        assert_eq!(diagnostic.error_type, "ValidationError");
        assert_eq!(diagnostic.error_message, "bad input");
        assert_eq!(diagnostic.stack_trace, vec!["at handler (index.ts:3:1)".to_string()]);
    }
}
