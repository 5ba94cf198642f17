use crate::{Config, Error};
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// The error envelope posted back to the control plane when an invocation,
/// or the init phase itself, fails.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// A short machine-oriented classification of the failure, e.g. the
    /// panicking value's type name or an error's type.
    pub error_type: String,
    /// A human-readable description of the failure.
    pub error_message: String,
    /// Backtrace lines, captured with [`std::backtrace::Backtrace`] when
    /// `RUST_BACKTRACE` is set in the environment. Empty when unavailable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stack_trace: Vec<String>,
}

impl Diagnostic {
    /// Builds a [`Diagnostic`], capturing a backtrace when `RUST_BACKTRACE`
    /// is set in the environment (spec §3 Error envelope `stackTrace`).
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        let backtrace = std::backtrace::Backtrace::capture();
        let stack_trace = match backtrace.status() {
            std::backtrace::BacktraceStatus::Captured => {
                format!("{backtrace}").lines().map(str::to_string).collect()
            }
            _ => Vec::new(),
        };
        Diagnostic {
            error_type: error_type.into(),
            error_message: error_message.into(),
            stack_trace,
        }
    }
}

/// The Lambda function execution context. The values in this struct
/// are populated using the runtime's own environment variables
/// and the headers returned by the poll request to the control plane.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq, Default, Serialize, Deserialize)]
pub struct Context {
    /// The request ID generated by the control plane for this invocation.
    pub request_id: String,
    /// The execution deadline for the current invocation in milliseconds.
    pub deadline: u64,
    /// The ARN of the function, version, or alias being invoked.
    pub invoked_function_arn: String,
    /// The X-Ray trace ID for the current invocation, if present.
    pub xray_trace_id: Option<String>,
    /// Function configuration read from the local environment variables.
    pub env_config: Config,
}

impl Context {
    /// Build a [`Context`] from the headers on a `next invocation` response
    /// and the function's environment configuration.
    pub fn new(request_id: &str, config: RefConfig, headers: &HeaderMap) -> Result<Self, Error> {
        let deadline = headers
            .get("lambda-runtime-deadline-ms")
            .ok_or("missing lambda-runtime-deadline-ms header")?
            .to_str()?
            .parse::<u64>()?;

        let invoked_function_arn = headers
            .get("lambda-runtime-invoked-function-arn")
            .map(|v| v.to_str())
            .transpose()?
            .unwrap_or_default()
            .to_owned();

        let xray_trace_id = headers
            .get("lambda-runtime-trace-id")
            .map(|v| String::from_utf8_lossy(v.as_bytes()).to_string());

        Ok(Context {
            request_id: request_id.to_owned(),
            deadline,
            invoked_function_arn,
            xray_trace_id,
            env_config: (*config).clone(),
        })
    }

    /// A `tracing` span that groups everything logged while this invocation
    /// is being handled.
    pub fn request_span(&self) -> tracing::Span {
        tracing::info_span!("invocation", request_id = %self.request_id)
    }
}

/// Shared handle to the function's environment configuration.
pub type RefConfig = std::sync::Arc<Config>;

impl TryFrom<HeaderMap> for Context {
    type Error = Error;
    fn try_from(headers: HeaderMap) -> Result<Self, Self::Error> {
        let request_id = headers
            .get("lambda-runtime-aws-request-id")
            .ok_or("missing lambda-runtime-aws-request-id header")?
            .to_str()?
            .to_owned();
        Context::new(&request_id, RefConfig::new(Config::default()), &headers)
    }
}

/// Extracts the request ID from the headers on a `next invocation` response.
pub(crate) fn invoke_request_id(headers: &HeaderMap) -> Result<&str, Error> {
    Ok(headers
        .get("lambda-runtime-aws-request-id")
        .ok_or("missing lambda-runtime-aws-request-id header")?
        .to_str()?)
}

/// Incoming invocation containing the event payload and its context.
#[derive(Clone, Debug)]
pub struct LambdaEvent<T> {
    /// Event payload.
    pub payload: T,
    /// Invocation context.
    pub context: Context,
}

impl<T> LambdaEvent<T> {
    /// Creates a new Lambda request
    pub fn new(payload: T, context: Context) -> Self {
        Self { payload, context }
    }

    /// Split the Lambda event into its payload and context.
    pub fn into_parts(self) -> (T, Context) {
        (self.payload, self.context)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn round_trip_lambda_error() {
        use serde_json::{json, Value};
        let expected = json!({
            "errorType": "InvalidEventDataError",
            "errorMessage": "Error parsing event data.",
        });

        let actual = Diagnostic {
            error_type: "InvalidEventDataError".into(),
            error_message: "Error parsing event data.".into(),
            stack_trace: Vec::new(),
        };
        let actual: Value = serde_json::to_value(actual).expect("failed to serialize diagnostic");
        assert_eq!(expected, actual);
    }

    #[test]
    fn context_with_expected_values_and_types_resolves() {
        let mut headers = HeaderMap::new();
        headers.insert("lambda-runtime-deadline-ms", HeaderValue::from_static("123"));
        headers.insert(
            "lambda-runtime-invoked-function-arn",
            HeaderValue::from_static("arn::myarn"),
        );
        headers.insert("lambda-runtime-trace-id", HeaderValue::from_static("arn::myarn"));
        let tried = Context::new("my-id", RefConfig::new(Config::default()), &headers);
        assert!(tried.is_ok());
    }

    #[test]
    fn context_with_missing_optional_headers_still_resolves() {
        let mut headers = HeaderMap::new();
        headers.insert("lambda-runtime-deadline-ms", HeaderValue::from_static("123"));
        let tried = Context::new("my-id", RefConfig::new(Config::default()), &headers);
        assert!(tried.is_ok());
    }

    #[test]
    fn context_with_bad_deadline_type_is_err() {
        let mut headers = HeaderMap::new();
        headers.insert("lambda-runtime-deadline-ms", HeaderValue::from_static("BAD-Type,not <u64>"));
        let tried = Context::new("my-id", RefConfig::new(Config::default()), &headers);
        assert!(tried.is_err());
    }

    #[test]
    fn context_with_missing_deadline_is_err() {
        let headers = HeaderMap::new();
        let tried = Context::new("my-id", RefConfig::new(Config::default()), &headers);
        assert!(tried.is_err());
    }
}
