//! Translates the handler's `http::Response<Body>` back into the
//! [`InvocationResponse`] envelope the control plane expects (spec §4.4
//! Response Translation).
use base64::Engine;
use http::{header::CONTENT_TYPE, HeaderMap, Response as HttpResponse};
use serde::{
    ser::{Error as SerError, SerializeMap},
    Serialize, Serializer,
};

use crate::{body::Body, error::TranslationError};

/// The JSON envelope posted to `/invocation/{id}/response`.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    /// The HTTP status the handler returned.
    pub status_code: u16,
    /// Response headers. A name that appeared more than once in the
    /// handler's response is emitted as an ordered array of its values,
    /// preserving the order duplicates were set in; a single-valued name
    /// stays a scalar string.
    #[serde(skip_serializing_if = "HeaderMap::is_empty", serialize_with = "serialize_headers")]
    pub headers: HeaderMap,
    /// The response body, base64-encoded. Omitted for an empty body,
    /// matching spec's empty-body invariant (never `encoding: "base64"`
    /// with an empty string).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    /// Always `"base64"` when `body` is present, and absent otherwise.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
}

fn serialize_headers<S>(headers: &HeaderMap, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let mut map = serializer.serialize_map(Some(headers.keys_len()))?;
    for key in headers.keys() {
        let values = headers
            .get_all(key)
            .iter()
            .map(|v| v.to_str().map_err(S::Error::custom))
            .collect::<Result<Vec<_>, _>>()?;
        match values.as_slice() {
            [] => {}
            [single] => map.serialize_entry(key.as_str(), single)?,
            many => map.serialize_entry(key.as_str(), many)?,
        }
    }
    map.end()
}

impl TryFrom<HttpResponse<Body>> for InvocationResponse {
    type Error = TranslationError;

    fn try_from(response: HttpResponse<Body>) -> Result<Self, Self::Error> {
        let (parts, body) = response.into_parts();

        let (body, encoding) = if body.is_empty() {
            (None, None)
        } else {
            (Some(base64::engine::general_purpose::STANDARD.encode(body.as_ref())), Some("base64".to_string()))
        };

        Ok(InvocationResponse {
            status_code: parts.status.as_u16(),
            headers: parts.headers,
            body,
            encoding,
        })
    }
}

/// Converts a value into an `http::Response<Body>`.
///
/// Implemented for `Response<B> where B: Into<Body>` and for any `B:
/// Into<Body>` directly, plus `serde_json::Value` for convenience.
pub trait IntoResponse {
    /// Consume `self`, producing a `Response<Body>`.
    fn into_response(self) -> HttpResponse<Body>;
}

impl<B> IntoResponse for HttpResponse<B>
where
    B: Into<Body>,
{
    fn into_response(self) -> HttpResponse<Body> {
        let (parts, body) = self.into_parts();
        HttpResponse::from_parts(parts, body.into())
    }
}

impl IntoResponse for serde_json::Value {
    fn into_response(self) -> HttpResponse<Body> {
        HttpResponse::builder()
            .header(CONTENT_TYPE, "application/json")
            .body(Body::Text(serde_json::to_string(&self).expect("Value always serializes")))
            .expect("a status/header-only builder never fails")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, StatusCode};

    #[test]
    fn simple_get_response_roundtrips_to_base64() {
        let response = HttpResponse::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "text/plain")
            .body(Body::Text("pong".to_string()))
            .unwrap();

        let translated = InvocationResponse::try_from(response).unwrap();
        assert_eq!(translated.status_code, 200);
        assert_eq!(translated.body.as_deref(), Some("cG9uZw=="));
        assert_eq!(translated.encoding.as_deref(), Some("base64"));

        let json = serde_json::to_value(&translated).unwrap();
        assert_eq!(json["headers"]["content-type"], "text/plain");
    }

    #[test]
    fn binary_post_echo_decodes_to_original_bytes() {
        let response = HttpResponse::builder()
            .status(StatusCode::OK)
            .body(Body::Binary(vec![0x00, 0xff, 0x10]))
            .unwrap();
        let translated = InvocationResponse::try_from(response).unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(translated.body.unwrap())
            .unwrap();
        assert_eq!(decoded, vec![0x00, 0xff, 0x10]);
    }

    #[test]
    fn empty_body_omits_encoding_and_body() {
        let response = HttpResponse::builder().status(204).body(Body::Empty).unwrap();
        let translated = InvocationResponse::try_from(response).unwrap();
        assert_eq!(translated.body, None);
        assert_eq!(translated.encoding, None);

        let json = serde_json::to_string(&translated).unwrap();
        assert!(!json.contains("encoding"));
        assert!(!json.contains("\"body\""));
    }

    #[test]
    fn duplicate_header_names_serialize_as_ordered_sequence() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));

        let response = HttpResponse::builder().status(200).body(Body::Empty).unwrap();
        let (mut parts, body) = response.into_parts();
        parts.headers = headers;
        let response = HttpResponse::from_parts(parts, body);

        let translated = InvocationResponse::try_from(response).unwrap();
        let json = serde_json::to_value(&translated).unwrap();
        assert_eq!(json["headers"]["set-cookie"], serde_json::json!(["a=1", "b=2"]));
    }

    #[test]
    fn single_value_header_stays_scalar() {
        let response = HttpResponse::builder()
            .status(200)
            .header("content-type", "text/plain")
            .body(Body::Empty)
            .unwrap();
        let translated = InvocationResponse::try_from(response).unwrap();
        let json = serde_json::to_value(&translated).unwrap();
        assert_eq!(json["headers"]["content-type"], "text/plain");
    }
}
