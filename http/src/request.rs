//! Translates an [`InvocationEvent`] into an `http::Request<Body>` the
//! handler can act on (spec §4.4 Request Translation).
use base64::Engine;
use http::{header::HeaderName, HeaderMap, HeaderValue, Method, Request, Uri};

use crate::{body::Body, error::TranslationError, event::InvocationEvent};

const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

impl TryFrom<InvocationEvent> for Request<Body> {
    type Error = TranslationError;

    fn try_from(event: InvocationEvent) -> Result<Self, Self::Error> {
        let scheme = event
            .headers
            .get(X_FORWARDED_PROTO)
            .ok_or(TranslationError::MissingForwardedProto)?;

        let uri: Uri = format!("{scheme}://{}{}", event.host, event.path)
            .parse()
            .map_err(TranslationError::InvalidUrl)?;

        let method = event
            .method
            .parse::<Method>()
            .map_err(|_| TranslationError::InvalidHeader(format!("invalid method: {}", event.method)))?;

        let mut headers = HeaderMap::with_capacity(event.headers.len());
        for (name, value) in &event.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| TranslationError::InvalidHeader(name.clone()))?;
            let value =
                HeaderValue::from_str(value).map_err(|_| TranslationError::InvalidHeader(value.clone()))?;
            headers.append(name, value);
        }

        let body = match &event.body {
            None => Body::Empty,
            Some(encoded) => decode_body(encoded, &event.encoding)?,
        };

        let mut builder = Request::builder().method(method).uri(uri);
        *builder.headers_mut().expect("request builder has no error yet") = headers;
        builder.body(body).map_err(|_| TranslationError::MissingForwardedProto)
    }
}

fn decode_body(encoded: &str, encoding: &str) -> Result<Body, TranslationError> {
    if encoding != "base64" {
        return Err(TranslationError::UnsupportedEncoding(encoding.to_string()));
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(TranslationError::InvalidBodyEncoding)?;
    Ok(Body::Binary(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn event(body: Option<&str>, encoding: &str, proto: Option<&str>) -> InvocationEvent {
        let mut headers = HashMap::new();
        if let Some(proto) = proto {
            headers.insert(X_FORWARDED_PROTO.to_string(), proto.to_string());
        }
        InvocationEvent {
            method: "GET".to_string(),
            path: "/ping".to_string(),
            host: "example.com".to_string(),
            headers,
            body: body.map(str::to_string),
            encoding: encoding.to_string(),
            invoked_at: None,
            max_duration: None,
            features: serde_json::Value::Null,
        }
    }

    #[test]
    fn simple_get_translates_scheme_host_and_path() {
        let req: Request<Body> = event(None, "base64", Some("https")).try_into().unwrap();
        assert_eq!(req.method(), Method::GET);
        assert_eq!(req.uri(), &"https://example.com/ping".parse::<Uri>().unwrap());
        assert_eq!(req.body(), &Body::Empty);
    }

    #[test]
    fn missing_forwarded_proto_fails_translation() {
        let err = Request::<Body>::try_from(event(None, "base64", None)).unwrap_err();
        assert!(matches!(err, TranslationError::MissingForwardedProto));
    }

    #[test]
    fn decodes_base64_binary_body() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([0x00u8, 0xffu8, 0x10u8]);
        let req: Request<Body> = event(Some(&encoded), "base64", Some("https")).try_into().unwrap();
        assert_eq!(req.body(), &Body::Binary(vec![0x00, 0xff, 0x10]));
    }

    #[test]
    fn unsupported_encoding_fails_translation() {
        let err = Request::<Body>::try_from(event(Some("deadbeef"), "hex", Some("https"))).unwrap_err();
        assert!(matches!(err, TranslationError::UnsupportedEncoding(e) if e == "hex"));
    }

    #[test]
    fn all_request_headers_are_preserved() {
        let mut e = event(None, "base64", Some("https"));
        e.headers.insert("x-api-key".to_string(), "secret".to_string());
        let req: Request<Body> = e.try_into().unwrap();
        assert_eq!(req.headers().get(X_FORWARDED_PROTO).unwrap(), "https");
        assert_eq!(req.headers().get("x-api-key").unwrap(), "secret");
    }
}
