//! Envelope codec for the form-encoded JSON-RPC wire format
//!
//! Requests travel as an `application/x-www-form-urlencoded` body with a
//! single field:
//!
//! ```text
//! JSON-RPC=<percent-encoded {"method": ..., "params": {...}}>
//! ```
//!
//! Responses are plain JSON: `{ "result": ... }` or `{ "error": ... }`.
//!
//! # Examples
//!
//! ```rust
//! use mgapi_core::{codec, RpcRequest};
//! use serde_json::json;
//!
//! let params = json!({"typeName": "User"}).as_object().cloned().unwrap();
//! let body = codec::encode_request(&RpcRequest::new("Get", params)).unwrap();
//! assert!(body.starts_with("JSON-RPC="));
//!
//! let decoded = codec::decode_request(&body).unwrap();
//! assert_eq!(decoded.method, "Get");
//! assert_eq!(decoded.params["typeName"], "User");
//! ```

use crate::error::{Error, Result};
use crate::types::{RpcRequest, RpcResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Form field carrying the JSON envelope
pub const FORM_FIELD: &str = "JSON-RPC";

/// The form body: one field holding the JSON envelope
#[derive(Debug, Serialize, Deserialize)]
struct FormBody {
    #[serde(rename = "JSON-RPC")]
    envelope: String,
}

/// Encode a request into its form body
///
/// # Errors
///
/// Returns `Error::Serialization` if the parameters cannot be rendered as
/// JSON.
pub fn encode_request(request: &RpcRequest) -> Result<String> {
    let envelope =
        serde_json::to_string(request).map_err(|e| Error::Serialization(e.to_string()))?;
    serde_urlencoded::to_string(FormBody { envelope })
        .map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode a form body back into a request
///
/// Accepts `+` as an encoded space, as form decoders do.
///
/// # Errors
///
/// Returns `Error::Decode` if the body lacks the `JSON-RPC` field, is not
/// valid form encoding, or does not hold a request object.
pub fn decode_request(body: &str) -> Result<RpcRequest> {
    let form: FormBody =
        serde_urlencoded::from_str(body).map_err(|e| Error::Decode(e.to_string()))?;
    serde_json::from_str(&form.envelope).map_err(|e| Error::Decode(e.to_string()))
}

/// Decode a raw response body into the call outcome
///
/// # Errors
///
/// - `Error::EmptyResponse` if the body is empty
/// - `Error::Decode` if the body is not a JSON response object
/// - `Error::Remote` if the service returned an `error` object
pub fn decode_response(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(Error::EmptyResponse);
    }

    let response: RpcResponse =
        serde_json::from_slice(body).map_err(|e| Error::Decode(e.to_string()))?;
    response.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RemoteError;
    use serde_json::{json, Map};

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_encode_has_form_prefix_and_no_raw_json() {
        let body = encode_request(&RpcRequest::new("GetVersion", Map::new())).unwrap();

        assert!(body.starts_with("JSON-RPC="));
        assert!(!body.contains('{'));
        assert!(!body.contains('"'));
        assert!(!body.contains(' '));
    }

    #[test]
    fn test_round_trip_preserves_fields_and_types() {
        let request = RpcRequest::new(
            "Get",
            params(json!({
                "typeName": "User",
                "resultsLimit": 10,
                "active": true,
                "search": {"name": "user@example.com & co"},
                "ids": ["b1", "b2"],
                "missing": null
            })),
        );

        let decoded = decode_request(&encode_request(&request).unwrap()).unwrap();

        assert_eq!(decoded, request);
        assert!(decoded.params["resultsLimit"].is_u64());
        assert!(decoded.params["active"].is_boolean());
    }

    #[test]
    fn test_decode_request_accepts_plus_as_space() {
        let decoded =
            decode_request("JSON-RPC=%7B%22method%22%3A%22Get+Thing%22%2C%22params%22%3A%7B%7D%7D").unwrap();
        assert_eq!(decoded.method, "Get Thing");
    }

    #[test]
    fn test_decode_request_missing_field() {
        assert!(matches!(decode_request("other=1"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_decode_request_ignores_other_fields() {
        let body = format!(
            "trace=abc&{}",
            encode_request(&RpcRequest::new("GetVersion", Map::new())).unwrap()
        );
        assert_eq!(decode_request(&body).unwrap().method, "GetVersion");
    }

    #[test]
    fn test_encode_escapes_form_delimiters() {
        let request = RpcRequest::new("Get", params(json!({"search": "a&b=c+d"})));
        let body = encode_request(&request).unwrap();

        assert_eq!(body.matches('=').count(), 1);
        assert!(!body.contains('&'));
        assert_eq!(decode_request(&body).unwrap(), request);
    }

    #[test]
    fn test_decode_response_result() {
        let value = decode_response(br#"{"result":[{"name":"user@example.com"}]}"#).unwrap();
        assert_eq!(value, json!([{"name": "user@example.com"}]));
    }

    #[test]
    fn test_decode_response_remote_error() {
        let body = json!({
            "error": {
                "name": "JSONRPCError",
                "message": "Incorrect login",
                "errors": [{"name": "InvalidUserException", "message": "Incorrect login"}]
            }
        })
        .to_string();

        match decode_response(body.as_bytes()) {
            Err(Error::Remote(e)) => {
                assert_eq!(
                    e,
                    RemoteError::new("JSONRPCError", "Incorrect login").with_error(
                        crate::RemoteSubError::new("InvalidUserException", "Incorrect login")
                    )
                );
                assert!(e.is_session_invalid());
            }
            other => panic!("Expected remote error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_response_empty_body() {
        assert!(matches!(decode_response(b""), Err(Error::EmptyResponse)));
        assert!(matches!(decode_response(b"  \n"), Err(Error::EmptyResponse)));
    }

    #[test]
    fn test_decode_response_invalid_json() {
        assert!(matches!(decode_response(b"<html>"), Err(Error::Decode(_))));
    }
}
