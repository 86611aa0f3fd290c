//! Response Decoding
//!
//! Status validation, body extraction and JSON decoding shared by the flow
//! and cluster lookups.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::error::UpstreamError;
use crate::transport::RawResponse;

/// Upper bound on how much of a failing body goes into debug logs
const MAX_LOGGED_BODY: usize = 2048;

/// Extract the body of a successful upstream answer.
///
/// A missing body is reported before the status so a malformed answer is
/// distinguishable from a plain error status. An empty body on 200 is
/// returned as-is.
pub fn read_body(response: Result<RawResponse, UpstreamError>) -> Result<Vec<u8>, UpstreamError> {
    let response = response?;

    let Some(body) = response.body else {
        return Err(UpstreamError::EmptyBody {
            url: response.url,
            status: response.status,
        });
    };

    if response.status != 200 {
        debug!(
            url = %response.url,
            status = response.status,
            body = %loggable(&body),
            "Upstream returned non-OK status"
        );
        return Err(UpstreamError::Status {
            url: response.url,
            status: response.status,
        });
    }

    Ok(body)
}

/// Decode a JSON body into `T`, logging the raw body on failure
pub fn decode_json<T: DeserializeOwned>(url: &str, body: &[u8]) -> Result<T, UpstreamError> {
    serde_json::from_slice(body).map_err(|source| {
        debug!(
            url = %url,
            error = %source,
            body = %loggable(body),
            "Failed to decode upstream response"
        );
        UpstreamError::Decode {
            url: url.to_string(),
            source,
        }
    })
}

/// Deserialize JSON `null` as the type's default.
///
/// Pair with `#[serde(default)]` so a missing key and an explicit `null`
/// both decode to the empty value.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn loggable(body: &[u8]) -> String {
    let end = body.len().min(MAX_LOGGED_BODY);
    let mut text = String::from_utf8_lossy(&body[..end]).into_owned();
    if body.len() > MAX_LOGGED_BODY {
        text.push_str("...");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: Option<&str>) -> Result<RawResponse, UpstreamError> {
        Ok(RawResponse {
            url: "https://river.test/flows/f1".to_string(),
            status,
            body: body.map(|b| b.as_bytes().to_vec()),
        })
    }

    #[test]
    fn test_read_body_ok() {
        let body = read_body(response(200, Some("{\"a\":1}"))).unwrap();
        assert_eq!(body, b"{\"a\":1}");
    }

    #[test]
    fn test_read_body_zero_length_is_not_empty_body_error() {
        let body = read_body(response(200, Some(""))).unwrap();
        assert!(body.is_empty());
    }

    #[test]
    fn test_read_body_missing_body() {
        let err = read_body(response(200, None)).unwrap_err();
        assert!(matches!(err, UpstreamError::EmptyBody { status: 200, .. }));
    }

    #[test]
    fn test_read_body_missing_body_wins_over_status() {
        let err = read_body(response(500, None)).unwrap_err();
        assert!(matches!(err, UpstreamError::EmptyBody { status: 500, .. }));
    }

    #[test]
    fn test_read_body_non_ok_status() {
        let err = read_body(response(404, Some("not found"))).unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 404, .. }));
    }

    #[test]
    fn test_read_body_other_2xx_is_rejected() {
        let err = read_body(response(201, Some("{}"))).unwrap_err();
        assert_eq!(err.status(), Some(201));
    }

    #[test]
    fn test_read_body_passes_transport_error_through() {
        let err = read_body(Err(UpstreamError::transport("https://x", "connection refused")))
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Transport { .. }));
    }

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    #[test]
    fn test_decode_json() {
        let named: Named = decode_json("https://x", b"{\"name\":\"cluster\"}").unwrap();
        assert_eq!(named.name, "cluster");
    }

    #[test]
    fn test_decode_json_malformed() {
        let err = decode_json::<Named>("https://x", b"<html>").unwrap_err();
        assert!(matches!(err, UpstreamError::Decode { .. }));
        assert_eq!(err.url(), "https://x");
    }

    #[derive(Debug, Deserialize)]
    struct Nullable {
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
    }

    #[test]
    fn test_null_as_default() {
        let null: Nullable = decode_json("https://x", b"{\"name\":null}").unwrap();
        assert_eq!(null.name, "");

        let missing: Nullable = decode_json("https://x", b"{}").unwrap();
        assert_eq!(missing.name, "");

        let set: Nullable = decode_json("https://x", b"{\"name\":\"a\"}").unwrap();
        assert_eq!(set.name, "a");

        assert!(decode_json::<Nullable>("https://x", b"{\"name\":3}").is_err());
    }

    #[test]
    fn test_loggable_truncates() {
        let body = vec![b'a'; MAX_LOGGED_BODY + 10];
        let text = loggable(&body);
        assert_eq!(text.len(), MAX_LOGGED_BODY + 3);
        assert!(text.ends_with("..."));
    }
}
