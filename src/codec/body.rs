//! Body encoding.

use serde_json::Value;

use crate::codec::CodecError;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const APPLICATION_JSON: &str = "application/json";

/// Encoded body with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Strings go out as raw text, any other value as JSON.
pub fn encode_body(value: &Value) -> Result<EncodedBody, CodecError> {
    match value {
        Value::String(text) => Ok(EncodedBody {
            content_type: TEXT_PLAIN,
            bytes: text.as_bytes().to_vec(),
        }),
        other => Ok(EncodedBody {
            content_type: APPLICATION_JSON,
            bytes: serde_json::to_vec(other)?,
        }),
    }
}

/// Whether a content type is `text/*`.
pub fn is_text(content_type: Option<&str>) -> bool {
    content_type
        .map(|ct| ct.trim_start().to_ascii_lowercase().starts_with("text/"))
        .unwrap_or(false)
}

/// Inverse of [`encode_body`]. `text/*` decodes to a string (possibly
/// empty); an empty non-text body decodes to `null`; anything else is
/// parsed as JSON.
pub fn decode_body(content_type: Option<&str>, bytes: &[u8]) -> Result<Value, CodecError> {
    if is_text(content_type) {
        let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
        return Ok(Value::String(text.to_string()));
    }

    if bytes.is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_is_plain_text() {
        let body = encode_body(&json!("GET request")).unwrap();
        assert_eq!(body.content_type, TEXT_PLAIN);
        assert_eq!(body.bytes, b"GET request");
        assert_eq!(
            decode_body(Some(body.content_type), &body.bytes).unwrap(),
            json!("GET request")
        );
    }

    #[test]
    fn test_json_values() {
        let value = json!({ "id": 1, "tags": ["a"] });
        let body = encode_body(&value).unwrap();
        assert_eq!(body.content_type, APPLICATION_JSON);
        assert_eq!(decode_body(Some(APPLICATION_JSON), &body.bytes).unwrap(), value);

        // a JSON-encoded string stays distinguishable from raw text
        assert_eq!(decode_body(None, br#""quoted""#).unwrap(), json!("quoted"));
    }

    #[test]
    fn test_empty_and_malformed() {
        assert_eq!(decode_body(Some(APPLICATION_JSON), b"").unwrap(), Value::Null);
        assert_eq!(decode_body(Some(TEXT_PLAIN), b"").unwrap(), json!(""));
        assert!(matches!(
            decode_body(Some(APPLICATION_JSON), b"{not json"),
            Err(CodecError::Json(_))
        ));
        assert!(matches!(
            decode_body(Some("text/plain"), &[0xff, 0xfe]),
            Err(CodecError::InvalidUtf8)
        ));
    }
}
