use http::HeaderMap;
use serde_json::Value;
use std::collections::HashMap;

/// Headers that contain security-sensitive values and must be redacted.
pub const SENSITIVE_HEADERS: &[&str] = &[
    "authorization",
    "cookie",
    "set-cookie",
    "x-github-token",
    "x-hub-signature",
    "x-hub-signature-256",
];

/// JSON keys whose values are always redacted, at any depth.
const SENSITIVE_KEYS: &[&str] = &[
    "token",
    "access_token",
    "private_key",
    "secret",
    "webhook_secret",
    "password",
];

const REDACTED: &str = "[REDACTED]";

pub struct Sanitizer;

impl Sanitizer {
    pub fn is_sensitive_header(header_name: &str) -> bool {
        let lower = header_name.to_lowercase();
        SENSITIVE_HEADERS.contains(&lower.as_str())
    }

    /// Copy a header map into plain strings, redacting sensitive values.
    /// Non-UTF-8 values are dropped.
    pub fn sanitize_header_map(headers: &HeaderMap) -> HashMap<String, String> {
        headers
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                let value = if Self::is_sensitive_header(name.as_str()) {
                    REDACTED.to_string()
                } else {
                    value.to_string()
                };
                Some((name.to_string(), value))
            })
            .collect()
    }

    /// Remove sensitive data from JSON payloads
    pub fn sanitize_json(value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, val)| {
                        let sanitized = if SENSITIVE_KEYS.contains(&key.as_str()) {
                            Value::String(REDACTED.to_string())
                        } else {
                            Self::sanitize_json(val)
                        };
                        (key.clone(), sanitized)
                    })
                    .collect(),
            ),
            Value::Array(arr) => Value::Array(arr.iter().map(Self::sanitize_json).collect()),
            _ => value.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;
    use serde_json::json;

    #[test]
    fn test_sensitive_headers_are_redacted() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer ghs_abc"));
        headers.insert("x-hub-signature-256", HeaderValue::from_static("sha256=00"));
        headers.insert("x-github-event", HeaderValue::from_static("issue_comment"));

        let sanitized = Sanitizer::sanitize_header_map(&headers);

        assert_eq!(sanitized["authorization"], "[REDACTED]");
        assert_eq!(sanitized["x-hub-signature-256"], "[REDACTED]");
        assert_eq!(sanitized["x-github-event"], "issue_comment");
    }

    #[test]
    fn test_nested_json_secrets_are_redacted() {
        let value = json!({
            "token": "ghs_abc",
            "issue": {"number": 3, "labels": [{"name": "phase1", "secret": "x"}]}
        });

        let sanitized = Sanitizer::sanitize_json(&value);

        assert_eq!(sanitized["token"], "[REDACTED]");
        assert_eq!(sanitized["issue"]["number"], 3);
        assert_eq!(sanitized["issue"]["labels"][0]["name"], "phase1");
        assert_eq!(sanitized["issue"]["labels"][0]["secret"], "[REDACTED]");
    }
}
