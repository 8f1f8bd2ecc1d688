use serde_json::{Map, Value};

pub const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 12] = [
    "api_key",
    "apikey",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "auth_",
    "_auth",
    "access_key",
    "bearer",
];

const SENSITIVE_WHITELIST: [&str; 4] = [
    "max_tokens",
    "max_response_tokens",
    "total_tokens",
    "tokens",
];

/// Replaces every non-null value stored under a secret-looking key with
/// [`REDACT_PLACEHOLDER`], recursing through objects and arrays.
pub fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "api_key": "secret",
            "nested": {
                "refresh_token": "refresh",
                "max_response_tokens": 42
            },
            "items": [
                { "password": "pw" }
            ],
            "optional_key": null
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "api_key": "****",
                "nested": {
                    "refresh_token": "****",
                    "max_response_tokens": 42
                },
                "items": [
                    { "password": "****" }
                ],
                "optional_key": null
            })
        );
    }

    #[test]
    fn whitelisted_token_counts_are_not_sensitive() {
        assert!(!is_sensitive_key("MAX_TOKENS"));
        assert!(!is_sensitive_key("collection_name"));
        assert!(is_sensitive_key("QDRANT_API_KEY"));
        assert!(is_sensitive_key("auth_header"));
    }
}
