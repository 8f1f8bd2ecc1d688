use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Missing required environment variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Failed to load environment file: {0}")]
    Environment(String),
}

/// Source of raw configuration values, keyed by environment variable name.
pub type Lookup<'a> = dyn Fn(&str) -> Option<String> + 'a;

/// Older deployments set the server address through these names. The
/// current name wins when both are present.
pub const LEGACY_ALIASES: [(&str, &str); 3] = [
    ("AGENT_HOST", "FASTAPI_HOST"),
    ("AGENT_PORT", "FASTAPI_PORT"),
    ("AGENT_DEBUG", "FASTAPI_DEBUG"),
];

/// Wraps `lookup` so a blank or absent key falls back to its legacy alias.
pub fn with_legacy_aliases<'a>(lookup: &'a Lookup<'a>) -> impl Fn(&str) -> Option<String> + 'a {
    move |key: &str| {
        lookup(key)
            .filter(|value| !value.trim().is_empty())
            .or_else(|| {
                LEGACY_ALIASES
                    .iter()
                    .find(|(current, _)| *current == key)
                    .and_then(|(_, legacy)| lookup(*legacy))
            })
    }
}

/// Returns the trimmed value, treating blank strings as absent.
pub fn read_string(lookup: &Lookup<'_>, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn read_string_or(lookup: &Lookup<'_>, key: &str, default: &str) -> String {
    read_string(lookup, key).unwrap_or_else(|| default.to_string())
}

/// Reads a mandatory value. Absent keys are recorded in `missing` so every
/// gap is reported at once.
pub fn read_required(lookup: &Lookup<'_>, key: &str, missing: &mut Vec<String>) -> String {
    match read_string(lookup, key) {
        Some(value) => value,
        None => {
            missing.push(key.to_string());
            String::new()
        }
    }
}

pub fn read_u64(
    lookup: &Lookup<'_>,
    key: &str,
    default: u64,
    min: u64,
    max: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = read_string(lookup, key) else {
        return Ok(default);
    };
    let value = raw
        .parse::<u64>()
        .map_err(|_| invalid(key, &raw, "expected an unsigned integer"))?;
    if value < min || value > max {
        return Err(invalid(key, &raw, &format!("must be between {} and {}", min, max)));
    }
    Ok(value)
}

pub fn read_f64(
    lookup: &Lookup<'_>,
    key: &str,
    default: f64,
    min: f64,
    max: f64,
) -> Result<f64, ConfigError> {
    let Some(raw) = read_string(lookup, key) else {
        return Ok(default);
    };
    let value = raw
        .parse::<f64>()
        .map_err(|_| invalid(key, &raw, "expected a number"))?;
    if !value.is_finite() || value < min || value > max {
        return Err(invalid(key, &raw, &format!("must be between {} and {}", min, max)));
    }
    Ok(value)
}

pub fn read_bool(lookup: &Lookup<'_>, key: &str, default: bool) -> Result<bool, ConfigError> {
    let Some(raw) = read_string(lookup, key) else {
        return Ok(default);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, &raw, "expected true or false")),
    }
}

/// Comma-separated list; empty entries are dropped.
pub fn read_list(lookup: &Lookup<'_>, key: &str) -> Vec<String> {
    read_string(lookup, key)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| item.to_string())
                .collect()
        })
        .unwrap_or_default()
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
