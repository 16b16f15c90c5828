use std::time::Duration;

use crate::loader::error::ConfigLoadError;

pub fn non_empty(raw: String) -> Option<String> {
    if raw.trim().is_empty() { None } else { Some(raw) }
}

pub fn parse_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|part| {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}

/// Parse a humantime duration, rejecting zero.
pub fn parse_duration(key: &str, raw: &str) -> Result<Duration, ConfigLoadError> {
    let duration = humantime::parse_duration(raw.trim()).map_err(|err| {
        ConfigLoadError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: err.to_string(),
        }
    })?;
    if duration.is_zero() {
        return Err(ConfigLoadError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(duration)
}
