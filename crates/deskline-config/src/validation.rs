// SPDX-FileCopyrightText: 2026 Deskline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as URL schemes, positive page bounds, and parseable UTC offsets.

use crate::diagnostic::ConfigError;
use crate::model::DesklineConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DesklineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let base_url = config.liveagent.base_url.trim();
    if base_url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "liveagent.base_url must not be empty".to_string(),
        });
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("liveagent.base_url `{base_url}` must use http or https"),
        });
    }

    let page_bounds = [
        ("liveagent.per_page", config.liveagent.per_page),
        ("liveagent.max_pages", config.liveagent.max_pages),
        ("liveagent.agents_per_page", config.liveagent.agents_per_page),
        ("liveagent.agents_max_pages", config.liveagent.agents_max_pages),
    ];
    for (key, value) in page_bounds {
        if value < 1 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be at least 1, got {value}"),
            });
        }
    }

    if config.rate_limit.max_in_flight < 1 {
        errors.push(ConfigError::Validation {
            message: "rate_limit.max_in_flight must be at least 1".to_string(),
        });
    }

    if parse_utc_offset(&config.pipeline.timezone_offset).is_none() {
        errors.push(ConfigError::Validation {
            message: format!(
                "pipeline.timezone_offset `{}` is not a valid offset like +08:00",
                config.pipeline.timezone_offset
            ),
        });
    }

    let names = [
        ("warehouse.project_id", &config.warehouse.project_id),
        ("warehouse.dataset", &config.warehouse.dataset),
        ("warehouse.root", &config.warehouse.root),
        ("warehouse.tags_table", &config.warehouse.tags_table),
        ("warehouse.tickets_table", &config.warehouse.tickets_table),
        ("warehouse.messages_table", &config.warehouse.messages_table),
        ("warehouse.agents_table", &config.warehouse.agents_table),
        ("warehouse.users_table", &config.warehouse.users_table),
    ];
    for (key, value) in names {
        if value.trim().is_empty() {
            errors.push(ConfigError::Validation {
                message: format!("{key} must not be empty"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parses `+HH:MM` / `-HH:MM` into seconds east of UTC.
pub fn parse_utc_offset(raw: &str) -> Option<i32> {
    let raw = raw.trim();
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let (hours, minutes) = rest.split_once(':')?;
    if hours.len() != 2 || minutes.len() != 2 {
        return None;
    }
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = DesklineConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn non_http_base_url_fails_validation() {
        let mut config = DesklineConfig::default();
        config.liveagent.base_url = "ftp://example.com".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains("base_url"))));
    }

    #[test]
    fn zero_page_bounds_collect_every_error() {
        let mut config = DesklineConfig::default();
        config.liveagent.per_page = 0;
        config.liveagent.max_pages = 0;
        config.rate_limit.max_in_flight = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3, "got: {errors:?}");
    }

    #[test]
    fn empty_table_name_fails_validation() {
        let mut config = DesklineConfig::default();
        config.warehouse.tickets_table = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("tickets_table"))
        ));
    }

    #[test]
    fn parse_utc_offset_accepts_signed_hours() {
        assert_eq!(parse_utc_offset("+08:00"), Some(8 * 3600));
        assert_eq!(parse_utc_offset("-05:30"), Some(-(5 * 3600 + 30 * 60)));
        assert_eq!(parse_utc_offset("+00:00"), Some(0));
        assert_eq!(parse_utc_offset("08:00"), None);
        assert_eq!(parse_utc_offset("+8"), None);
        assert_eq!(parse_utc_offset("+15:00"), None);
    }

    #[test]
    fn bad_timezone_offset_fails_validation() {
        let mut config = DesklineConfig::default();
        config.pipeline.timezone_offset = "Asia/Manila".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(
            |e| matches!(e, ConfigError::Validation { message } if message.contains("timezone_offset"))
        ));
    }
}
