//! Configuration for variable enhancement.
//!
//! Passed explicitly to a [`Dataset`](crate::Dataset); there is no process-wide
//! default mode.

use serde::{Deserialize, Serialize};

use crate::enhance::{Enhance, EnhanceSet};

/// Which sources of "missing" a [`ConvertMissing`](crate::filter::ConvertMissing) rule honors.
///
/// NaN is always missing regardless of these flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingPolicy {
    /// Values equal to the fill value are missing.
    pub fill_value_is_missing: bool,
    /// Values outside the valid range are missing.
    pub invalid_data_is_missing: bool,
    /// Values listed in `missing_value` are missing.
    pub missing_data_is_missing: bool,
}

impl Default for MissingPolicy {
    fn default() -> Self {
        Self {
            fill_value_is_missing: true,
            invalid_data_is_missing: true,
            missing_data_is_missing: true,
        }
    }
}

/// Configuration for building enhanced variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnhanceConfig {
    /// Enhancements applied by [`Dataset::wrap`](crate::Dataset::wrap) and by
    /// builders that do not set their own mode.
    pub enhance_mode: EnhanceSet,

    /// Default missing-value policy for new variables.
    pub missing: MissingPolicy,
}

impl Default for EnhanceConfig {
    fn default() -> Self {
        Self {
            enhance_mode: EnhanceSet::default_mode(),
            missing: MissingPolicy::default(),
        }
    }
}

impl EnhanceConfig {
    /// Configuration with every enhancement disabled.
    pub fn raw() -> Self {
        Self {
            enhance_mode: EnhanceSet::empty(),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CDM_ENHANCE_MODE") {
            match EnhanceSet::parse_list(&val) {
                Ok(mode) => config.enhance_mode = mode,
                Err(e) => tracing::warn!("ignoring CDM_ENHANCE_MODE: {}", e),
            }
        }

        if let Ok(val) = std::env::var("CDM_FILL_VALUE_IS_MISSING") {
            config.missing.fill_value_is_missing = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("CDM_INVALID_DATA_IS_MISSING") {
            config.missing.invalid_data_is_missing = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("CDM_MISSING_DATA_IS_MISSING") {
            config.missing.missing_data_is_missing = parse_flag(&val);
        }

        config
    }

    /// Load configuration from a JSON document; absent fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        let mode = &self.enhance_mode;
        if mode.contains(Enhance::ApplyStandardizer)
            && !(mode.contains(Enhance::ApplyScaleOffset) && mode.contains(Enhance::ConvertMissing))
        {
            return Err(
                "ApplyStandardizer requires ApplyScaleOffset and ConvertMissing".to_string(),
            );
        }

        Ok(())
    }
}

fn parse_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EnhanceConfig::default();
        assert_eq!(config.enhance_mode, EnhanceSet::default_mode());
        assert!(config.missing.fill_value_is_missing);
        assert!(config.missing.invalid_data_is_missing);
        assert!(config.missing.missing_data_is_missing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = EnhanceConfig::raw();
        assert!(config.validate().is_ok());

        config.enhance_mode.insert(Enhance::ApplyStandardizer);
        assert!(config.validate().is_err());

        config.enhance_mode = EnhanceSet::all();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = EnhanceConfig::from_json(
            r#"{ "enhance_mode": ["ConvertMissing"],
                 "missing": { "fill_value_is_missing": false,
                              "invalid_data_is_missing": true,
                              "missing_data_is_missing": true } }"#,
        )
        .unwrap();
        assert_eq!(config.enhance_mode.len(), 1);
        assert!(!config.missing.fill_value_is_missing);

        let defaults = EnhanceConfig::from_json("{}").unwrap();
        assert_eq!(defaults, EnhanceConfig::default());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("no"));
    }
}
