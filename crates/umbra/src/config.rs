//! Engine configuration.
//!
//! [`FormsConfig`] carries the validation message catalog and the diagnostic
//! switches. Every key is optional, so an embedder only writes what it
//! changes:
//!
//! ```
//! use umbra::config::FormsConfig;
//!
//! let config = FormsConfig::from_toml_str(r#"
//! [messages]
//! value_missing = "Required."
//!
//! [diagnostics]
//! warn_on_disabled_write = false
//! "#).unwrap();
//!
//! assert_eq!(config.messages.value_missing, "Required.");
//! assert!(!config.diagnostics.warn_on_disabled_write);
//! assert_eq!(config.messages.bad_input, "Please enter a number.");
//! ```
//!
//! Message templates use `{min}`, `{max}`, `{low}`, `{high}`, `{len}` and
//! `{limit}` placeholders, filled in by [`MessageCatalog::format`].

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Validation messages, one template per situation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageCatalog {
    pub value_missing: String,
    pub value_missing_checkbox: String,
    pub value_missing_radio: String,
    pub value_missing_select: String,
    pub value_missing_file: String,
    /// `{min}`
    pub range_underflow: String,
    /// `{min}`, used by the date family.
    pub range_underflow_date: String,
    /// `{max}`
    pub range_overflow: String,
    /// `{max}`, used by the date family.
    pub range_overflow_date: String,
    /// `{low}` and `{high}`
    pub step_mismatch: String,
    /// `{low}`, when the upper neighbour lies beyond `max`.
    pub step_mismatch_one: String,
    pub bad_input: String,
    pub pattern_mismatch: String,
    /// `{limit}` and `{len}`
    pub too_long: String,
    /// `{limit}` and `{len}`
    pub too_short: String,
}

impl Default for MessageCatalog {
    fn default() -> Self {
        Self {
            value_missing: "Please fill out this field.".into(),
            value_missing_checkbox: "Please check this box if you want to proceed.".into(),
            value_missing_radio: "Please select one of these options.".into(),
            value_missing_select: "Please select an item in the list.".into(),
            value_missing_file: "Please select a file.".into(),
            range_underflow: "Value must be greater than or equal to {min}.".into(),
            range_underflow_date: "Value must be {min} or later.".into(),
            range_overflow: "Value must be less than or equal to {max}.".into(),
            range_overflow_date: "Value must be {max} or earlier.".into(),
            step_mismatch:
                "Please enter a valid value. The two nearest valid values are {low} and {high}."
                    .into(),
            step_mismatch_one: "Please enter a valid value. The nearest valid value is {low}."
                .into(),
            bad_input: "Please enter a number.".into(),
            pattern_mismatch: "Please match the requested format.".into(),
            too_long: "Please shorten this text to {limit} characters or less (you are currently using {len} characters)."
                .into(),
            too_short: "Please lengthen this text to {limit} characters or more (you are currently using {len} characters)."
                .into(),
        }
    }
}

impl MessageCatalog {
    /// Substitute `{key}` placeholders in `template`.
    ///
    /// Unknown placeholders are left as they are.
    pub fn format(template: &str, args: &[(&str, &str)]) -> String {
        let mut out = template.to_string();
        for (key, value) in args {
            out = out.replace(&format!("{{{key}}}"), value);
        }
        out
    }
}

/// Switches for diagnostics emitted through `tracing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Warn when a value is written to a disabled control.
    pub warn_on_disabled_write: bool,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            warn_on_disabled_write: true,
        }
    }
}

/// Configuration shared by the controllers of an application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormsConfig {
    pub messages: MessageCatalog,
    pub diagnostics: DiagnosticsConfig,
}

impl FormsConfig {
    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Render as TOML.
    pub fn to_toml_string(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DescriptorError;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(FormsConfig::from_toml_str("").unwrap(), FormsConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = FormsConfig::from_toml_str(
            r#"
            [messages]
            step_mismatch = "Try {low} or {high}."
            "#,
        )
        .unwrap();
        assert_eq!(config.messages.step_mismatch, "Try {low} or {high}.");
        assert_eq!(config.messages.value_missing, "Please fill out this field.");
        assert!(config.diagnostics.warn_on_disabled_write);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            FormsConfig::from_toml_str("[messages"),
            Err(DescriptorError::Config(_))
        ));
    }

    #[test]
    fn test_format_placeholders() {
        let message = MessageCatalog::format(
            "between {low} and {high}, not {other}",
            &[("low", "15"), ("high", "16")],
        );
        assert_eq!(message, "between 15 and 16, not {other}");
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = FormsConfig::default();
        config.messages.bad_input = "Numbers only.".into();
        let text = config.to_toml_string().unwrap();
        assert_eq!(FormsConfig::from_toml_str(&text).unwrap(), config);
    }
}
