use std::fmt;

use thiserror::Error;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigOutOfRange,
    InvalidEnumValue,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigOutOfRange => "E1004",
            Self::InvalidEnumValue => "E2005",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigOutOfRange => "Config value out of range",
            Self::InvalidEnumValue => "Invalid status/dependency kind value",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigOutOfRange => {
                Some("Check the documented range for the offending key in .knot/config.toml.")
            }
            Self::InvalidEnumValue => {
                Some("Use one of the documented status or dependency kind values.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Validation failure for a loaded [`crate::config::ProjectConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{key} must be between {min} and {max}, got {value}")]
    OutOfRange {
        key: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{key} must be at least 1")]
    Zero { key: &'static str },
    #[error("triage weights must not all be zero")]
    ZeroWeights,
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::ConfigOutOfRange
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, ErrorCode};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::ConfigOutOfRange,
            ErrorCode::InvalidEnumValue,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InvalidEnumValue.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn config_error_renders_range() {
        let err = ConfigError::OutOfRange {
            key: "analysis.damping",
            min: 0.0,
            max: 1.0,
            value: 1.5,
        };
        assert_eq!(
            err.to_string(),
            "analysis.damping must be between 0 and 1, got 1.5"
        );
        assert_eq!(err.code(), ErrorCode::ConfigOutOfRange);
    }
}
