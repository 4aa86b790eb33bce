// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Validation errors raised while constructing the evalscript model.
//!
//! Every error carries the dotted path of the offending field (for example
//! `setup.output[1].bands`). Constructors on the typed model report paths
//! relative to the value being built; the document layer prefixes them with
//! the enclosing path via [`ValidationError::at`].

use thiserror::Error;

/// Construction-time validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent or empty.
    #[error("missing required field `{field}`")]
    MissingRequiredField {
        /// Path of the missing field.
        field: String,
    },
    /// A field is present but its value is not valid for its kind.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Path of the offending field.
        field: String,
        /// Human-readable reason.
        reason: String,
    },
}

impl ValidationError {
    /// Build a [`ValidationError::MissingRequiredField`].
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    /// Build a [`ValidationError::InvalidValue`].
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Path of the field this error refers to.
    pub fn field(&self) -> &str {
        match self {
            Self::MissingRequiredField { field } | Self::InvalidValue { field, .. } => field,
        }
    }

    /// Re-root the field path under `prefix` (`bands` -> `setup.input[0].bands`).
    #[must_use]
    pub fn at(self, prefix: &str) -> Self {
        let join = |field: String| {
            if field.is_empty() {
                prefix.to_owned()
            } else if field.starts_with('[') {
                format!("{prefix}{field}")
            } else {
                format!("{prefix}.{field}")
            }
        };
        match self {
            Self::MissingRequiredField { field } => Self::MissingRequiredField { field: join(field) },
            Self::InvalidValue { field, reason } => Self::InvalidValue {
                field: join(field),
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_prefixes_named_and_indexed_paths() {
        let err = ValidationError::missing("bands").at("setup.input[2]");
        assert_eq!(err.field(), "setup.input[2].bands");

        let err = ValidationError::invalid("[1].bands", "must be positive").at("setup.output");
        assert_eq!(err.field(), "setup.output[1].bands");
        assert_eq!(
            err.to_string(),
            "invalid value for `setup.output[1].bands`: must be positive"
        );
    }

    #[test]
    fn at_with_empty_field_uses_prefix() {
        let err = ValidationError::missing("").at("functions.evaluatePixel");
        assert_eq!(err.field(), "functions.evaluatePixel");
    }
}
