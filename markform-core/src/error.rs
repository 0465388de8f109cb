//! Error types for schema configuration and response decoding.

use thiserror::Error;

/// Error raised when a schema declaration itself is invalid.
///
/// These indicate a bug in the embedding application's schema, not a runtime
/// condition: they are surfaced at encode/decode time and are never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    /// A field's declared kind falls outside the supported subset.
    #[error("field '{field}' has an unsupported kind: {detail}")]
    UnsupportedKind {
        /// The offending field name.
        field: String,
        /// What made the kind unsupported.
        detail: String,
    },

    /// Two fields in the same object share a name.
    #[error("duplicate field name '{field}' in schema '{type_name}'")]
    DuplicateField {
        /// The duplicated field name.
        field: String,
        /// The owning schema type.
        type_name: String,
    },
}

impl SchemaError {
    /// Create an unsupported-kind error.
    pub fn unsupported(field: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::UnsupportedKind {
            field: field.into(),
            detail: detail.into(),
        }
    }
}

/// Error during decoding of a structured response.
///
/// Recursive decode failures bubble up in kind, wrapped with [`DecodeError::Nested`]
/// context at each level so the top-level message traces the path to the
/// offending field.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// No parseable markup structure was found in the response text.
    #[error("no markup structure found in response text")]
    NoMarkup,

    /// A required field's tag was absent from the scanned children.
    #[error("required field '{field}' not found; tags present: [{present}]")]
    MissingField {
        /// The missing field name.
        field: String,
        /// Comma-separated tag names that were found, to aid debugging.
        present: String,
    },

    /// An enum field's content matched none of the allowed values.
    #[error("field '{field}': '{value}' is not one of: {allowed}")]
    EnumMismatch {
        /// The enum field name.
        field: String,
        /// The content that failed to match.
        value: String,
        /// Comma-separated allowed values.
        allowed: String,
    },

    /// Content for a required field could not be parsed as the declared type.
    #[error("field '{field}': cannot parse '{value}' as {expected}")]
    UnparsableValue {
        /// The field name.
        field: String,
        /// The content that failed to parse.
        value: String,
        /// The expected type label.
        expected: String,
    },

    /// The decoded values could not be assembled into the target object.
    ///
    /// Distinguishable from parse-kind errors: the markup was well-formed but
    /// the resolved values do not satisfy the target type.
    #[error("field '{field}': {message}")]
    Validation {
        /// The field name.
        field: String,
        /// What went wrong during construction.
        message: String,
    },

    /// The schema itself is invalid.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A failure inside a nested object, wrapped with the enclosing context.
    #[error("in <{tag}> ({type_name}): {source}")]
    Nested {
        /// The enclosing tag name.
        tag: String,
        /// The nested schema type name.
        type_name: String,
        /// The inner failure.
        #[source]
        source: Box<DecodeError>,
    },
}

impl DecodeError {
    /// Create a missing-field error listing the tags that were found.
    pub fn missing_field(field: impl Into<String>, present: &[String]) -> Self {
        Self::MissingField {
            field: field.into(),
            present: present.join(", "),
        }
    }

    /// Create an enum-mismatch error.
    pub fn enum_mismatch(field: impl Into<String>, value: impl Into<String>, allowed: &[String]) -> Self {
        Self::EnumMismatch {
            field: field.into(),
            value: value.into(),
            allowed: allowed.join(", "),
        }
    }

    /// Create an unparsable-value error.
    pub fn unparsable(
        field: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::UnparsableValue {
            field: field.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Create a construction-time validation error.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Wrap an inner failure with the enclosing field tag and type name.
    pub fn nested(tag: impl Into<String>, type_name: impl Into<String>, source: DecodeError) -> Self {
        Self::Nested {
            tag: tag.into(),
            type_name: type_name.into(),
            source: Box::new(source),
        }
    }

    /// Walk through [`DecodeError::Nested`] wrappers to the innermost failure.
    pub fn root_cause(&self) -> &DecodeError {
        match self {
            Self::Nested { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Top-level decode failure for a structured response.
///
/// Carries the offending raw text and the target schema type name so the
/// calling layer can log the exchange or re-prompt the model with a
/// corrective follow-up.
#[derive(Debug, Error)]
#[error("failed to decode structured response for {type_name}: {source}")]
pub struct ResponseParseError {
    /// The target schema type name.
    pub type_name: String,
    /// The raw response text that failed to decode.
    pub raw_text: String,
    /// The underlying decode failure.
    #[source]
    pub source: DecodeError,
}

impl ResponseParseError {
    /// Wrap a decode failure with its originating text and target type.
    pub fn new(type_name: impl Into<String>, raw_text: impl Into<String>, source: DecodeError) -> Self {
        Self {
            type_name: type_name.into(),
            raw_text: raw_text.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_lists_present_tags() {
        let err = DecodeError::missing_field("age", &["name".to_string(), "city".to_string()]);
        let msg = err.to_string();
        assert!(msg.contains("age"));
        assert!(msg.contains("name, city"));
    }

    #[test]
    fn nested_error_traces_path_to_root_cause() {
        let inner = DecodeError::missing_field("value", &[]);
        let err = DecodeError::nested(
            "outer",
            "SubClass",
            DecodeError::nested("mid", "MidClass", inner),
        );
        let msg = err.to_string();
        assert!(msg.contains("<outer>"));
        assert!(msg.contains("<mid>"));
        assert!(matches!(err.root_cause(), DecodeError::MissingField { .. }));
    }

    #[test]
    fn response_parse_error_carries_raw_text() {
        let err = ResponseParseError::new("Report", "<garbage>", DecodeError::NoMarkup);
        assert_eq!(err.raw_text, "<garbage>");
        assert!(err.to_string().contains("Report"));
    }

    #[test]
    fn enum_mismatch_names_allowed_values() {
        let allowed = vec!["type1".to_string(), "type2".to_string()];
        let err = DecodeError::enum_mismatch("kind", "bogus", &allowed);
        assert!(err.to_string().contains("type1, type2"));
    }
}
