//! Conversion traits between Rust types and the schema/value models.
//!
//! [`FieldValue`] is the seam the derive macros target: it classifies a field
//! type into a [`FieldKind`] and converts a [`DecodedValue`] back into the
//! concrete type. Field types that cannot be classified simply do not
//! implement the trait, so misconfigured schemas fail at compile time.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::DecodeError;
use crate::schema::{FieldKind, SchemaObject};
use crate::value::{DecodedObject, DecodedValue};

/// A type that can serve as a structured response object, root or nested.
///
/// Implemented via `#[derive(StructuredResponse)]`.
pub trait StructuredResponse: Sized {
    /// The type's name, used (lowercased) as its wrapper tag.
    fn type_name() -> &'static str;

    /// The type's schema, fields in declaration order.
    fn schema() -> SchemaObject;

    /// Assemble an instance from resolved field values.
    fn from_decoded(decoded: &DecodedObject) -> Result<Self, DecodeError>;
}

/// A unit-variant enum usable as an enum field.
///
/// Implemented via `#[derive(ResponseEnum)]`.
pub trait ResponseEnum: Sized {
    /// Allowed tag values in declared order.
    fn allowed_values() -> &'static [&'static str];

    /// Match a tag value exactly against the allowed set.
    fn from_tag_value(value: &str) -> Option<Self>;

    /// The tag value for this variant.
    fn tag_value(&self) -> &'static str;
}

/// A type usable as a schema field.
pub trait FieldValue: Sized {
    /// Classify this type into a field kind.
    fn kind() -> FieldKind;

    /// Convert a resolved value into this type.
    ///
    /// `field` is the owning field name, carried into error messages.
    fn from_decoded(field: &str, value: &DecodedValue) -> Result<Self, DecodeError>;
}

impl FieldValue for String {
    fn kind() -> FieldKind {
        FieldKind::String
    }

    fn from_decoded(field: &str, value: &DecodedValue) -> Result<Self, DecodeError> {
        match value {
            DecodedValue::Text(s) => Ok(s.clone()),
            DecodedValue::Null => Err(DecodeError::validation(field, "missing required text value")),
            other => Err(DecodeError::validation(
                field,
                format!("expected text, found {}", other.kind_name()),
            )),
        }
    }
}

macro_rules! impl_field_value_int {
    ($($ty:ty),* $(,)?) => {$(
        impl FieldValue for $ty {
            fn kind() -> FieldKind {
                FieldKind::Integer
            }

            fn from_decoded(field: &str, value: &DecodedValue) -> Result<Self, DecodeError> {
                match value {
                    DecodedValue::Integer(v) => <$ty>::try_from(*v).map_err(|_| {
                        DecodeError::validation(
                            field,
                            format!("integer {} out of range for {}", v, stringify!($ty)),
                        )
                    }),
                    DecodedValue::Null => Err(DecodeError::validation(
                        field,
                        "missing or unparsable integer",
                    )),
                    other => Err(DecodeError::validation(
                        field,
                        format!("expected integer, found {}", other.kind_name()),
                    )),
                }
            }
        }
    )*};
}

impl_field_value_int!(i8, i16, i32, i64, u8, u16, u32, u64);

macro_rules! impl_field_value_float {
    ($($ty:ty),* $(,)?) => {$(
        impl FieldValue for $ty {
            fn kind() -> FieldKind {
                FieldKind::Float
            }

            fn from_decoded(field: &str, value: &DecodedValue) -> Result<Self, DecodeError> {
                match value {
                    DecodedValue::Float(v) => Ok(*v as $ty),
                    DecodedValue::Null => Err(DecodeError::validation(
                        field,
                        "missing or unparsable float",
                    )),
                    other => Err(DecodeError::validation(
                        field,
                        format!("expected float, found {}", other.kind_name()),
                    )),
                }
            }
        }
    )*};
}

impl_field_value_float!(f32, f64);

impl FieldValue for bool {
    fn kind() -> FieldKind {
        FieldKind::Boolean
    }

    fn from_decoded(field: &str, value: &DecodedValue) -> Result<Self, DecodeError> {
        match value {
            DecodedValue::Boolean(v) => Ok(*v),
            DecodedValue::Null => Err(DecodeError::validation(
                field,
                "missing or unparsable boolean",
            )),
            other => Err(DecodeError::validation(
                field,
                format!("expected boolean, found {}", other.kind_name()),
            )),
        }
    }
}

impl FieldValue for NaiveDate {
    fn kind() -> FieldKind {
        FieldKind::Date
    }

    fn from_decoded(field: &str, value: &DecodedValue) -> Result<Self, DecodeError> {
        match value {
            DecodedValue::Date(v) => Ok(*v),
            DecodedValue::Null => Err(DecodeError::validation(field, "missing required date")),
            other => Err(DecodeError::validation(
                field,
                format!("expected date, found {}", other.kind_name()),
            )),
        }
    }
}

impl FieldValue for NaiveTime {
    fn kind() -> FieldKind {
        FieldKind::Time
    }

    fn from_decoded(field: &str, value: &DecodedValue) -> Result<Self, DecodeError> {
        match value {
            DecodedValue::Time(v) => Ok(*v),
            DecodedValue::Null => Err(DecodeError::validation(field, "missing required time")),
            other => Err(DecodeError::validation(
                field,
                format!("expected time, found {}", other.kind_name()),
            )),
        }
    }
}

impl FieldValue for NaiveDateTime {
    fn kind() -> FieldKind {
        FieldKind::DateTime
    }

    fn from_decoded(field: &str, value: &DecodedValue) -> Result<Self, DecodeError> {
        match value {
            DecodedValue::DateTime(v) => Ok(*v),
            DecodedValue::Null => Err(DecodeError::validation(field, "missing required datetime")),
            other => Err(DecodeError::validation(
                field,
                format!("expected datetime, found {}", other.kind_name()),
            )),
        }
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn kind() -> FieldKind {
        FieldKind::Optional(Box::new(T::kind()))
    }

    fn from_decoded(field: &str, value: &DecodedValue) -> Result<Self, DecodeError> {
        match value {
            DecodedValue::Null => Ok(None),
            other => T::from_decoded(field, other).map(Some),
        }
    }
}

impl<T: FieldValue> FieldValue for Vec<T> {
    fn kind() -> FieldKind {
        FieldKind::List(Box::new(T::kind()))
    }

    fn from_decoded(field: &str, value: &DecodedValue) -> Result<Self, DecodeError> {
        match value {
            DecodedValue::List(items) => items
                .iter()
                .map(|item| T::from_decoded(field, item))
                .collect(),
            DecodedValue::Null => Err(DecodeError::validation(field, "missing required list")),
            other => Err(DecodeError::validation(
                field,
                format!("expected list, found {}", other.kind_name()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_classifies_with_optional_wrapper() {
        assert_eq!(
            <Option<i64>>::kind(),
            FieldKind::Optional(Box::new(FieldKind::Integer))
        );
    }

    #[test]
    fn vec_classifies_as_list() {
        assert_eq!(
            <Vec<String>>::kind(),
            FieldKind::List(Box::new(FieldKind::String))
        );
    }

    #[test]
    fn option_absorbs_null() {
        let value = <Option<String>>::from_decoded("note", &DecodedValue::Null).unwrap();
        assert_eq!(value, None);
    }

    #[test]
    fn required_int_from_null_is_validation_error() {
        let err = i64::from_decoded("count", &DecodedValue::Null).unwrap_err();
        assert!(matches!(err, DecodeError::Validation { .. }));
    }

    #[test]
    fn narrow_int_overflow_is_validation_error() {
        let err = u8::from_decoded("count", &DecodedValue::Integer(300)).unwrap_err();
        assert!(matches!(err, DecodeError::Validation { .. }));
    }

    #[test]
    fn vec_collects_in_order() {
        let value = DecodedValue::List(vec![
            DecodedValue::Integer(1),
            DecodedValue::Integer(2),
            DecodedValue::Integer(3),
        ]);
        let items: Vec<i64> = FieldValue::from_decoded("nums", &value).unwrap();
        assert_eq!(items, vec![1, 2, 3]);
    }
}
