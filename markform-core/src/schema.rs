//! Schema model for structured responses.
//!
//! A [`SchemaObject`] is an ordered list of [`SchemaField`] entries describing
//! the shape of the object a model is asked to produce. Schemas are usually
//! generated by `#[derive(StructuredResponse)]`, but [`SchemaBuilder`] offers a
//! manual registration path for schemas assembled at runtime.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// The semantic kind of a schema field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Free text.
    String,
    /// Whole number.
    Integer,
    /// Floating-point number.
    Float,
    /// True/false.
    Boolean,
    /// One of a fixed, ordered set of string values.
    Enum {
        /// The enum type name, used in generated field descriptions.
        name: String,
        /// Allowed values in declared order.
        values: Vec<String>,
    },
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Combined date and time.
    DateTime,
    /// A nested schema object.
    Object(SchemaRef),
    /// A homogeneous list of the given element kind.
    List(Box<FieldKind>),
    /// An optional wrapper; only appears transiently, before
    /// [`SchemaField::new`] folds it into the `optional` flag.
    Optional(Box<FieldKind>),
}

impl FieldKind {
    /// The `type` attribute label used in generated markup.
    pub fn type_label(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Enum { .. } => "enum",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
            FieldKind::DateTime => "datetime",
            FieldKind::Object(_) => "class",
            FieldKind::List(_) => "list",
            FieldKind::Optional(inner) => inner.type_label(),
        }
    }

    /// Check this kind against the supported subset.
    ///
    /// List elements may be objects, enums or scalars, but not themselves
    /// lists or optionals; optional wrappers may not nest.
    pub fn ensure_supported(&self, field: &str) -> Result<(), SchemaError> {
        match self {
            FieldKind::List(inner) => match inner.as_ref() {
                FieldKind::List(_) => Err(SchemaError::unsupported(field, "list of lists")),
                FieldKind::Optional(_) => {
                    Err(SchemaError::unsupported(field, "list of optional elements"))
                }
                other => other.ensure_supported(field),
            },
            FieldKind::Optional(inner) => match inner.as_ref() {
                FieldKind::Optional(_) => {
                    Err(SchemaError::unsupported(field, "doubly-optional wrapper"))
                }
                other => other.ensure_supported(field),
            },
            _ => Ok(()),
        }
    }
}

/// A handle to a nested schema type.
///
/// Nested schemas resolve through a function pointer (the derive path) or a
/// pre-built value (the builder path); the indirection lets self-referential
/// schemas terminate instead of recursing while being constructed.
#[derive(Debug, Clone)]
pub struct SchemaRef {
    type_name: String,
    resolver: SchemaResolver,
}

#[derive(Debug, Clone)]
enum SchemaResolver {
    Function(fn() -> SchemaObject),
    Value(Arc<SchemaObject>),
}

impl SchemaRef {
    /// Reference a schema produced by a function, typically
    /// `T::schema` from a derived impl.
    pub fn from_fn(type_name: impl Into<String>, schema: fn() -> SchemaObject) -> Self {
        Self {
            type_name: type_name.into(),
            resolver: SchemaResolver::Function(schema),
        }
    }

    /// Reference an already-built schema value.
    pub fn from_schema(schema: SchemaObject) -> Self {
        Self {
            type_name: schema.type_name.clone(),
            resolver: SchemaResolver::Value(Arc::new(schema)),
        }
    }

    /// The nested type's name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The nested type's wrapper tag: the type name, lowercased.
    pub fn tag_name(&self) -> String {
        self.type_name.to_lowercase()
    }

    /// Resolve the referenced schema.
    pub fn resolve(&self) -> SchemaObject {
        match &self.resolver {
            SchemaResolver::Function(f) => f(),
            SchemaResolver::Value(schema) => (**schema).clone(),
        }
    }
}

impl PartialEq for SchemaRef {
    fn eq(&self, other: &Self) -> bool {
        // Identity is by type name, matching the deduplication rule for
        // generated description sections.
        self.type_name == other.type_name
    }
}

/// Numeric and length bounds attached to a field.
///
/// Constraints are informational: they are rendered into field descriptions
/// for the model to honor, and are not enforced at decode time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    /// Minimum value, inclusive.
    pub ge: Option<f64>,
    /// Minimum value, exclusive.
    pub gt: Option<f64>,
    /// Maximum value, inclusive.
    pub le: Option<f64>,
    /// Maximum value, exclusive.
    pub lt: Option<f64>,
    /// The value must be a multiple of this.
    pub multiple_of: Option<f64>,
    /// Minimum length.
    pub min_length: Option<usize>,
    /// Maximum length.
    pub max_length: Option<usize>,
}

impl Constraints {
    /// Create an empty constraint set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether no bound is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Set the inclusive minimum.
    #[must_use]
    pub fn with_ge(mut self, value: f64) -> Self {
        self.ge = Some(value);
        self
    }

    /// Set the exclusive minimum.
    #[must_use]
    pub fn with_gt(mut self, value: f64) -> Self {
        self.gt = Some(value);
        self
    }

    /// Set the inclusive maximum.
    #[must_use]
    pub fn with_le(mut self, value: f64) -> Self {
        self.le = Some(value);
        self
    }

    /// Set the exclusive maximum.
    #[must_use]
    pub fn with_lt(mut self, value: f64) -> Self {
        self.lt = Some(value);
        self
    }

    /// Require the value to be a multiple of the given number.
    #[must_use]
    pub fn with_multiple_of(mut self, value: f64) -> Self {
        self.multiple_of = Some(value);
        self
    }

    /// Set the minimum length.
    #[must_use]
    pub fn with_min_length(mut self, value: usize) -> Self {
        self.min_length = Some(value);
        self
    }

    /// Set the maximum length.
    #[must_use]
    pub fn with_max_length(mut self, value: usize) -> Self {
        self.max_length = Some(value);
        self
    }
}

/// One declared field of a schema object.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    /// Field name, used verbatim as the markup tag name.
    pub name: String,
    /// The field's kind, with any optional wrapper already folded away.
    pub kind: FieldKind,
    /// Whether absence or empty content decodes to "no value".
    pub optional: bool,
    /// Free text shown to the model; may be empty.
    pub description: String,
    /// Informational numeric/length bounds.
    pub constraints: Constraints,
}

impl SchemaField {
    /// Create a field, folding a leading [`FieldKind::Optional`] wrapper into
    /// the `optional` flag (the classification order checks Optional first).
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        let (kind, optional) = match kind {
            FieldKind::Optional(inner) => (*inner, true),
            other => (other, false),
        };
        Self {
            name: name.into(),
            kind,
            optional,
            description: String::new(),
            constraints: Constraints::new(),
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach constraints.
    #[must_use]
    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}

/// A named, ordered sequence of fields describing one response object type.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaObject {
    type_name: String,
    fields: Vec<SchemaField>,
}

impl SchemaObject {
    /// Create an empty schema object.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Create a schema object from a prepared field list.
    pub fn with_fields(type_name: impl Into<String>, fields: Vec<SchemaField>) -> Self {
        Self {
            type_name: type_name.into(),
            fields,
        }
    }

    /// The type's name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The wrapper tag for this type: the type name, lowercased.
    pub fn tag_name(&self) -> String {
        self.type_name.to_lowercase()
    }

    /// The declared fields, in order.
    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Fluent builder for hand-registered schemas.
///
/// # Example
///
/// ```rust
/// use markform_core::SchemaBuilder;
///
/// let schema = SchemaBuilder::new("Weather")
///     .string("city", "City name", true)
///     .float("temperature", "Temperature in celsius", true)
///     .enumeration("sky", "Sky condition", "Sky", &["clear", "cloudy"], false)
///     .build()
///     .unwrap();
/// assert_eq!(schema.fields().len(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    type_name: String,
    fields: Vec<SchemaField>,
}

impl SchemaBuilder {
    /// Start a builder for the given type name.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    fn push(mut self, name: &str, kind: FieldKind, desc: &str, required: bool) -> Self {
        let kind = if required {
            kind
        } else {
            FieldKind::Optional(Box::new(kind))
        };
        self.fields
            .push(SchemaField::new(name, kind).with_description(desc));
        self
    }

    /// Add a string field.
    #[must_use]
    pub fn string(self, name: &str, desc: &str, required: bool) -> Self {
        self.push(name, FieldKind::String, desc, required)
    }

    /// Add an integer field.
    #[must_use]
    pub fn integer(self, name: &str, desc: &str, required: bool) -> Self {
        self.push(name, FieldKind::Integer, desc, required)
    }

    /// Add a float field.
    #[must_use]
    pub fn float(self, name: &str, desc: &str, required: bool) -> Self {
        self.push(name, FieldKind::Float, desc, required)
    }

    /// Add a boolean field.
    #[must_use]
    pub fn boolean(self, name: &str, desc: &str, required: bool) -> Self {
        self.push(name, FieldKind::Boolean, desc, required)
    }

    /// Add a date field.
    #[must_use]
    pub fn date(self, name: &str, desc: &str, required: bool) -> Self {
        self.push(name, FieldKind::Date, desc, required)
    }

    /// Add a time field.
    #[must_use]
    pub fn time(self, name: &str, desc: &str, required: bool) -> Self {
        self.push(name, FieldKind::Time, desc, required)
    }

    /// Add a datetime field.
    #[must_use]
    pub fn datetime(self, name: &str, desc: &str, required: bool) -> Self {
        self.push(name, FieldKind::DateTime, desc, required)
    }

    /// Add an enum field with its type name and allowed values in order.
    #[must_use]
    pub fn enumeration(
        self,
        name: &str,
        desc: &str,
        enum_name: &str,
        values: &[&str],
        required: bool,
    ) -> Self {
        let kind = FieldKind::Enum {
            name: enum_name.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        };
        self.push(name, kind, desc, required)
    }

    /// Add a nested object field.
    #[must_use]
    pub fn object(self, name: &str, desc: &str, nested: SchemaRef, required: bool) -> Self {
        self.push(name, FieldKind::Object(nested), desc, required)
    }

    /// Add a list field with the given element kind.
    #[must_use]
    pub fn list(self, name: &str, desc: &str, element: FieldKind, required: bool) -> Self {
        self.push(name, FieldKind::List(Box::new(element)), desc, required)
    }

    /// Add a pre-built field, e.g. one carrying constraints.
    #[must_use]
    pub fn field(mut self, field: SchemaField) -> Self {
        self.fields.push(field);
        self
    }

    /// Finish the schema, rejecting duplicate field names and unsupported
    /// kinds.
    pub fn build(self) -> Result<SchemaObject, SchemaError> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.clone()) {
                return Err(SchemaError::DuplicateField {
                    field: field.name.clone(),
                    type_name: self.type_name.clone(),
                });
            }
            field.kind.ensure_supported(&field.name)?;
        }
        Ok(SchemaObject::with_fields(self.type_name, self.fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_wrapper_folds_into_flag() {
        let field = SchemaField::new(
            "note",
            FieldKind::Optional(Box::new(FieldKind::String)),
        );
        assert!(field.optional);
        assert_eq!(field.kind, FieldKind::String);
    }

    #[test]
    fn builder_preserves_declaration_order() {
        let schema = SchemaBuilder::new("Thing")
            .string("b", "", true)
            .integer("a", "", true)
            .build()
            .unwrap();
        let names: Vec<_> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn builder_rejects_duplicate_names() {
        let err = SchemaBuilder::new("Thing")
            .string("x", "", true)
            .integer("x", "", true)
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateField { .. }));
    }

    #[test]
    fn list_of_list_is_unsupported() {
        let kind = FieldKind::List(Box::new(FieldKind::List(Box::new(FieldKind::Integer))));
        assert!(kind.ensure_supported("grid").is_err());
    }

    #[test]
    fn list_of_optional_is_unsupported() {
        let kind = FieldKind::List(Box::new(FieldKind::Optional(Box::new(FieldKind::Integer))));
        assert!(kind.ensure_supported("holes").is_err());
    }

    #[test]
    fn tag_names_are_lowercased_type_names() {
        let schema = SchemaObject::new("SubClassType1");
        assert_eq!(schema.tag_name(), "subclasstype1");
    }

    #[test]
    fn schema_ref_resolves_through_fn() {
        fn make() -> SchemaObject {
            SchemaObject::new("Inner")
        }
        let r = SchemaRef::from_fn("Inner", make);
        assert_eq!(r.resolve().type_name(), "Inner");
        assert_eq!(r.tag_name(), "inner");
    }
}
