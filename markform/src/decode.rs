//! Markup-to-value decoding.
//!
//! Lowers a model's free-text answer into a [`DecodedObject`] driven by the
//! schema. The decoder is deliberately tolerant at the document level (code
//! fences, comments, a missing root wrapper, duplicate tags) and strict only
//! where the schema demands it: required fields must be present, enum content
//! must match an allowed value exactly, and dates must parse.

use markform_core::{
    DecodeError, DecodedObject, DecodedValue, FieldKind, ResponseParseError, SchemaField,
    SchemaObject, SchemaRef, StructuredResponse,
};
use tracing::debug;

use crate::datetime::{parse_date, parse_datetime, parse_time};
use crate::encode::RESPONSE_TAG;
use crate::markup::{
    extract_fenced_payload, find_all_wrapped, find_wrapped, scan_elements, strip_comments,
};

/// Decode a response text into a typed value.
///
/// The schema, the decode pass and the construction all come from the
/// derived `StructuredResponse` impl; failures are wrapped with the raw
/// text and target type name so callers can log or re-prompt. `exclude`
/// lists field names skipped at every nesting level (they must be optional
/// for construction to succeed).
pub fn parse_schema_response<T: StructuredResponse>(
    text: &str,
    exclude: &[&str],
) -> Result<T, ResponseParseError> {
    let wrap = |source| ResponseParseError::new(T::type_name(), text, source);
    let decoded = decode_response(&T::schema(), text, exclude).map_err(&wrap)?;
    T::from_decoded(&decoded).map_err(wrap)
}

/// Decode a response text into a dynamic object for the given schema.
///
/// `exclude` lists field names to skip at every nesting level; skipped
/// fields resolve to [`DecodedValue::Null`].
pub fn decode_response(
    schema: &SchemaObject,
    text: &str,
    exclude: &[&str],
) -> Result<DecodedObject, DecodeError> {
    debug!(type_name = schema.type_name(), "decoding response text");
    let payload = extract_fenced_payload(text).unwrap_or(text);
    let stripped = strip_comments(payload);
    let body = match find_wrapped(&stripped, RESPONSE_TAG) {
        Some(inner) => inner,
        // Tolerate a missing root wrapper as long as some markup is there.
        None if !scan_elements(&stripped).is_empty() => stripped.as_str(),
        None => return Err(DecodeError::NoMarkup),
    };
    decode_object(schema, body, exclude)
}

fn decode_object(
    schema: &SchemaObject,
    content: &str,
    exclude: &[&str],
) -> Result<DecodedObject, DecodeError> {
    let elements = scan_elements(content);
    let present: Vec<String> = elements.iter().map(|e| e.name.clone()).collect();

    let mut decoded = DecodedObject::new();
    for field in schema.fields() {
        if exclude.contains(&field.name.as_str()) {
            decoded.insert(&field.name, DecodedValue::Null);
            continue;
        }
        field.kind.ensure_supported(&field.name)?;

        // Models sometimes emit a tag more than once; the last occurrence is
        // taken as the correction of the earlier ones.
        let element = elements.iter().rev().find(|e| e.name == field.name);
        let value = match element {
            Some(element) => coerce_field(field, &element.content, exclude)?,
            None if field.optional => DecodedValue::Null,
            None => return Err(DecodeError::missing_field(&field.name, &present)),
        };
        decoded.insert(&field.name, value);
    }
    Ok(decoded)
}

fn coerce_field(
    field: &SchemaField,
    content: &str,
    exclude: &[&str],
) -> Result<DecodedValue, DecodeError> {
    match &field.kind {
        FieldKind::List(element) => coerce_list(field, element, content, exclude),
        FieldKind::Object(nested) => coerce_object(&field.name, nested, field.optional, content, exclude),
        scalar => coerce_scalar(&field.name, scalar, field.optional, content),
    }
}

/// Coerce scalar tag content.
///
/// Number and boolean coercion failures absorb to null (models emit
/// placeholder-like text often enough that a parse failure is not worth a
/// hard error here; required fields still fail at construction). Enum and
/// date kinds are stricter: on a required field a mismatch is an error.
fn coerce_scalar(
    field: &str,
    kind: &FieldKind,
    optional: bool,
    content: &str,
) -> Result<DecodedValue, DecodeError> {
    let trimmed = content.trim();
    match kind {
        FieldKind::String if trimmed.is_empty() && optional => Ok(DecodedValue::Null),
        FieldKind::String => Ok(DecodedValue::Text(trimmed.to_string())),
        FieldKind::Integer => Ok(trimmed
            .parse::<i64>()
            .map(DecodedValue::Integer)
            .unwrap_or(DecodedValue::Null)),
        FieldKind::Float => Ok(trimmed
            .parse::<f64>()
            .map(DecodedValue::Float)
            .unwrap_or(DecodedValue::Null)),
        FieldKind::Boolean => Ok(parse_bool(trimmed)
            .map(DecodedValue::Boolean)
            .unwrap_or(DecodedValue::Null)),
        FieldKind::Date => match parse_date(trimmed) {
            Some(v) => Ok(DecodedValue::Date(v)),
            None if optional => Ok(DecodedValue::Null),
            None => Err(DecodeError::unparsable(field, trimmed, "date")),
        },
        FieldKind::Time => match parse_time(trimmed) {
            Some(v) => Ok(DecodedValue::Time(v)),
            None if optional => Ok(DecodedValue::Null),
            None => Err(DecodeError::unparsable(field, trimmed, "time")),
        },
        FieldKind::DateTime => match parse_datetime(trimmed) {
            Some(v) => Ok(DecodedValue::DateTime(v)),
            None if optional => Ok(DecodedValue::Null),
            None => Err(DecodeError::unparsable(field, trimmed, "datetime")),
        },
        FieldKind::Enum { values, .. } => {
            if values.iter().any(|v| v == trimmed) {
                Ok(DecodedValue::Text(trimmed.to_string()))
            } else if optional {
                Ok(DecodedValue::Null)
            } else {
                Err(DecodeError::enum_mismatch(field, trimmed, values))
            }
        }
        other => Err(DecodeError::unparsable(field, trimmed, other.type_label())),
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Some(true),
        "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Coerce a nested object field.
///
/// The content normally wraps the sub fields in a `<typename>` tag; content
/// carrying the sub-field tags directly is accepted as well.
fn coerce_object(
    field: &str,
    nested: &SchemaRef,
    optional: bool,
    content: &str,
    exclude: &[&str],
) -> Result<DecodedValue, DecodeError> {
    if optional && content.trim().is_empty() {
        return Ok(DecodedValue::Null);
    }
    let schema = nested.resolve();
    let inner = find_wrapped(content, &schema.tag_name()).unwrap_or(content);
    decode_object(&schema, inner, exclude)
        .map(DecodedValue::Object)
        .map_err(|e| DecodeError::nested(field, schema.type_name(), e))
}

/// Coerce a list field.
///
/// Elements live in `<{field}_element>` tags; for a field named `foo_list`
/// the shorter `<foo_element>` form is accepted as a fallback. No elements
/// means the empty list when the tag itself was present, unless the field is
/// optional and its content is empty.
fn coerce_list(
    field: &SchemaField,
    element_kind: &FieldKind,
    content: &str,
    exclude: &[&str],
) -> Result<DecodedValue, DecodeError> {
    let mut contents = find_all_wrapped(content, &format!("{}_element", field.name));
    if contents.is_empty() {
        if let Some(stem) = field.name.strip_suffix("_list") {
            contents = find_all_wrapped(content, &format!("{stem}_element"));
        }
    }
    if contents.is_empty() && field.optional && content.trim().is_empty() {
        return Ok(DecodedValue::Null);
    }

    let element_tag = format!("{}_element", field.name);
    let mut items = Vec::with_capacity(contents.len());
    for element_content in contents {
        // Element coercion is strict: a list slot that fails to parse is an
        // error rather than a silent hole.
        let item = match element_kind {
            FieldKind::Object(nested) => {
                coerce_object(&element_tag, nested, false, element_content, exclude)?
            }
            scalar => match coerce_scalar(&element_tag, scalar, false, element_content)? {
                DecodedValue::Null => {
                    return Err(DecodeError::unparsable(
                        &element_tag,
                        element_content.trim(),
                        scalar.type_label(),
                    ))
                }
                value => value,
            },
        };
        items.push(item);
    }
    Ok(DecodedValue::List(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use markform_core::SchemaBuilder;
    use pretty_assertions::assert_eq;

    fn report_schema() -> SchemaObject {
        SchemaBuilder::new("Report")
            .string("title", "", true)
            .integer("count", "", true)
            .string("note", "", false)
            .build()
            .unwrap()
    }

    fn subclass_ref() -> SchemaRef {
        SchemaRef::from_schema(
            SchemaBuilder::new("SubClass")
                .integer("value", "", true)
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn decodes_a_plain_response() {
        let text = "<response><title>hello</title><count>3</count></response>";
        let decoded = decode_response(&report_schema(), text, &[]).unwrap();
        assert_eq!(decoded.get("title"), Some(&DecodedValue::Text("hello".into())));
        assert_eq!(decoded.get("count"), Some(&DecodedValue::Integer(3)));
        assert_eq!(decoded.get("note"), Some(&DecodedValue::Null));
    }

    #[test]
    fn tolerates_surrounding_prose_and_missing_root() {
        let text = "Sure! Here you go: <title>hi</title> <count>1</count>";
        let decoded = decode_response(&report_schema(), text, &[]).unwrap();
        assert_eq!(decoded.get("title"), Some(&DecodedValue::Text("hi".into())));
    }

    #[test]
    fn extracts_from_code_fence() {
        let text = "```xml\n<response><title>t</title><count>2</count></response>\n```";
        let decoded = decode_response(&report_schema(), text, &[]).unwrap();
        assert_eq!(decoded.get("count"), Some(&DecodedValue::Integer(2)));
    }

    #[test]
    fn comments_are_stripped_before_scanning() {
        let text = "<response><title>t</title><!-- note --><count>5</count>\
                    <note><!-- if null or not applicable leave this element empty --></note></response>";
        let decoded = decode_response(&report_schema(), text, &[]).unwrap();
        assert_eq!(decoded.get("count"), Some(&DecodedValue::Integer(5)));
        assert_eq!(decoded.get("note"), Some(&DecodedValue::Null));
    }

    #[test]
    fn no_markup_at_all_is_an_error() {
        let err = decode_response(&report_schema(), "I cannot answer that.", &[]).unwrap_err();
        assert!(matches!(err, DecodeError::NoMarkup));
    }

    #[test]
    fn missing_required_field_lists_present_tags() {
        let text = "<response><title>t</title></response>";
        let err = decode_response(&report_schema(), text, &[]).unwrap_err();
        match err {
            DecodeError::MissingField { field, present } => {
                assert_eq!(field, "count");
                assert!(present.contains("title"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn duplicate_sibling_tags_last_wins() {
        let text = "<response><title>a</title><title>b</title><count>1</count></response>";
        let decoded = decode_response(&report_schema(), text, &[]).unwrap();
        assert_eq!(decoded.get("title"), Some(&DecodedValue::Text("b".into())));
    }

    #[test]
    fn unparsable_integer_absorbs_to_null() {
        // Required primitives degrade at coercion; the typed construction
        // layer is where a required null becomes an error.
        let text = "<response><title>t</title><count>lots</count></response>";
        let decoded = decode_response(&report_schema(), text, &[]).unwrap();
        assert_eq!(decoded.get("count"), Some(&DecodedValue::Null));
    }

    #[test]
    fn unparsable_required_date_is_an_error() {
        let schema = SchemaBuilder::new("R").date("when", "", true).build().unwrap();
        let err = decode_response(&schema, "<response><when>soonish</when></response>", &[])
            .unwrap_err();
        assert!(matches!(err, DecodeError::UnparsableValue { .. }));
    }

    #[test]
    fn unparsable_optional_degrades_to_null() {
        let schema = SchemaBuilder::new("R")
            .integer("count", "", false)
            .build()
            .unwrap();
        let decoded = decode_response(&schema, "<response><count>maybe</count></response>", &[]).unwrap();
        assert_eq!(decoded.get("count"), Some(&DecodedValue::Null));
    }

    #[test]
    fn empty_required_string_is_empty_text() {
        let schema = SchemaBuilder::new("R").string("s", "", true).build().unwrap();
        let decoded = decode_response(&schema, "<response><s></s></response>", &[]).unwrap();
        assert_eq!(decoded.get("s"), Some(&DecodedValue::Text(String::new())));
    }

    #[test]
    fn boolean_coercions() {
        let schema = SchemaBuilder::new("R")
            .boolean("a", "", true)
            .boolean("b", "", true)
            .boolean("c", "", true)
            .build()
            .unwrap();
        let text = "<response><a>Yes</a><b>0</b><c>TRUE</c></response>";
        let decoded = decode_response(&schema, text, &[]).unwrap();
        assert_eq!(decoded.get("a"), Some(&DecodedValue::Boolean(true)));
        assert_eq!(decoded.get("b"), Some(&DecodedValue::Boolean(false)));
        assert_eq!(decoded.get("c"), Some(&DecodedValue::Boolean(true)));
    }

    #[test]
    fn permissive_date_parsing() {
        let schema = SchemaBuilder::new("R").date("when", "", true).build().unwrap();
        let decoded =
            decode_response(&schema, "<response><when>20 Jan 2023</when></response>", &[]).unwrap();
        assert_eq!(
            decoded.get("when"),
            Some(&DecodedValue::Date(NaiveDate::from_ymd_opt(2023, 1, 20).unwrap()))
        );
    }

    #[test]
    fn enum_membership_is_exact() {
        let schema = SchemaBuilder::new("R")
            .enumeration("kind", "", "Kind", &["type1", "type2"], true)
            .build()
            .unwrap();
        let ok = decode_response(&schema, "<response><kind>type2</kind></response>", &[]).unwrap();
        assert_eq!(ok.get("kind"), Some(&DecodedValue::Text("type2".into())));

        let err =
            decode_response(&schema, "<response><kind>Type2</kind></response>", &[]).unwrap_err();
        assert!(matches!(err, DecodeError::EnumMismatch { .. }));
    }

    #[test]
    fn optional_enum_mismatch_degrades_to_null() {
        let schema = SchemaBuilder::new("R")
            .enumeration("kind", "", "Kind", &["type1"], false)
            .build()
            .unwrap();
        let decoded =
            decode_response(&schema, "<response><kind>bogus</kind></response>", &[]).unwrap();
        assert_eq!(decoded.get("kind"), Some(&DecodedValue::Null));
    }

    #[test]
    fn nested_object_with_wrapper_tag() {
        let schema = SchemaBuilder::new("R")
            .object("detail", "", subclass_ref(), true)
            .build()
            .unwrap();
        let text = "<response><detail><subclass><value>7</value></subclass></detail></response>";
        let decoded = decode_response(&schema, text, &[]).unwrap();
        match decoded.get("detail") {
            Some(DecodedValue::Object(obj)) => {
                assert_eq!(obj.get("value"), Some(&DecodedValue::Integer(7)));
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn nested_object_without_wrapper_tag() {
        let schema = SchemaBuilder::new("R")
            .object("detail", "", subclass_ref(), true)
            .build()
            .unwrap();
        let text = "<response><detail><value>7</value></detail></response>";
        let decoded = decode_response(&schema, text, &[]).unwrap();
        match decoded.get("detail") {
            Some(DecodedValue::Object(obj)) => {
                assert_eq!(obj.get("value"), Some(&DecodedValue::Integer(7)));
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn nested_failure_carries_context() {
        let schema = SchemaBuilder::new("R")
            .object("detail", "", subclass_ref(), true)
            .build()
            .unwrap();
        let text = "<response><detail><subclass></subclass></detail></response>";
        let err = decode_response(&schema, text, &[]).unwrap_err();
        assert!(err.to_string().contains("<detail> (SubClass)"));
        assert!(matches!(err.root_cause(), DecodeError::MissingField { .. }));
    }

    #[test]
    fn empty_optional_object_is_null() {
        let schema = SchemaBuilder::new("R")
            .object("detail", "", subclass_ref(), false)
            .build()
            .unwrap();
        let decoded =
            decode_response(&schema, "<response><detail> </detail></response>", &[]).unwrap();
        assert_eq!(decoded.get("detail"), Some(&DecodedValue::Null));
    }

    #[test]
    fn scalar_list_elements_in_order() {
        let schema = SchemaBuilder::new("R")
            .list("nums", "", FieldKind::Integer, true)
            .build()
            .unwrap();
        let text = "<response><nums>\
                    <nums_element>1</nums_element>\
                    <nums_element>2</nums_element>\
                    </nums></response>";
        let decoded = decode_response(&schema, text, &[]).unwrap();
        assert_eq!(
            decoded.get("nums"),
            Some(&DecodedValue::List(vec![
                DecodedValue::Integer(1),
                DecodedValue::Integer(2)
            ]))
        );
    }

    #[test]
    fn present_but_empty_required_list_is_empty() {
        let schema = SchemaBuilder::new("R")
            .list("nums", "", FieldKind::Integer, true)
            .build()
            .unwrap();
        let decoded =
            decode_response(&schema, "<response><nums></nums></response>", &[]).unwrap();
        assert_eq!(decoded.get("nums"), Some(&DecodedValue::List(vec![])));
    }

    #[test]
    fn empty_optional_list_is_null() {
        let schema = SchemaBuilder::new("R")
            .list("nums", "", FieldKind::Integer, false)
            .build()
            .unwrap();
        let decoded =
            decode_response(&schema, "<response><nums> </nums></response>", &[]).unwrap();
        assert_eq!(decoded.get("nums"), Some(&DecodedValue::Null));
    }

    #[test]
    fn list_suffix_fallback_element_tag() {
        let schema = SchemaBuilder::new("R")
            .list("item_list", "", FieldKind::String, true)
            .build()
            .unwrap();
        let text = "<response><item_list>\
                    <item_element>a</item_element>\
                    <item_element>b</item_element>\
                    </item_list></response>";
        let decoded = decode_response(&schema, text, &[]).unwrap();
        assert_eq!(
            decoded.get("item_list"),
            Some(&DecodedValue::List(vec![
                DecodedValue::Text("a".into()),
                DecodedValue::Text("b".into())
            ]))
        );
    }

    #[test]
    fn list_element_failure_is_strict() {
        let schema = SchemaBuilder::new("R")
            .list("nums", "", FieldKind::Integer, true)
            .build()
            .unwrap();
        let text = "<response><nums><nums_element>x</nums_element></nums></response>";
        let err = decode_response(&schema, text, &[]).unwrap_err();
        assert!(matches!(err, DecodeError::UnparsableValue { .. }));
    }

    #[test]
    fn list_of_objects() {
        let schema = SchemaBuilder::new("R")
            .list("items", "", FieldKind::Object(subclass_ref()), true)
            .build()
            .unwrap();
        let text = "<response><items>\
                    <items_element><subclass><value>1</value></subclass></items_element>\
                    <items_element><value>2</value></items_element>\
                    </items></response>";
        let decoded = decode_response(&schema, text, &[]).unwrap();
        match decoded.get("items") {
            Some(DecodedValue::List(items)) => {
                assert_eq!(items.len(), 2);
                match (&items[0], &items[1]) {
                    (DecodedValue::Object(a), DecodedValue::Object(b)) => {
                        assert_eq!(a.get("value"), Some(&DecodedValue::Integer(1)));
                        assert_eq!(b.get("value"), Some(&DecodedValue::Integer(2)));
                    }
                    other => panic!("unexpected elements: {other:?}"),
                }
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn excluded_fields_resolve_to_null() {
        let text = "<response><title>t</title></response>";
        let decoded = decode_response(&report_schema(), text, &["count", "note"]).unwrap();
        assert_eq!(decoded.get("count"), Some(&DecodedValue::Null));
        assert_eq!(decoded.get("note"), Some(&DecodedValue::Null));
    }
}
