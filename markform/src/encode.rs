//! Schema-to-prompt encoding.
//!
//! Walks a schema tree and emits the prompt text that teaches the model the
//! expected markup: fixed formatting instructions, an example document with
//! typed placeholders for every field, and a flattened field-by-field
//! description section with nested types described once, before the root.

use std::collections::HashSet;

use markform_core::{FieldKind, SchemaError, SchemaObject, SchemaRef, StructuredResponse};
use tracing::debug;

/// The fixed wrapper tag for the root of a response document.
pub const RESPONSE_TAG: &str = "response";

/// Comment appended to an optional field's opening line.
pub const OPTIONAL_COMMENT: &str = "<!-- if null or not applicable leave this element empty -->";

/// Render the markup prompt for a derived response type.
///
/// `exclude` lists field names to leave out of the template and the
/// descriptions, at every nesting level.
pub fn render_schema_prompt<T: StructuredResponse>(exclude: &[&str]) -> Result<String, SchemaError> {
    render_prompt(&T::schema(), exclude)
}

/// Render the markup prompt for a schema value.
pub fn render_prompt(schema: &SchemaObject, exclude: &[&str]) -> Result<String, SchemaError> {
    debug!(type_name = schema.type_name(), "rendering schema prompt");
    let mut lines = vec![instructions()];
    let mut stack = Vec::new();
    example_block(schema, 0, exclude, &mut stack, &mut lines)?;
    descriptions_block(schema, exclude, &mut lines);
    Ok(lines.join("\n"))
}

fn instructions() -> String {
    format!(
        "\nFormatting instructions: respond without any other explanations or comments, \
         prepended or appended to the <{RESPONSE_TAG}> tags. Pay attention that all fields \
         are attended to, and properly enclosed within their own opening and closing tags.\n"
    )
}

/// The placeholder text and type label for a scalar field kind.
fn scalar_placeholder(kind: &FieldKind) -> (&'static str, String) {
    match kind {
        FieldKind::Enum { values, .. } => ("enum", format!("One of: {}", values.join(", "))),
        other => {
            let label = other.type_label();
            (label, label.to_string())
        }
    }
}

fn example_block(
    schema: &SchemaObject,
    indent_level: usize,
    exclude: &[&str],
    stack: &mut Vec<String>,
    out: &mut Vec<String>,
) -> Result<(), SchemaError> {
    let indent = "    ".repeat(indent_level);
    let tag = if indent_level == 0 {
        RESPONSE_TAG.to_string()
    } else {
        schema.tag_name()
    };
    stack.push(schema.tag_name());
    out.push(format!("{indent}<{tag}>"));

    for field in schema.fields() {
        if exclude.contains(&field.name.as_str()) {
            continue;
        }
        field.kind.ensure_supported(&field.name)?;
        match &field.kind {
            FieldKind::List(element) => {
                let mut open = format!("{indent}    <{} type=\"list\">", field.name);
                if field.optional {
                    open.push_str(OPTIONAL_COMMENT);
                }
                out.push(open);
                match element.as_ref() {
                    FieldKind::Object(nested) => {
                        out.push(format!(
                            "{indent}        <{}_element type=\"class\">",
                            field.name
                        ));
                        nested_example(nested, indent_level + 3, exclude, stack, out)?;
                        out.push(format!("{indent}        </{}_element>", field.name));
                        out.push(format!("{indent}        ..."));
                    }
                    scalar => {
                        let (label, placeholder) = scalar_placeholder(scalar);
                        out.push(format!(
                            "{indent}        <{name}_element type=\"{label}\">[{placeholder}]</{name}_element>",
                            name = field.name
                        ));
                        out.push(format!("{indent}        ..."));
                    }
                }
                out.push(format!("{indent}    </{}>", field.name));
            }
            FieldKind::Object(nested) => {
                let mut open = format!("{indent}    <{} type=\"class\">", field.name);
                if field.optional {
                    open.push_str(OPTIONAL_COMMENT);
                }
                out.push(open);
                nested_example(nested, indent_level + 2, exclude, stack, out)?;
                out.push(format!("{indent}    </{}>", field.name));
            }
            scalar => {
                let (label, placeholder) = scalar_placeholder(scalar);
                let mut line = format!(
                    "{indent}    <{name} type=\"{label}\">[{placeholder}]</{name}>",
                    name = field.name
                );
                if field.optional {
                    line.push_str(OPTIONAL_COMMENT);
                }
                out.push(line);
            }
        }
    }

    out.push(format!("{indent}</{tag}>"));
    stack.pop();
    Ok(())
}

/// Recurse into a nested type's example, eliding types already on the stack
/// so self-referential schemas terminate.
fn nested_example(
    nested: &SchemaRef,
    indent_level: usize,
    exclude: &[&str],
    stack: &mut Vec<String>,
    out: &mut Vec<String>,
) -> Result<(), SchemaError> {
    if stack.contains(&nested.tag_name()) {
        let indent = "    ".repeat(indent_level);
        out.push(format!("{indent}<{tag}>...</{tag}>", tag = nested.tag_name()));
        return Ok(());
    }
    example_block(&nested.resolve(), indent_level, exclude, stack, out)
}

/// The nested schema referenced by a field kind, if any (lists included).
fn nested_ref(kind: &FieldKind) -> Option<&SchemaRef> {
    match kind {
        FieldKind::Object(nested) => Some(nested),
        FieldKind::List(element) => match element.as_ref() {
            FieldKind::Object(nested) => Some(nested),
            _ => None,
        },
        _ => None,
    }
}

fn descriptions_block(schema: &SchemaObject, exclude: &[&str], out: &mut Vec<String>) {
    // The root gets its own section last; seeding it here keeps a cycle back
    // to the root from producing a second section.
    let mut described: HashSet<String> = HashSet::new();
    described.insert(schema.tag_name());

    for field in schema.fields() {
        if exclude.contains(&field.name.as_str()) {
            continue;
        }
        if let Some(nested) = nested_ref(&field.kind) {
            describe_nested(nested, exclude, &mut described, out);
        }
    }

    out.push(format!(
        "\nHere is the description for each field for the <{RESPONSE_TAG}> main element:"
    ));
    for field in schema.fields() {
        if !exclude.contains(&field.name.as_str()) {
            out.push(field_description(field));
        }
    }
}

fn describe_nested(
    nested: &SchemaRef,
    exclude: &[&str],
    described: &mut HashSet<String>,
    out: &mut Vec<String>,
) {
    if !described.insert(nested.tag_name()) {
        return;
    }
    let schema = nested.resolve();
    out.push(format!(
        "\nHere is the description for each field for the <{}> element:",
        schema.tag_name()
    ));
    for field in schema.fields() {
        if !exclude.contains(&field.name.as_str()) {
            out.push(field_description(field));
        }
    }
    for field in schema.fields() {
        if exclude.contains(&field.name.as_str()) {
            continue;
        }
        if let Some(inner) = nested_ref(&field.kind) {
            describe_nested(inner, exclude, described, out);
        }
    }
}

fn element_label(kind: &FieldKind) -> String {
    match kind {
        FieldKind::Object(_) => "groups containing further sub fields".to_string(),
        FieldKind::Enum { name, .. } => name.clone(),
        other => other.type_label().to_string(),
    }
}

fn field_description(field: &markform_core::SchemaField) -> String {
    let mut text = format!("\n{}:", field.name);

    match &field.kind {
        FieldKind::Date => {
            text.push_str("\n  - Type: date");
            text.push_str(
                "\n  - Format: Use clear date format (e.g., 'YYYY-MM-DD', 'January 1, 2023', \
                 etc.) if possible, but only from the available data, without inferring missing \
                 years, months or days.",
            );
        }
        FieldKind::Time => {
            text.push_str("\n  - Type: time");
            text.push_str(
                "\n  - Format: Use clear time format (e.g., 'HH:MM:SS', '3:45 PM', etc.) if \
                 possible, but only from the available data, without inferring missing hours, \
                 minutes or seconds.",
            );
        }
        FieldKind::DateTime => {
            text.push_str("\n  - Type: datetime");
            text.push_str(
                "\n  - Format: Use clear datetime format (e.g., 'YYYY-MM-DD HH:MM:SS', \
                 'January 1, 2023 3:45 PM', etc.) if possible, but only from the available \
                 data, without inferring missing years, months, days, hours, minutes or seconds.",
            );
        }
        FieldKind::Object(_) => {
            text.push_str("\n  - Type: a group containing further sub fields");
        }
        FieldKind::Enum { name, .. } => {
            text.push_str(&format!("\n  - Type: {name}"));
        }
        FieldKind::List(element) => {
            text.push_str(&format!("\n  - Type: list of {}", element_label(element)));
        }
        other => {
            text.push_str(&format!("\n  - Type: {}", other.type_label()));
        }
    }

    text.push_str(&format!(
        "\n  - {} field",
        if field.optional { "Optional" } else { "Required" }
    ));

    if !field.description.is_empty() {
        text.push_str(&format!("\n  - Description: {}", field.description));
    }

    if let FieldKind::Enum { values, .. } = &field.kind {
        text.push_str(&format!("\n  - Allowed values: {}", values.join(", ")));
    }

    let c = &field.constraints;
    if let Some(v) = c.ge {
        text.push_str(&format!("\n  - Minimum Value (inclusive): {v}"));
    }
    if let Some(v) = c.gt {
        text.push_str(&format!("\n  - Minimum Value (exclusive): {v}"));
    }
    if let Some(v) = c.le {
        text.push_str(&format!("\n  - Maximum Value (inclusive): {v}"));
    }
    if let Some(v) = c.lt {
        text.push_str(&format!("\n  - Maximum Value (exclusive): {v}"));
    }
    if let Some(v) = c.multiple_of {
        text.push_str(&format!("\n  - Must be a multiple of: {v}"));
    }
    if let Some(v) = c.min_length {
        text.push_str(&format!("\n  - Minimum length: {v}"));
    }
    if let Some(v) = c.max_length {
        text.push_str(&format!("\n  - Maximum length: {v}"));
    }

    text.push_str(&format!(
        "\n  - It is always enclosed between <{name}> open and </{name}> closing tags.",
        name = field.name
    ));

    text
}
