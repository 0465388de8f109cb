//! Tolerant tag-matching utilities.
//!
//! Model output is markup-shaped but rarely markup-valid, so nothing here is
//! a strict XML parser: tags are matched by scanning for `<name>` or
//! `<name type="...">` openings and taking everything up to the first
//! matching `</name>`, spanning newlines. Unknown attributes, duplicate
//! sibling tags, and unclosed openings are all tolerated.

use std::sync::OnceLock;

use regex::Regex;
use tracing::trace;

/// A scanned top-level tag pair.
///
/// Transient: produced per decoding level, never persisted. The `type`
/// attribute is informational only; coercion is driven by the schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// The tag name.
    pub name: String,
    /// The `type="..."` attribute value, if present.
    pub type_attr: Option<String>,
    /// Raw inner content between the opening and closing tags.
    pub content: String,
}

fn open_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Single- or double-quoted type attribute, optional trailing space.
        Regex::new(r#"<([A-Za-z_][A-Za-z0-9_]*)(?:\s+type\s*=\s*(?:"([^"]*)"|'([^']*)'))?\s*>"#)
            .unwrap()
    })
}

fn comment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").unwrap())
}

fn fence_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```[A-Za-z]+[ \t]*\r?\n?").unwrap())
}

/// Scan text for top-level tag pairs.
///
/// Scanning resumes after each closing tag, so siblings are returned in
/// order and inner tags stay inside their parent's `content`. Duplicate
/// names are allowed; an opening tag with no matching close is skipped.
pub fn scan_elements(text: &str) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let Some(caps) = open_tag_re().captures(&text[pos..]) else {
            break;
        };
        let whole = caps.get(0).unwrap();
        let name = caps.get(1).unwrap().as_str().to_string();
        let type_attr = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_string());
        let content_start = pos + whole.end();
        let close = format!("</{name}>");
        match text[content_start..].find(&close) {
            Some(rel) => {
                let content = text[content_start..content_start + rel].to_string();
                trace!(tag = %name, len = content.len(), "scanned element");
                elements.push(Element {
                    name,
                    type_attr,
                    content,
                });
                pos = content_start + rel + close.len();
            }
            None => {
                trace!(tag = %name, "opening tag without close, skipping");
                pos = content_start;
            }
        }
    }
    elements
}

/// Inner content of the first `<tag ...>`...`</tag>` pair, if present.
pub fn find_wrapped<'a>(text: &'a str, tag: &str) -> Option<&'a str> {
    let mut all = find_all_wrapped(text, tag);
    if all.is_empty() {
        None
    } else {
        Some(all.remove(0))
    }
}

/// Inner content of every `<tag ...>`...`</tag>` pair, in order.
///
/// The opening tag may carry attributes; matching is by name only.
pub fn find_all_wrapped<'a>(text: &'a str, tag: &str) -> Vec<&'a str> {
    let close = format!("</{tag}>");
    let mut found = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let Some(start) = text[pos..].find(&format!("<{tag}")) else {
            break;
        };
        let start = pos + start;
        let after_name = start + tag.len() + 1;
        // Reject longer tag names sharing the prefix.
        match text[after_name..].chars().next() {
            Some('>') => {}
            Some(c) if c.is_whitespace() => {}
            _ => {
                pos = after_name;
                continue;
            }
        }
        let Some(gt) = text[after_name..].find('>') else {
            break;
        };
        let content_start = after_name + gt + 1;
        let Some(rel) = text[content_start..].find(&close) else {
            pos = content_start;
            continue;
        };
        found.push(&text[content_start..content_start + rel]);
        pos = content_start + rel + close.len();
    }
    found
}

/// Remove markup comments (`<!-- ... -->`), spanning newlines.
pub fn strip_comments(text: &str) -> String {
    comment_re().replace_all(text, "").into_owned()
}

/// Extract the payload of the first language-tagged code fence.
///
/// Returns `None` when the text carries no such fence; anything before the
/// fence and after its closing marker is discarded.
pub fn extract_fenced_payload(text: &str) -> Option<&str> {
    let open = fence_open_re().find(text)?;
    let rest = &text[open.end()..];
    let end = rest.find("```").unwrap_or(rest.len());
    Some(&rest[..end])
}

/// Remove the literal open/close markers of the given root tag, if present.
pub fn strip_root_tag(text: &str, tag: &str) -> String {
    text.replace(&format!("<{tag}>"), "")
        .replace(&format!("</{tag}>"), "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn scans_siblings_in_order() {
        let text = r#"<a type="string">one</a> noise <b>two</b>"#;
        let elements = scan_elements(text);
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].name, "a");
        assert_eq!(elements[0].type_attr.as_deref(), Some("string"));
        assert_eq!(elements[0].content, "one");
        assert_eq!(elements[1].name, "b");
        assert_eq!(elements[1].type_attr, None);
    }

    #[test]
    fn single_quoted_type_attribute() {
        let elements = scan_elements("<a type='int'>5</a>");
        assert_eq!(elements[0].type_attr.as_deref(), Some("int"));
    }

    #[test]
    fn multiline_content_is_kept_verbatim() {
        let text = "<note>\n  line one\n  line two\n</note>";
        let elements = scan_elements(text);
        assert_eq!(elements[0].content, "\n  line one\n  line two\n");
    }

    #[test]
    fn nested_tags_stay_inside_parent_content() {
        let text = "<outer><inner>x</inner></outer><next>y</next>";
        let elements = scan_elements(text);
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].content, "<inner>x</inner>");
        assert_eq!(elements[1].name, "next");
    }

    #[test]
    fn unclosed_tag_is_skipped() {
        let elements = scan_elements("<broken> no close <ok>v</ok>");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].name, "ok");
    }

    #[test]
    fn duplicate_names_are_all_returned() {
        let elements = scan_elements("<x>1</x><x>2</x>");
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1].content, "2");
    }

    #[test]
    fn tolerates_space_before_closing_angle() {
        let elements = scan_elements("<list >a</list>");
        assert_eq!(elements[0].name, "list");
    }

    #[test]
    fn find_wrapped_allows_attributes() {
        let text = r#"<subclass type="class"> <value>1</value> </subclass>"#;
        let inner = find_wrapped(text, "subclass").unwrap();
        assert!(inner.contains("<value>1</value>"));
    }

    #[test]
    fn find_wrapped_rejects_prefix_collisions() {
        // <item_extra> must not match a lookup for <item>.
        let text = "<item_extra>z</item_extra><item>y</item>";
        assert_eq!(find_wrapped(text, "item"), Some("y"));
    }

    #[test]
    fn find_all_wrapped_returns_every_match() {
        let text = "<e>1</e> <e>2</e> <e>3</e>";
        assert_eq!(find_all_wrapped(text, "e"), vec!["1", "2", "3"]);
    }

    #[test]
    fn strips_comments_across_lines() {
        let text = "a<!-- one\n two -->b<!-- three -->c";
        assert_eq!(strip_comments(text), "abc");
    }

    #[test]
    fn extracts_language_tagged_fence() {
        let text = "preamble\n```xml\n<response>x</response>\n```\ntrailing";
        let payload = extract_fenced_payload(text).unwrap();
        assert_eq!(payload.trim(), "<response>x</response>");
    }

    #[test]
    fn no_fence_returns_none() {
        assert_eq!(extract_fenced_payload("<response>x</response>"), None);
    }

    #[test]
    fn fence_without_close_runs_to_end() {
        let text = "```xml\n<a>1</a>";
        assert_eq!(extract_fenced_payload(text).unwrap().trim(), "<a>1</a>");
    }

    #[test]
    fn strip_root_tag_is_lenient() {
        assert_eq!(strip_root_tag("<response><a>1</a></response>", "response"), "<a>1</a>");
        assert_eq!(strip_root_tag("<a>1</a>", "response"), "<a>1</a>");
    }
}
