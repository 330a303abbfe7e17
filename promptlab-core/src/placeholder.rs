//! Placeholder extraction and rendering
//!
//! Template text references variables with `{{identifier}}`, where the
//! identifier is one or more ASCII letters, digits or underscores. There is no
//! whitespace inside the braces and names are case-sensitive.
//!
//! Scanning is a single left-to-right pass over the bytes of the template.
//! Anything that is not a well-formed placeholder (unbalanced braces, nested
//! braces, foreign characters) is plain text and is copied through untouched.

use std::collections::{HashMap, HashSet};
use std::ops::Range;

use thiserror::Error;

const OPEN: &[u8] = b"{{";
const CLOSE: &[u8] = b"}}";

/// Rendering failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The template references a name that has no binding
    #[error("Missing variable: {0}")]
    UnboundVariable(String),
}

/// A well-formed `{{identifier}}` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder<'a> {
    /// The identifier between the braces
    pub name: &'a str,
    /// Byte range of the whole token, braces included
    pub span: Range<usize>,
}

/// Iterator over the placeholders of a template, in textual order
pub struct Placeholders<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> Iterator for Placeholders<'a> {
    type Item = Placeholder<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.content.as_bytes();

        while self.pos + OPEN.len() <= bytes.len() {
            let start = self.pos;
            if &bytes[start..start + OPEN.len()] != OPEN {
                self.pos += 1;
                continue;
            }

            let name_start = start + OPEN.len();
            let mut end = name_start;
            while end < bytes.len() && is_identifier_byte(bytes[end]) {
                end += 1;
            }

            if end > name_start && bytes[end..].starts_with(CLOSE) {
                self.pos = end + CLOSE.len();
                return Some(Placeholder {
                    name: &self.content[name_start..end],
                    span: start..self.pos,
                });
            }

            // No `{{` can begin inside a run of identifier bytes.
            self.pos = if end > name_start { end } else { start + 1 };
        }

        self.pos = bytes.len();
        None
    }
}

/// Iterate over every well-formed placeholder in `content`
pub fn placeholders(content: &str) -> Placeholders<'_> {
    Placeholders { content, pos: 0 }
}

/// Distinct placeholder names in first-seen order
///
/// Extraction never fails; malformed tokens are simply not matched.
pub fn extract_variables(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    placeholders(content)
        .filter(|p| seen.insert(p.name))
        .map(|p| p.name.to_string())
        .collect()
}

/// Substitute every placeholder with its binding
///
/// Rendering is strict: the first placeholder without a binding fails the whole
/// render, nothing is ever replaced with an empty string.
pub fn render(content: &str, bindings: &HashMap<String, String>) -> Result<String, RenderError> {
    let mut rendered = String::with_capacity(content.len());
    let mut copied = 0;

    for placeholder in placeholders(content) {
        let value = bindings
            .get(placeholder.name)
            .ok_or_else(|| RenderError::UnboundVariable(placeholder.name.to_string()))?;

        rendered.push_str(&content[copied..placeholder.span.start]);
        rendered.push_str(value);
        copied = placeholder.span.end;
    }

    rendered.push_str(&content[copied..]);
    Ok(rendered)
}

/// Whether `name` is usable as a placeholder / output variable name
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(is_identifier_byte)
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bindings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_extract_variables() {
        let content = "Hi {{name}}, you are from {{city}} in {{country}}.";
        assert_eq!(extract_variables(content), vec!["name", "city", "country"]);
    }

    #[test]
    fn test_extract_collapses_duplicates_in_first_seen_order() {
        let content = "{{b}} {{a}} {{b}} {{c}} {{a}}";
        assert_eq!(extract_variables(content), vec!["b", "a", "c"]);
    }

    #[test]
    fn test_extract_no_placeholders() {
        assert!(extract_variables("Plain text without any variables.").is_empty());
        assert!(extract_variables("").is_empty());
    }

    #[test]
    fn test_extract_ignores_malformed_tokens() {
        let content = "{{ spaced }} {{}} {{bad-name}} {name} {{open {{ok}} }}x{{ {{nested{{inner}}}}";
        assert_eq!(extract_variables(content), vec!["ok", "inner"]);
    }

    #[test]
    fn test_extract_with_extra_braces() {
        assert_eq!(extract_variables("{{{name}}}"), vec!["name"]);
        assert_eq!(extract_variables("{{{{x}}"), vec!["x"]);
    }

    #[test]
    fn test_extract_is_case_sensitive() {
        assert_eq!(extract_variables("{{Name}} {{name}}"), vec!["Name", "name"]);
    }

    #[test]
    fn test_extract_ignores_non_ascii_identifiers() {
        assert!(extract_variables("{{café}}").is_empty());
        assert_eq!(extract_variables("été {{ville}} à"), vec!["ville"]);
    }

    #[test]
    fn test_placeholder_spans() {
        let content = "ab{{x}}cd";
        let found: Vec<_> = placeholders(content).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "x");
        assert_eq!(&content[found[0].span.clone()], "{{x}}");
    }

    #[test]
    fn test_render_substitutes_variables() {
        let content = "Hello {{name}}, welcome to {{place}}!";
        let result = render(content, &bindings(&[("name", "Alice"), ("place", "Wonderland")]));
        assert_eq!(result.unwrap(), "Hello Alice, welcome to Wonderland!");
    }

    #[test]
    fn test_render_fails_on_missing_variable() {
        let content = "Hello {{name}}, welcome to {{place}}!";
        let result = render(content, &bindings(&[("name", "Alice")]));
        assert_eq!(result, Err(RenderError::UnboundVariable("place".to_string())));
        assert_eq!(result.unwrap_err().to_string(), "Missing variable: place");
    }

    #[test]
    fn test_render_no_variables() {
        let content = "Plain text without any variables.";
        assert_eq!(render(content, &HashMap::new()).unwrap(), content);
    }

    #[test]
    fn test_render_keeps_malformed_tokens_verbatim() {
        let content = "{{ name }} {{name}} {{}} {x}";
        let result = render(content, &bindings(&[("name", "Bob")])).unwrap();
        assert_eq!(result, "{{ name }} Bob {{}} {x}");
    }

    #[test]
    fn test_render_does_not_rescan_substituted_values() {
        let result = render("{{a}}", &bindings(&[("a", "{{b}}")])).unwrap();
        assert_eq!(result, "{{b}}");
    }

    #[test]
    fn test_render_is_idempotent_for_same_bindings() {
        let vars = bindings(&[("text", "Bonjour le monde")]);
        let content = "Translate: {{text}} / {{text}}";
        assert_eq!(render(content, &vars), render(content, &vars));
    }

    #[test]
    fn test_render_ignores_unused_bindings() {
        let result = render("{{a}}", &bindings(&[("a", "1"), ("b", "2")])).unwrap();
        assert_eq!(result, "1");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("english_text"));
        assert!(is_identifier("Step2"));
        assert!(is_identifier("_"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("has space"));
        assert!(!is_identifier("dash-ed"));
        assert!(!is_identifier("ünicode"));
    }

    #[test]
    fn test_long_unterminated_input() {
        let content = format!("{{{{{}", "a".repeat(10_000));
        assert!(extract_variables(&content).is_empty());
        let content = "{{".repeat(5_000);
        assert!(extract_variables(&content).is_empty());
    }
}
