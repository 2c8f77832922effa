//! `{{ key }}` placeholder rendering
//!
//! Only simple placeholders are recognised: a key made of letters, digits,
//! `_`, `-` and `.` between double braces. Anything else (policy-engine
//! expressions such as `{{ request.object.metadata.name | lower }}` or
//! `{{hub ... hub}}`) is left untouched.

use std::collections::HashMap;

/// Outcome of one render pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    /// Placeholder keys with no value, in order of appearance
    pub unresolved: Vec<String>,
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Key of a placeholder body, if the body is a simple key
fn placeholder_key(body: &str) -> Option<&str> {
    let key = body.trim();
    if !key.is_empty() && key.chars().all(is_key_char) {
        Some(key)
    } else {
        None
    }
}

/// Substitute `{{ key }}` placeholders from `values`
///
/// Unknown keys render as an empty string and are reported in
/// [`Rendered::unresolved`].
pub fn render(template: &str, values: &HashMap<String, String>) -> Rendered {
    let mut text = String::with_capacity(template.len());
    let mut unresolved: Vec<String> = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            break;
        };

        text.push_str(&rest[..open]);
        let body = &after_open[..close];
        match placeholder_key(body) {
            Some(key) => match values.get(key) {
                Some(value) => text.push_str(value),
                None => {
                    if !unresolved.iter().any(|k| k == key) {
                        unresolved.push(key.to_string());
                    }
                }
            },
            None => {
                text.push_str("{{");
                text.push_str(body);
                text.push_str("}}");
            }
        }
        rest = &after_open[close + 2..];
    }
    text.push_str(rest);

    Rendered { text, unresolved }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> HashMap<String, String> {
        HashMap::from([
            ("allowed_registries".to_string(), "quay.io".to_string()),
            ("min.replicas".to_string(), "3".to_string()),
        ])
    }

    #[test]
    fn test_render_substitutes_known_keys() {
        let rendered = render(
            "registry: {{ allowed_registries }}\nreplicas: {{min.replicas}}",
            &values(),
        );
        assert_eq!(rendered.text, "registry: quay.io\nreplicas: 3");
        assert!(rendered.unresolved.is_empty());
    }

    #[test]
    fn test_unknown_key_renders_empty() {
        let rendered = render("a: '{{ missing }}' b: '{{ missing }}'", &values());
        assert_eq!(rendered.text, "a: '' b: ''");
        assert_eq!(rendered.unresolved, vec!["missing".to_string()]);
    }

    #[test]
    fn test_expressions_are_left_alone() {
        let template = "name: \"{{ request.object.metadata.name | lower }}\"";
        let rendered = render(template, &values());
        assert_eq!(rendered.text, template);
    }
}
