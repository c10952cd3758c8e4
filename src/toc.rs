//! Anchor generation for headings and documented scopes.

/// Heading anchor slug.
///
/// - lowercase
/// - keep alphanumerics, spaces and hyphens; drop everything else
/// - spaces become hyphens
pub fn slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.trim().to_lowercase().chars() {
        if c.is_alphanumeric() || c == ' ' || c == '-' {
            slug.push(c);
        }
    }
    slug.replace(' ', "-")
}

/// Anchor of a documented scope: every non-ASCII-alphanumeric becomes `-`.
///
/// `octdoc/doc/$format` → `octdoc-doc--format`
pub fn scope_anchor(scope: &str) -> String {
    scope
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_simple() {
        assert_eq!(slug("hello world"), "hello-world");
    }

    #[test]
    fn slug_strips_punctuation() {
        assert_eq!(slug("Usage: doc::exec()"), "usage-docexec");
        assert_eq!(slug("trim-left"), "trim-left");
    }

    #[test]
    fn slug_uppercase() {
        assert_eq!(slug("Hello World"), "hello-world");
    }

    #[test]
    fn scope_anchor_replaces_separators() {
        assert_eq!(scope_anchor("octdoc/doc/$format"), "octdoc-doc--format");
        assert_eq!(scope_anchor("doc/parse"), "doc-parse");
    }
}
