//! Comment-block dialects.
//!
//! Each dialect is a row of patterns consumed by the one docblock state
//! machine in [`super::docblock`]. Patterns are matched against lines with
//! surrounding whitespace removed.

use regex::Regex;
use std::sync::LazyLock;

/// Pattern family of one comment-block syntax.
#[derive(Debug)]
pub struct Dialect {
    /// Opening delimiter, used as the dialect's key.
    pub key: &'static str,
    pub start: Regex,
    pub doc: Regex,
    pub source_start: Regex,
    /// Whether the line that triggers snippet mode belongs to the snippet.
    pub retain_source_start: bool,
    pub end: Regex,
}

impl Dialect {
    fn new(
        key: &'static str,
        start: &str,
        doc: &str,
        source_start: &str,
        retain_source_start: bool,
        end: &str,
    ) -> Self {
        Self {
            key,
            start: Regex::new(start).unwrap(),
            doc: Regex::new(doc).unwrap(),
            source_start: Regex::new(source_start).unwrap(),
            retain_source_start,
            end: Regex::new(end).unwrap(),
        }
    }
}

/// Built-in dialects, in detection order.
pub static DIALECTS: LazyLock<Vec<Dialect>> = LazyLock::new(|| {
    vec![
        // /** ... */ code /**/
        Dialect::new(r"/**", r"^/\*\*", r"^\*", r"^\*/", false, r"^/\*\*/"),
        // #** ... #** (shell, make, ...)
        Dialect::new(r"#**", r"^#\*\*", r"^#", r"^(?:[^#]|$)", true, r"^#\*\*"),
        // %** ... %** (erlang)
        Dialect::new(r"%**", r"^%\*\*", r"^%", r"^(?:[^%]|$)", true, r"^%\*\*"),
        // --** ... --** (sql, lua, haskell)
        Dialect::new(
            r"--**",
            r"^--\*\*",
            r"^--",
            r"^(?:[^-]|-[^-]|-?$)",
            true,
            r"^--\*\*",
        ),
    ]
});

/// First dialect whose start pattern matches the (trimmed) line.
pub fn detect(line: &str) -> Option<&'static Dialect> {
    DIALECTS.iter().find(|d| d.start.is_match(line))
}
