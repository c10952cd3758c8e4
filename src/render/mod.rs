//! Output formats behind the [`Format`] trait, plus text helpers shared by
//! them.

pub mod html;
pub mod json;

use crate::config::{Config, OutputFormat};
use crate::error::Result;
use crate::markup::{Document, Formatter};
use crate::model::DocEntry;
use crate::organize::{Index, Page};

/// Attributes shown for an entry, in display order. Other tags are not shown.
pub const ATTRIBUTE_ORDER: &[&str] = &[
    "package",
    "license",
    "copyright",
    "author",
    "extends",
    "deprecated",
    "since",
    "see",
    "tutorial",
    "example",
    "abstract",
    "static",
    "param",
    "return",
    "throws",
    "todo",
];

/// Settings shared by all formats.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Name of the whole documentation.
    pub title: String,
    pub formatter: Formatter,
    pub source_lines: usize,
}

impl RenderOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.title().to_string(),
            formatter: Formatter::new(config.tab_width),
            source_lines: config.source_lines,
        }
    }

    /// Formatted description of an entry.
    pub fn description(&self, entry: &DocEntry) -> Document {
        self.formatter.format(&unindent(&entry.description))
    }
}

/// Trait for rendering pages and the index into a specific output format.
pub trait Format {
    fn file_extension(&self) -> &str;
    fn page(&self, page: &Page) -> Result<String>;
    fn index(&self, index: &Index) -> Result<String>;

    /// Archive path of a rendered page.
    fn page_path(&self, page: &Page) -> String {
        format!("content/{}.{}", page.name, self.file_extension())
    }

    fn index_path(&self) -> String {
        format!("index.{}", self.file_extension())
    }
}

/// Create the renderer for an output format.
pub fn create_format(format: OutputFormat, options: RenderOptions) -> Box<dyn Format> {
    match format {
        OutputFormat::Html => Box::new(html::HtmlFormat::new(options)),
        OutputFormat::Json => Box::new(json::JsonFormat::new(options)),
    }
}

/// Remove leading blank lines and the indentation common to all non-blank
/// lines.
pub fn unindent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let Some(start) = lines.iter().position(|l| !l.trim().is_empty()) else {
        return String::new();
    };

    let min_indent = lines[start..]
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    lines[start..]
        .iter()
        .map(|l| l.get(min_indent..).unwrap_or("").trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shortened source snippet for display.
///
/// Indentation is normalized and trailing whitespace dropped. Snippets longer
/// than `max_lines` are cut, trailing blank lines of the kept part removed,
/// and an `...` line added at the indentation of the last kept line.
pub fn excerpt(source: &str, max_lines: usize) -> String {
    let text = unindent(source);
    let text = text.trim_end();
    if text.is_empty() {
        return String::new();
    }

    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines + 1 {
        return text.to_string();
    }

    let mut kept: Vec<&str> = lines[..max_lines].to_vec();
    while kept.last().is_some_and(|l| l.trim().is_empty()) {
        kept.pop();
    }
    let Some(last) = kept.last() else {
        return String::new();
    };
    let indent = &last[..last.len() - last.trim_start_matches(' ').len()];
    let ellipsis = format!("{indent}...");
    kept.push(&ellipsis);
    kept.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn unindent_basic() {
        assert_eq!(unindent("  a\n  b\n  c"), "a\nb\nc");
    }

    #[test]
    fn unindent_mixed() {
        assert_eq!(unindent("  a\n    b\n  c"), "a\n  b\nc");
    }

    #[test]
    fn unindent_blank_lines() {
        assert_eq!(unindent("\n   \n  a\n\n  b  "), "a\n\nb");
        assert_eq!(unindent(" \n "), "");
    }

    #[test]
    fn excerpt_short_snippet_is_kept() {
        assert_eq!(
            excerpt("    public function exec()\n    {\n    }\n\n", 9),
            "public function exec()\n{\n}"
        );
    }

    #[test]
    fn excerpt_cuts_long_snippets() {
        let source = "class a {\n    one();\n    two();\n\n    three();\n    four();\n}\n";
        assert_eq!(excerpt(source, 3), "class a {\n    one();\n    two();\n    ...");
        assert_eq!(excerpt(source, 4), "class a {\n    one();\n    two();\n    ...");
    }

    #[test]
    fn excerpt_allows_one_extra_line() {
        assert_eq!(excerpt("a\nb\nc", 2), "a\nb\nc");
    }

    #[test]
    fn excerpt_of_blank_source() {
        assert_eq!(excerpt("  \n\n", 9), "");
    }
}
