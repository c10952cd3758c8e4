//! Lightweight markup formatter.
//!
//! Turns the free-form description text of a docblock into a tree of
//! [`Block`] nodes whose text runs are [`Inline`] sequences. The markup is a
//! small wiki-like dialect:
//!
//! ```text
//! Heading                       *   bullet item
//! =======                       #   numbered item
//!
//! Sub heading                   > quoted
//! -----------                   > > nested quote
//!
//! *bold* ~italic~ _underline_ -struck- @code@ http://example.com
//!
//! .. note: warning, boxed
//!     Literal plugin body.
//!
//! +------+------+
//! | A    | B    |
//! +======+======+
//! | 1    | 2    |
//! +------+------+
//! ```
//!
//! Formatting never fails: anything unrecognized ends up as paragraph text.

mod block;
mod inline;
mod table;

use serde::Serialize;

/// Default number of columns per indentation level.
pub const DEFAULT_TAB_WIDTH: usize = 4;

/// Nesting depth past which table cells are no longer formatted.
pub const MAX_DEPTH: usize = 200;

/// Root of a formatted description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Document {
    pub children: Vec<Block>,
    /// Headings in document order, for building a table of contents.
    pub toc: Vec<TocEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u8,
    pub title: String,
    pub anchor: String,
}

/// Block-level node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    Heading {
        level: u8,
        anchor: String,
        content: Vec<Inline>,
    },
    Paragraph {
        content: Vec<Inline>,
    },
    List {
        ordered: bool,
        /// Always [`Block::ListItem`] nodes.
        items: Vec<Block>,
    },
    ListItem {
        children: Vec<Block>,
    },
    Blockquote {
        depth: usize,
        children: Vec<Block>,
    },
    Rule,
    /// `.. name: param, param` directive with a literal body.
    Plugin {
        name: String,
        params: Vec<String>,
        /// Literal [`Block::Raw`] payloads.
        children: Vec<Block>,
    },
    Table(Table),
    Raw {
        text: String,
    },
}

/// Grid table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    /// Column widths in percent of the table width; a rendering hint.
    pub widths: Vec<u8>,
    pub head: Vec<Row>,
    pub body: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Row {
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub header: bool,
    pub colspan: usize,
    pub width: u8,
    pub children: Vec<Block>,
}

/// Character-level node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inline {
    Text { text: String },
    Bold { children: Vec<Inline> },
    Underline { children: Vec<Inline> },
    Italic { children: Vec<Inline> },
    Strikethrough { children: Vec<Inline> },
    Code { children: Vec<Inline> },
    Link { href: String, text: String },
    /// Named character reference such as `mdash`.
    Entity { name: String },
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text { text: text.into() }
    }

    /// Concatenated text content, entities resolved to their characters.
    pub fn plain_text(&self) -> String {
        match self {
            Inline::Text { text } => text.clone(),
            Inline::Bold { children }
            | Inline::Underline { children }
            | Inline::Italic { children }
            | Inline::Strikethrough { children }
            | Inline::Code { children } => plain_text(children),
            Inline::Link { text, .. } => text.clone(),
            Inline::Entity { name } => match name.as_str() {
                "mdash" => "\u{2014}".to_string(),
                "ndash" => "\u{2013}".to_string(),
                other => format!("&{};", other),
            },
        }
    }
}

/// Text content of an inline sequence.
pub fn plain_text(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::plain_text).collect()
}

/// Markup formatter settings.
#[derive(Debug, Clone, Copy)]
pub struct Formatter {
    tab_width: usize,
    depth: usize,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new(DEFAULT_TAB_WIDTH)
    }
}

impl Formatter {
    /// A list marker is followed by `tab_width - 1` spaces, so widths below
    /// two are raised to two.
    pub fn new(tab_width: usize) -> Self {
        Self {
            tab_width: tab_width.max(2),
            depth: 0,
        }
    }

    pub fn tab_width(&self) -> usize {
        self.tab_width
    }

    /// Format a multi-line description into a block tree.
    pub fn format(&self, text: &str) -> Document {
        block::BlockParser::new(*self, text).run()
    }

    /// Format one line of text into inline nodes.
    pub fn format_inline(&self, text: &str) -> Vec<Inline> {
        inline::format(text)
    }

    /// Formatter for content nested one level deeper (table cells).
    fn nested(&self) -> Option<Self> {
        (self.depth < MAX_DEPTH).then(|| Self {
            tab_width: self.tab_width,
            depth: self.depth + 1,
        })
    }
}

/// Format with the default tab width.
pub fn format(text: &str) -> Document {
    Formatter::default().format(text)
}

/// Format one line with the default settings.
pub fn format_inline(text: &str) -> Vec<Inline> {
    inline::format(text)
}
