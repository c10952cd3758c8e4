//! Block-level markup scanner.
//!
//! Single pass over the lines with an explicit container stack. Lists and
//! plugin bodies nest by indentation (one level per `tab_width` columns);
//! blockquotes nest by the number of leading `>` markers. A line that is
//! less indented than the current level closes one container and is then
//! scanned again, so several levels can unwind on the same line.

use super::{inline, plain_text, table, Block, Document, Formatter, TocEntry};
use crate::toc;
use regex::Regex;
use std::sync::LazyLock;

static RE_UNDERLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:=+|-+)$").unwrap());

static RE_RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-{3,}$").unwrap());

static RE_PLUGIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.\.\s+([A-Za-z_][A-Za-z0-9_-]*):\s*(.*)$").unwrap());

#[derive(Debug)]
enum Container {
    Root,
    Quote(usize),
    List { ordered: bool },
    Item,
    Plugin { name: String, params: Vec<String> },
}

#[derive(Debug)]
struct Frame {
    container: Container,
    children: Vec<Block>,
}

impl Frame {
    fn new(container: Container) -> Self {
        Self {
            container,
            children: Vec::new(),
        }
    }
}

/// What to do after scanning a line.
enum Step {
    Next,
    /// Scan this (possibly rewritten) line again before reading a new one.
    Again(String),
}

pub(super) struct BlockParser {
    fmt: Formatter,
    lines: Vec<String>,
    stack: Vec<Frame>,
    buffer: Vec<String>,
    /// Open list items and plugins above the innermost quote.
    indent: usize,
    toc: Vec<TocEntry>,
}

impl BlockParser {
    pub(super) fn new(fmt: Formatter, text: &str) -> Self {
        let tab_width = fmt.tab_width();
        Self {
            fmt,
            lines: text.lines().map(|l| expand_tabs(l, tab_width)).collect(),
            stack: vec![Frame::new(Container::Root)],
            buffer: Vec::new(),
            indent: 0,
            toc: Vec::new(),
        }
    }

    pub(super) fn run(mut self) -> Document {
        let mut next = 0;
        let mut pending: Option<String> = None;

        loop {
            let line = match pending.take() {
                Some(line) => line,
                None => {
                    let Some(raw) = self.lines.get(next).cloned() else {
                        break;
                    };
                    next += 1;
                    self.enter_line(raw)
                }
            };
            if let Step::Again(line) = self.step(line, &mut next) {
                pending = Some(line);
            }
        }

        self.flush();
        while self.stack.len() > 1 {
            self.close_top();
        }
        let root = self.stack.pop().map(|f| f.children).unwrap_or_default();

        Document {
            children: root,
            toc: self.toc,
        }
    }

    /// Apply the quote markers of a freshly read line and return the rest.
    fn enter_line(&mut self, raw: String) -> String {
        if raw.trim().is_empty() {
            return String::new();
        }
        if self.in_plugin() && leading_spaces(&raw) >= self.indent * self.fmt.tab_width() {
            return raw;
        }

        let (depth, rest) = split_quote(&raw);
        if depth != self.quote_depth() {
            self.flush();
            self.set_quote_depth(depth);
        }
        rest.to_string()
    }

    fn step(&mut self, line: String, next: &mut usize) -> Step {
        let tab_width = self.fmt.tab_width();
        let indent = leading_spaces(&line) / tab_width;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            self.flush();
            return Step::Next;
        }
        if indent < self.indent {
            self.flush();
            self.dedent();
            return Step::Again(line);
        }

        if self.in_plugin() {
            let literal = strip_columns(&line, self.indent * tab_width);
            self.buffer.push(literal.to_string());
            return Step::Next;
        }

        if !self.buffer.is_empty() && RE_UNDERLINE.is_match(trimmed) {
            let level = if trimmed.starts_with('=') { 1 } else { 2 };
            self.flush_heading(level);
            return Step::Next;
        }

        if let Some((ordered, rest)) = self.list_marker(trimmed) {
            if !self.buffer.is_empty() {
                self.flush();
                return Step::Again(line);
            }
            let rest = rest.to_string();
            self.open_list_item(ordered);
            return Step::Again(format!("{}{}", " ".repeat(self.indent * tab_width), rest));
        }

        if self.buffer.is_empty() && RE_RULE.is_match(trimmed) {
            self.push(Block::Rule);
            return Step::Next;
        }

        if let Some(caps) = RE_PLUGIN.captures(trimmed) {
            if !self.buffer.is_empty() {
                self.flush();
                return Step::Again(line);
            }
            let name = caps[1].to_string();
            let params = caps[2]
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            self.stack.push(Frame::new(Container::Plugin { name, params }));
            self.indent += 1;
            return Step::Next;
        }

        if table::is_fence(trimmed) {
            self.flush();
            let depth = self.quote_depth();
            let rest = self.lines[*next..].iter().map_while(|raw| {
                let (d, r) = split_quote(raw);
                (d == depth).then(|| r.trim())
            });
            let (table, consumed) =
                table::parse(&self.fmt, std::iter::once(trimmed).chain(rest));
            *next += consumed.saturating_sub(1);
            self.push(Block::Table(table));
            return Step::Next;
        }

        self.buffer.push(trimmed.to_string());
        Step::Next
    }

    /// `*`, `+`, `-` or `#` followed by exactly `tab_width - 1` spaces.
    fn list_marker<'l>(&self, line: &'l str) -> Option<(bool, &'l str)> {
        let marker = line.chars().next()?;
        if !matches!(marker, '*' | '+' | '-' | '#') {
            return None;
        }
        let after = &line[1..];
        let pad = self.fmt.tab_width() - 1;
        let rest = after.get(pad..)?;
        let spaces_ok = after[..pad].bytes().all(|b| b == b' ');
        let content_ok = rest.chars().next().is_some_and(|c| !c.is_whitespace());
        (spaces_ok && content_ok).then_some((marker == '#', rest))
    }

    fn open_list_item(&mut self, ordered: bool) {
        let top = self.top();
        let reuse = matches!(
            top.children.last(),
            Some(Block::List { ordered: o, .. }) if *o == ordered
        );
        let items = match top.children.pop() {
            Some(Block::List { items, .. }) if reuse => items,
            Some(other) => {
                top.children.push(other);
                Vec::new()
            }
            None => Vec::new(),
        };
        self.stack.push(Frame {
            container: Container::List { ordered },
            children: items,
        });
        self.stack.push(Frame::new(Container::Item));
        self.indent += 1;
    }

    /// Close the innermost list item or plugin.
    fn dedent(&mut self) {
        while self.stack.len() > 1 {
            match self.close_top() {
                Container::Item => {
                    if matches!(self.top().container, Container::List { .. }) {
                        self.close_top();
                    }
                    break;
                }
                Container::Plugin { .. } => break,
                _ => {}
            }
        }
        self.indent = self.indent.saturating_sub(1);
    }

    fn quote_depth(&self) -> usize {
        self.stack
            .iter()
            .rev()
            .find_map(|f| match f.container {
                Container::Quote(d) => Some(d),
                _ => None,
            })
            .unwrap_or(0)
    }

    fn set_quote_depth(&mut self, target: usize) {
        while self.quote_depth() > target {
            while let Some(container) = self.try_close_top() {
                if matches!(container, Container::Quote(_)) {
                    break;
                }
            }
        }
        while self.quote_depth() < target {
            let depth = self.quote_depth() + 1;
            self.stack.push(Frame::new(Container::Quote(depth)));
        }
        self.indent = self
            .stack
            .iter()
            .rev()
            .take_while(|f| !matches!(f.container, Container::Quote(_) | Container::Root))
            .filter(|f| matches!(f.container, Container::Item | Container::Plugin { .. }))
            .count();
    }

    fn in_plugin(&self) -> bool {
        matches!(self.stack.last(), Some(f) if matches!(f.container, Container::Plugin { .. }))
    }

    fn top(&mut self) -> &mut Frame {
        // The root frame is only removed at the very end of `run`.
        let last = self.stack.len() - 1;
        &mut self.stack[last]
    }

    fn push(&mut self, block: Block) {
        self.top().children.push(block);
    }

    fn try_close_top(&mut self) -> Option<Container> {
        (self.stack.len() > 1).then(|| self.close_top())
    }

    /// Pop the top frame into its parent and report what it was.
    fn close_top(&mut self) -> Container {
        if self.stack.len() < 2 {
            return Container::Root;
        }
        let Some(frame) = self.stack.pop() else {
            return Container::Root;
        };
        let block = match &frame.container {
            Container::Root => unreachable!("root frame sits below every other frame"),
            Container::Quote(depth) => Block::Blockquote {
                depth: *depth,
                children: frame.children,
            },
            Container::List { ordered } => Block::List {
                ordered: *ordered,
                items: frame.children,
            },
            Container::Item => Block::ListItem {
                children: frame.children,
            },
            Container::Plugin { name, params } => Block::Plugin {
                name: name.clone(),
                params: params.clone(),
                children: frame.children,
            },
        };
        self.push(block);
        frame.container
    }

    /// Emit buffered lines: literal text inside a plugin, a paragraph elsewhere.
    fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let lines = std::mem::take(&mut self.buffer);
        let block = if self.in_plugin() {
            Block::Raw {
                text: lines.join("\n"),
            }
        } else {
            Block::Paragraph {
                content: inline::format(&lines.join(" ")),
            }
        };
        self.push(block);
    }

    fn flush_heading(&mut self, level: u8) {
        let text = std::mem::take(&mut self.buffer).join(" ");
        let content = inline::format(&text);
        let title = plain_text(&content);
        let anchor = toc::slug(&title);
        self.toc.push(TocEntry {
            level,
            title,
            anchor: anchor.clone(),
        });
        self.push(Block::Heading {
            level,
            anchor,
            content,
        });
    }
}

/// Count and strip leading `>` markers. Lines without markers are returned
/// untouched so their indentation survives.
fn split_quote(line: &str) -> (usize, &str) {
    let mut depth = 0;
    let mut rest = line;
    while let Some(after) = rest.trim_start().strip_prefix('>') {
        depth += 1;
        rest = after.strip_prefix(' ').unwrap_or(after);
    }
    if depth == 0 {
        (0, line)
    } else {
        (depth, rest)
    }
}

fn expand_tabs(line: &str, tab_width: usize) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + tab_width);
    let mut col = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = tab_width - col % tab_width;
            out.extend(std::iter::repeat(' ').take(pad));
            col += pad;
        } else {
            out.push(c);
            col += 1;
        }
    }
    out
}

fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Remove up to `cols` leading spaces.
fn strip_columns(line: &str, cols: usize) -> &str {
    let n = leading_spaces(line).min(cols);
    &line[n..]
}

#[cfg(test)]
mod tests {
    use super::super::{format, Formatter, Inline, Row};
    use super::*;
    use pretty_assertions::assert_eq;

    fn para(text: &str) -> Block {
        Block::Paragraph {
            content: vec![Inline::text(text)],
        }
    }

    fn item(children: Vec<Block>) -> Block {
        Block::ListItem { children }
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let doc = format("first line\nsecond line\n\nnext paragraph\n");
        assert_eq!(
            doc.children,
            vec![para("first line second line"), para("next paragraph")]
        );
    }

    #[test]
    fn underlined_headings() {
        let doc = format("Overview\n========\nText.\n\nDetails\n-------\n");
        assert_eq!(
            doc.children,
            vec![
                Block::Heading {
                    level: 1,
                    anchor: "overview".into(),
                    content: vec![Inline::text("Overview")],
                },
                para("Text."),
                Block::Heading {
                    level: 2,
                    anchor: "details".into(),
                    content: vec![Inline::text("Details")],
                },
            ]
        );
        let levels: Vec<u8> = doc.toc.iter().map(|t| t.level).collect();
        assert_eq!(levels, vec![1, 2]);
        assert_eq!(doc.toc[1].title, "Details");
    }

    #[test]
    fn consecutive_items_share_one_list() {
        let doc = format("*   one\n*   two\n");
        assert_eq!(
            doc.children,
            vec![Block::List {
                ordered: false,
                items: vec![item(vec![para("one")]), item(vec![para("two")])],
            }]
        );
    }

    #[test]
    fn ordered_list_and_continuation() {
        let doc = format("#   first\n    still first\n#   second\n");
        assert_eq!(
            doc.children,
            vec![Block::List {
                ordered: true,
                items: vec![
                    item(vec![para("first still first")]),
                    item(vec![para("second")]),
                ],
            }]
        );
    }

    #[test]
    fn list_after_paragraph_text() {
        let doc = format("Options:\n-   fast\n-   slow\nDone.\n");
        assert_eq!(
            doc.children,
            vec![
                para("Options:"),
                Block::List {
                    ordered: false,
                    items: vec![item(vec![para("fast")]), item(vec![para("slow")])],
                },
                para("Done."),
            ]
        );
    }

    #[test]
    fn nested_lists_unwind_several_levels() {
        let doc = format("*   a\n    +   b\n        *   c\nafter\n");
        let inner = Block::List {
            ordered: false,
            items: vec![item(vec![para("c")])],
        };
        let middle = Block::List {
            ordered: false,
            items: vec![item(vec![para("b"), inner])],
        };
        assert_eq!(
            doc.children,
            vec![
                Block::List {
                    ordered: false,
                    items: vec![item(vec![para("a"), middle])],
                },
                para("after"),
            ]
        );
    }

    #[test]
    fn different_marker_kind_starts_new_list() {
        let doc = format("*   a\n#   b\n");
        assert_eq!(doc.children.len(), 2);
    }

    #[test]
    fn marker_needs_exact_padding() {
        let doc = format("* not an item\n");
        assert_eq!(doc.children, vec![para("* not an item")]);
    }

    #[test]
    fn tab_width_controls_marker_padding() {
        let doc = Formatter::new(2).format("* a\n* b\n");
        assert!(matches!(&doc.children[0], Block::List { items, .. } if items.len() == 2));
    }

    #[test]
    fn tabs_expand_to_tab_stops() {
        assert_eq!(expand_tabs("\tx", 4), "    x");
        assert_eq!(expand_tabs("ab\tx", 4), "ab  x");
    }

    #[test]
    fn horizontal_rule() {
        let doc = format("above\n\n----\n\nbelow\n");
        assert_eq!(doc.children, vec![para("above"), Block::Rule, para("below")]);
    }

    #[test]
    fn nested_blockquotes_return_to_root() {
        let doc = format("> outer\n> > inner\nplain\n");
        assert_eq!(
            doc.children,
            vec![
                Block::Blockquote {
                    depth: 1,
                    children: vec![
                        para("outer"),
                        Block::Blockquote {
                            depth: 2,
                            children: vec![para("inner")],
                        },
                    ],
                },
                para("plain"),
            ]
        );
    }

    #[test]
    fn blank_line_keeps_quote_open() {
        let doc = format("> a\n\n> b\n");
        assert_eq!(
            doc.children,
            vec![Block::Blockquote {
                depth: 1,
                children: vec![para("a"), para("b")],
            }]
        );
    }

    #[test]
    fn list_inside_quote() {
        let doc = format("> *   x\n> *   y\n");
        assert_eq!(
            doc.children,
            vec![Block::Blockquote {
                depth: 1,
                children: vec![Block::List {
                    ordered: false,
                    items: vec![item(vec![para("x")]), item(vec![para("y")])],
                }],
            }]
        );
    }

    #[test]
    fn plugin_body_is_literal() {
        let doc = format(".. code: php, numbered\n    $a = *b*;\n      indented\n\n    more\nafter\n");
        assert_eq!(
            doc.children,
            vec![
                Block::Plugin {
                    name: "code".into(),
                    params: vec!["php".into(), "numbered".into()],
                    children: vec![
                        Block::Raw {
                            text: "$a = *b*;\n  indented".into(),
                        },
                        Block::Raw { text: "more".into() },
                    ],
                },
                para("after"),
            ]
        );
    }

    #[test]
    fn plugin_after_text_is_deferred() {
        let doc = format("intro\n.. note:\n    body\n");
        assert_eq!(doc.children[0], para("intro"));
        assert!(matches!(&doc.children[1], Block::Plugin { name, params, .. } if name == "note" && params.is_empty()));
    }

    #[test]
    fn table_is_embedded() {
        let doc = format("Before\n\n+---+---+\n| a | b |\n+---+---+\nAfter\n");
        assert_eq!(doc.children.len(), 3);
        assert_eq!(doc.children[0], para("Before"));
        let Block::Table(table) = &doc.children[1] else {
            panic!("expected table, got {:?}", doc.children[1]);
        };
        assert!(table.head.is_empty());
        assert_eq!(table.body.len(), 1);
        let Row { cells } = &table.body[0];
        assert_eq!(cells[0].children, vec![para("a")]);
        assert_eq!(doc.children[2], para("After"));
    }

    #[test]
    fn inline_markup_in_paragraph() {
        let doc = format("some *bold* text\n");
        assert_eq!(
            doc.children,
            vec![Block::Paragraph {
                content: vec![
                    Inline::text("some "),
                    Inline::Bold {
                        children: vec![Inline::text("bold")]
                    },
                    Inline::text(" text"),
                ]
            }]
        );
    }

    #[test]
    fn paragraph_keeps_every_visible_character() {
        let input = "Parse a *file* and -- if needed -- extract it's\n  documentation: see http://example.com/a_b.";
        let doc = format(input);
        let Block::Paragraph { content } = &doc.children[0] else {
            panic!("expected paragraph");
        };
        let visible = |s: &str| -> String {
            s.chars()
                .filter(|c| !c.is_whitespace() && !"*-\u{2013}".contains(*c))
                .collect()
        };
        assert_eq!(visible(&plain_text(content)), visible(input));
    }

    #[test]
    fn empty_input() {
        assert_eq!(format(""), Document::default());
        assert_eq!(format("\n\n   \n"), Document::default());
    }
}
