//! HTML output: an index page plus one content page per source file.

use crate::error::Result;
use crate::markup::{Block, Cell, Document, Inline, Row, Table};
use crate::model::{DocEntry, DocType};
use crate::organize::{Index, Page, PageRef};
use crate::render::{excerpt, Format, RenderOptions, ATTRIBUTE_ORDER};
use crate::toc;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};
use std::collections::BTreeMap;

/// Heading level of entry headings before the first type heading.
const SCOPE_DEPTH: u8 = 5;

const STYLESHEET: &str = "\
body { font: 15px/1.5 Georgia, serif; max-width: 60em; margin: 1.5em auto; padding: 0 1.5em; }
h1, h2, h3, h4, h5, h6 { font-family: Helvetica, Arial, sans-serif; }
pre, code { font: 13px Menlo, Consolas, monospace; }
pre { border-left: 3px solid #ccc; background: #fafafa; padding: 0.5em 1em; }
table { border-collapse: collapse; margin: 0.5em 0; }
th, td { border: 1px solid #ccc; padding: 0.25em 0.6em; text-align: left; vertical-align: top; }
dl dt { margin-top: 0.75em; font-style: italic; }
ul ul { padding-left: 1.25em; }
.plugin { border: 1px dashed #ccc; padding: 0 0.5em; }
";

pub struct HtmlFormat {
    options: RenderOptions,
}

impl HtmlFormat {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    fn header(&self, out: &mut String, title: &str) {
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
        out.push_str("<meta charset=\"utf-8\">\n");
        out.push_str(&format!("<title>{}</title>\n", text(title)));
        out.push_str("<style>\n");
        out.push_str(STYLESHEET);
        out.push_str("</style>\n");
        out.push_str("</head>\n<body>\n");
    }

    fn footer(&self, out: &mut String) {
        out.push_str("</body>\n</html>\n");
    }

    fn entry(&self, out: &mut String, entry: &DocEntry, depth: u8) {
        if let Some((_, name)) = entry.scope.split_once('/') {
            let anchor = toc::scope_anchor(&entry.scope);
            out.push_str(&format!(
                "<a name=\"{a}\"></a><h{d} id=\"{a}\">{n}</h{d}>\n",
                a = attr(&anchor),
                d = depth,
                n = text(name)
            ));
        }

        if !entry.description.trim().is_empty() {
            let doc = self.options.description(entry);
            render_document(out, &doc, depth);
        }

        let snippet = excerpt(&entry.source, self.options.source_lines);
        if !snippet.is_empty() {
            out.push_str(&format!("<pre>{}</pre>\n", text(&snippet)));
        }

        self.attributes(out, entry, depth);
    }

    fn attributes(&self, out: &mut String, entry: &DocEntry, depth: u8) {
        let attrs = &entry.attributes;
        let mut dl = String::new();

        for name in ATTRIBUTE_ORDER {
            let mut dd = String::new();
            match *name {
                "param" if !attrs.params.is_empty() => {
                    dd.push_str("<table width=\"100%\"><thead><tr>\n");
                    dd.push_str("<th>Name</th><th>Type</th><th>Description</th>\n");
                    dd.push_str("</tr></thead><tbody>\n");
                    for p in &attrs.params {
                        dd.push_str(&format!(
                            "<tr><td>{}</td><td>{}</td><td>",
                            text(&p.name),
                            text(&p.ty)
                        ));
                        self.markup(&mut dd, &p.text, depth);
                        dd.push_str("</td></tr>\n");
                    }
                    dd.push_str("</tbody></table>\n");
                }
                "return" | "throws" => {
                    let list = if *name == "return" {
                        &attrs.returns
                    } else {
                        &attrs.throws
                    };
                    if list.is_empty() {
                        continue;
                    }
                    dd.push_str("<table width=\"100%\"><thead><tr>\n");
                    dd.push_str("<th>Type</th><th>Description</th>\n");
                    dd.push_str("</tr></thead><tbody>\n");
                    for r in list {
                        dd.push_str(&format!("<tr><td>{}</td><td>", text(&r.ty)));
                        self.markup(&mut dd, &r.text, depth);
                        dd.push_str("</td></tr>\n");
                    }
                    dd.push_str("</tbody></table>\n");
                }
                "deprecated" if attrs.tag("deprecated").is_some() => dd.push_str("Yes"),
                "param" | "deprecated" => continue,
                tag => match attrs.tag(tag) {
                    Some(value) => self.markup(&mut dd, value, depth),
                    None => continue,
                },
            }
            if !dd.is_empty() {
                dl.push_str(&format!("<dt>{}</dt>\n<dd>{}</dd>\n", text(*name), dd));
            }
        }

        if !dl.is_empty() {
            out.push_str("<dl>\n");
            out.push_str(&dl);
            out.push_str("</dl>\n");
        }
    }

    fn markup(&self, out: &mut String, value: &str, depth: u8) {
        let doc = self.options.formatter.format(&crate::render::unindent(value));
        render_document(out, &doc, depth);
    }
}

impl Format for HtmlFormat {
    fn file_extension(&self) -> &str {
        "html"
    }

    fn page(&self, page: &Page) -> Result<String> {
        let mut out = String::new();
        self.header(&mut out, &format!("{} -- {}", self.options.title, page.title));

        let mut current: Option<DocType> = None;
        let mut depth = SCOPE_DEPTH;
        for entry in &page.entries {
            if current != Some(entry.doc_type) {
                current = Some(entry.doc_type);
                let level = entry.doc_type.page_depth();
                out.push_str(&format!(
                    "<h{l}>{}</h{l}>\n",
                    text(entry.doc_type.title()),
                    l = level
                ));
                depth = level + 1;
            }
            self.entry(&mut out, entry, depth);
        }

        self.footer(&mut out);
        Ok(out)
    }

    fn index(&self, index: &Index) -> Result<String> {
        let mut out = String::new();
        self.header(&mut out, &format!("{} -- index", self.options.title));
        out.push_str("<h1>Index</h1>\n");

        for section in &index.sections {
            out.push_str(&format!("<h2>{}</h2>\n", text(&section.title)));
            for group in &section.groups {
                if group.pages.is_empty() {
                    continue;
                }
                out.push_str(&format!("<h3>{}</h3>\n", text(&group.title)));
                let mut tree = Node::default();
                for page in &group.pages {
                    tree.insert(page);
                }
                tree.render(&mut out, self.file_extension());
            }
        }

        self.footer(&mut out);
        Ok(out)
    }
}

/// Directory tree of the pages listed under one index heading.
#[derive(Default)]
struct Node<'a> {
    pages: Vec<&'a PageRef>,
    children: BTreeMap<&'a str, Node<'a>>,
}

impl<'a> Node<'a> {
    fn insert(&mut self, page: &'a PageRef) {
        let mut node = self;
        for component in page.components() {
            node = node.children.entry(component).or_default();
        }
        node.pages.push(page);
    }

    fn render(&self, out: &mut String, ext: &str) {
        out.push_str("<ul>\n");
        for page in &self.pages {
            out.push_str(&format!(
                "<li><a href=\"content/{}.{}\" title=\"{}\">{}</a></li>\n",
                attr(&page.name),
                ext,
                attr(&page.title),
                text(&page.label)
            ));
        }
        for (name, child) in &self.children {
            out.push_str(&format!("<li>{}\n", text(*name)));
            child.render(out, ext);
            out.push_str("</li>\n");
        }
        out.push_str("</ul>\n");
    }
}

// -- Markup ----------------------------------------------------------------

/// Render a formatted description. Its headings are placed below `depth`.
pub fn render_document(out: &mut String, doc: &Document, depth: u8) {
    for block in &doc.children {
        render_block(out, block, depth);
    }
}

fn render_block(out: &mut String, block: &Block, depth: u8) {
    match block {
        Block::Heading {
            level,
            anchor,
            content,
        } => {
            let l = (depth + level).min(6);
            out.push_str(&format!("<h{l} id=\"{}\">", attr(anchor)));
            render_inlines(out, content);
            out.push_str(&format!("</h{l}>\n"));
        }
        Block::Paragraph { content } => {
            out.push_str("<p>");
            render_inlines(out, content);
            out.push_str("</p>\n");
        }
        Block::List { ordered, items } => {
            let tag = if *ordered { "ol" } else { "ul" };
            out.push_str(&format!("<{tag}>\n"));
            for item in items {
                render_block(out, item, depth);
            }
            out.push_str(&format!("</{tag}>\n"));
        }
        Block::ListItem { children } => {
            out.push_str("<li>");
            match children.as_slice() {
                [Block::Paragraph { content }] => render_inlines(out, content),
                _ => {
                    out.push('\n');
                    for child in children {
                        render_block(out, child, depth);
                    }
                }
            }
            out.push_str("</li>\n");
        }
        Block::Blockquote { children, .. } => {
            out.push_str("<blockquote>\n");
            for child in children {
                render_block(out, child, depth);
            }
            out.push_str("</blockquote>\n");
        }
        Block::Rule => out.push_str("<hr />\n"),
        Block::Plugin {
            name,
            params,
            children,
        } => {
            out.push_str(&format!(
                "<div class=\"plugin plugin-{}\" data-params=\"{}\">\n",
                attr(name),
                attr(&params.join(","))
            ));
            for child in children {
                render_block(out, child, depth);
            }
            out.push_str("</div>\n");
        }
        Block::Table(table) => render_table(out, table, depth),
        Block::Raw { text: raw } => {
            out.push_str(&format!("<pre>{}</pre>\n", text(raw)));
        }
    }
}

fn render_table(out: &mut String, table: &Table, depth: u8) {
    out.push_str("<table>\n");
    if !table.head.is_empty() {
        out.push_str("<thead>\n");
        render_rows(out, &table.head, depth);
        out.push_str("</thead>\n");
    }
    if !table.body.is_empty() {
        out.push_str("<tbody>\n");
        render_rows(out, &table.body, depth);
        out.push_str("</tbody>\n");
    }
    out.push_str("</table>\n");
}

fn render_rows(out: &mut String, rows: &[Row], depth: u8) {
    for row in rows {
        out.push_str("<tr>");
        for cell in &row.cells {
            render_cell(out, cell, depth);
        }
        out.push_str("</tr>\n");
    }
}

fn render_cell(out: &mut String, cell: &Cell, depth: u8) {
    let tag = if cell.header { "th" } else { "td" };
    out.push_str(&format!("<{tag} width=\"{}%\"", cell.width));
    if cell.colspan > 1 {
        out.push_str(&format!(" colspan=\"{}\"", cell.colspan));
    }
    out.push('>');
    match cell.children.as_slice() {
        [Block::Paragraph { content }] => render_inlines(out, content),
        children => {
            for child in children {
                render_block(out, child, depth);
            }
        }
    }
    out.push_str(&format!("</{tag}>"));
}

fn render_inlines(out: &mut String, inlines: &[Inline]) {
    for inline in inlines {
        render_inline(out, inline);
    }
}

fn render_inline(out: &mut String, inline: &Inline) {
    let wrap = |out: &mut String, tag: &str, children: &[Inline]| {
        out.push_str(&format!("<{tag}>"));
        render_inlines(out, children);
        out.push_str(&format!("</{tag}>"));
    };
    match inline {
        Inline::Text { text: t } => out.push_str(&text(t)),
        Inline::Bold { children } => wrap(out, "strong", children),
        Inline::Italic { children } => wrap(out, "em", children),
        Inline::Underline { children } => wrap(out, "u", children),
        Inline::Strikethrough { children } => wrap(out, "del", children),
        Inline::Code { children } => wrap(out, "code", children),
        Inline::Link { href, text: label } if href.starts_with("mailto:") => {
            out.push_str(&format!("&lt;<a href=\"{}\">{}</a>&gt;", attr(href), text(label)));
        }
        Inline::Link { href, text: label } => {
            out.push_str(&format!(
                "<a target=\"_blank\" href=\"{}\">{}</a>",
                attr(href),
                text(label)
            ));
        }
        Inline::Entity { name } => {
            out.push_str(&format!("&{name};"));
        }
    }
}
