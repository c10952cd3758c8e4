//! Line-by-line docblock state machine.
//!
//! A block opens on a dialect's start marker and closes on its end marker
//! or at end of input. While open, doc lines feed the description and the
//! `@tag` attributes until the source-start marker switches the block into
//! snippet mode, where raw lines are captured verbatim.

use super::dialect::{self, Dialect};
use crate::model::*;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, warn};

// -- Regex patterns -----------------------------------------------------------

static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*@([a-z]+)").unwrap());

static RE_OCTDOC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([a-z]):(.*)$").unwrap());

static RE_FIELDS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

// -- Parser state -------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Doc,
    Source,
}

/// Where non-tag doc lines go after a tag line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Continuation {
    Param(usize),
    Return(usize),
    Throws(usize),
    Tag(usize),
}

struct OpenBlock {
    dialect: &'static Dialect,
    mode: Mode,
    continuation: Option<Continuation>,
    entry: DocEntry,
}

struct ParserState<'a> {
    file: &'a Path,
    line_no: usize,
    open: Option<OpenBlock>,
    entries: Vec<DocEntry>,
}

// -- Public API ---------------------------------------------------------------

/// Extract the docblocks of one file's text.
///
/// `file` is only recorded in the entries and used for log context.
/// Entries come back sorted by type rank, then scope.
pub fn parse(input: &str, file: &Path) -> Vec<DocEntry> {
    parse_lines(input.lines(), file)
}

/// Extract docblocks from an iterator of raw lines.
pub fn parse_lines<'l, I>(lines: I, file: &Path) -> Vec<DocEntry>
where
    I: IntoIterator<Item = &'l str>,
{
    let mut state = ParserState {
        file,
        line_no: 0,
        open: None,
        entries: Vec::new(),
    };

    for raw in lines {
        state.line_no += 1;
        process_line(&mut state, raw);
    }

    // End of input closes a still-open block like an end marker would.
    close_block(&mut state);

    let mut entries = state.entries;
    sort_entries(&mut entries);
    entries
}

/// Stable sort by (type rank, scope).
pub fn sort_entries(entries: &mut [DocEntry]) {
    entries.sort_by(|a, b| {
        a.doc_type
            .sort_rank()
            .cmp(&b.doc_type.sort_rank())
            .then_with(|| a.scope.cmp(&b.scope))
    });
}

// -- Line processing ----------------------------------------------------------

fn process_line(s: &mut ParserState, raw: &str) {
    let raw = raw.trim_end();
    let row = raw.trim_start();

    if s.open.is_none() {
        if let Some(dialect) = dialect::detect(row) {
            debug!(file = %s.file.display(), line = s.line_no, dialect = dialect.key, "docblock opened");
            s.open = Some(OpenBlock {
                dialect,
                mode: Mode::Doc,
                continuation: None,
                entry: DocEntry {
                    file: PathBuf::from(s.file),
                    line: s.line_no,
                    ..Default::default()
                },
            });
        }
        return;
    }
    let Some(block) = s.open.as_mut() else {
        return;
    };

    if block.dialect.end.is_match(row) {
        close_block(s);
        return;
    }

    match block.mode {
        Mode::Source => {
            push_line(&mut block.entry.source, raw);
        }
        Mode::Doc if block.dialect.source_start.is_match(row) => {
            block.mode = Mode::Source;
            block.continuation = None;
            if block.dialect.retain_source_start {
                push_line(&mut block.entry.source, raw);
            }
        }
        Mode::Doc => {
            if let Some(m) = block.dialect.doc.find(row) {
                let text = &row[m.end()..];
                process_doc_line(block, text, s.file, s.line_no);
            }
        }
    }
}

/// Handle the remainder of a doc line after its dialect prefix.
fn process_doc_line(block: &mut OpenBlock, text: &str, file: &Path, line_no: usize) {
    let Some(caps) = RE_TAG.captures(text) else {
        append_continuation(block, text);
        return;
    };

    let tag = caps[1].to_string();
    let rest = text[caps[0].len()..].trim();
    let entry = &mut block.entry;
    block.continuation = None;

    match tag.as_str() {
        "octdoc" => match RE_OCTDOC.captures(rest) {
            Some(caps) => {
                let letter = caps[1].chars().next().unwrap_or('h');
                entry.doc_type = DocType::from_letter(letter);
                entry.scope = caps[2].trim().to_string();
                if !entry.doc_type.is_known() {
                    warn!(
                        file = %file.display(),
                        line = line_no,
                        "unknown docblock type '{}' for scope '{}'",
                        letter,
                        entry.scope
                    );
                }
            }
            None => {
                warn!(file = %file.display(), line = line_no, "unable to parse @octdoc '{}'", rest);
            }
        },
        "param" => match split_fields::<3>(rest) {
            Some([ty, name, text]) => {
                entry.attributes.params.push(Param { name, ty, text });
                block.continuation = Some(Continuation::Param(entry.attributes.params.len() - 1));
            }
            None => {
                warn!(file = %file.display(), line = line_no, "unable to parse @param '{}'", rest);
            }
        },
        "return" | "throws" => match split_fields::<2>(rest) {
            Some([ty, text]) => {
                let record = TypedText { ty, text };
                if tag == "return" {
                    entry.attributes.returns.push(record);
                    block.continuation =
                        Some(Continuation::Return(entry.attributes.returns.len() - 1));
                } else {
                    entry.attributes.throws.push(record);
                    block.continuation =
                        Some(Continuation::Throws(entry.attributes.throws.len() - 1));
                }
            }
            None => {
                warn!(file = %file.display(), line = line_no, "unable to parse @{} '{}'", tag, rest);
            }
        },
        _ => {
            let idx = entry.attributes.set_tag(&tag, format!("{}\n", rest));
            block.continuation = Some(Continuation::Tag(idx));
        }
    }
}

/// Append a non-tag doc line to the active tag, or to the description.
fn append_continuation(block: &mut OpenBlock, text: &str) {
    let attrs = &mut block.entry.attributes;
    match block.continuation {
        Some(Continuation::Param(i)) => join_line(&mut attrs.params[i].text, text),
        Some(Continuation::Return(i)) => join_line(&mut attrs.returns[i].text, text),
        Some(Continuation::Throws(i)) => join_line(&mut attrs.throws[i].text, text),
        Some(Continuation::Tag(i)) => push_line(&mut attrs.tags[i].value, text),
        None => push_line(&mut block.entry.description, text),
    }
}

/// Commit the open block if it carries a scope, and return to closed state.
fn close_block(s: &mut ParserState) {
    let Some(block) = s.open.take() else {
        return;
    };
    if block.entry.scope.is_empty() {
        debug!(
            file = %s.file.display(),
            line = block.entry.line,
            "docblock without @octdoc scope dropped"
        );
        return;
    }
    s.entries.push(block.entry);
}

// -- Helper functions ---------------------------------------------------------

/// Split `text` on runs of whitespace into exactly `N` fields, the last one
/// keeping the remainder. `None` when there are fewer than `N` fields.
fn split_fields<const N: usize>(text: &str) -> Option<[String; N]> {
    let parts: Vec<String> = RE_FIELDS
        .splitn(text, N)
        .map(|p| p.to_string())
        .collect();
    parts.try_into().ok()
}

fn push_line(dest: &mut String, line: &str) {
    dest.push_str(line);
    dest.push('\n');
}

/// Join with a newline separator.
fn join_line(dest: &mut String, line: &str) {
    dest.push('\n');
    dest.push_str(line);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_str(input: &str) -> Vec<DocEntry> {
        parse(input, Path::new("test.php"))
    }

    const PHP_CLASS: &str = r#"<?php
    /**
     * Create documentation for a project.
     *
     * @octdoc      c:octdoc/doc
     * @author      Harald Lapp
     */
    class doc
    /**/
    {
        /**
         * Parse a file.
         *
         * @octdoc  m:doc/parse
         * @param   string      $file       File to parse.
         *                                  Must be readable.
         * @return  bool|array              Parsed documentation.
         */
        protected function parse($file)
        /**/
        {
        }
    }
"#;

    #[test]
    fn parse_class_and_method() {
        let entries = parse_str(PHP_CLASS);
        assert_eq!(entries.len(), 2);

        let class = &entries[0];
        assert_eq!(class.doc_type, DocType::Class);
        assert_eq!(class.scope, "octdoc/doc");
        assert_eq!(class.line, 2);
        assert_eq!(class.description, " Create documentation for a project.\n\n");
        assert_eq!(class.attributes.tag("author"), Some("Harald Lapp\n"));
        assert_eq!(class.source, "    class doc\n");

        let method = &entries[1];
        assert_eq!(method.doc_type, DocType::Method);
        assert_eq!(method.name(), "parse");
        assert_eq!(
            method.attributes.params,
            vec![Param {
                name: "$file".into(),
                ty: "string".into(),
                text: "File to parse.\n                                  Must be readable.".into(),
            }]
        );
        assert_eq!(method.attributes.returns[0].ty, "bool|array");
        assert_eq!(method.attributes.returns[0].text, "Parsed documentation.");
        assert_eq!(method.source, "        protected function parse($file)\n");
    }

    #[test]
    fn no_blocks_yields_nothing() {
        assert!(parse_str("<?php\necho 'hello';\n// comment\n").is_empty());
        assert!(parse_str("").is_empty());
    }

    #[test]
    fn block_without_scope_is_dropped() {
        let input = "/**\n * Just text.\n * @author me\n */\nfoo();\n/**/\n";
        assert!(parse_str(input).is_empty());
    }

    #[test]
    fn eof_closes_like_end_marker() {
        let closed = parse_str("#**\n# Text.\n# @octdoc f:lib/run\nrun() {\n#**\n");
        let unclosed = parse_str("#**\n# Text.\n# @octdoc f:lib/run\nrun() {\n");
        assert_eq!(closed, unclosed);
        assert_eq!(closed[0].source, "run() {\n");
    }

    #[test]
    fn retained_source_start_line_leads_snippet() {
        let entries = parse_str("%**\n% @octdoc f:mod/start\nstart() ->\n    ok.\n%**\n");
        assert_eq!(entries[0].source, "start() ->\n    ok.\n");
    }

    #[test]
    fn dropped_source_start_line_is_not_in_snippet() {
        let entries = parse_str("/**\n * @octdoc f:lib/x\n */\nfunction x() {}\n/**/\n");
        assert_eq!(entries[0].source, "function x() {}\n");
    }

    #[test]
    fn dash_dialect() {
        let input = "--**\n-- Count users.\n-- @octdoc f:sql/count\nselect count(*) from users;\n--**\n";
        let entries = parse_str(input);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].description, " Count users.\n");
        assert_eq!(entries[0].source, "select count(*) from users;\n");
    }

    #[test]
    fn malformed_param_is_skipped() {
        let input = "/**\n * @octdoc f:lib/x\n * @param string\n * trailing text\n */\n/**/\n";
        let entries = parse_str(input);
        assert!(entries[0].attributes.params.is_empty());
        // No active tag after a malformed one: text goes to the description.
        assert_eq!(entries[0].description, " trailing text\n");
    }

    #[test]
    fn tab_separated_fields() {
        let input = "/**\n * @octdoc m:a/b\n * @param\tstring\t$x\tThe x.\n *\t@return\tint\tCount.\n */\n/**/\n";
        let entries = parse_str(input);
        let attrs = &entries[0].attributes;
        assert_eq!(
            attrs.params,
            vec![Param {
                name: "$x".into(),
                ty: "string".into(),
                text: "The x.".into(),
            }]
        );
        assert_eq!(attrs.returns[0].ty, "int");
        assert_eq!(attrs.returns[0].text, "Count.");
        assert_eq!(entries[0].description, "");
    }

    #[test]
    fn multiple_returns_and_throws() {
        let input = "/**\n * @octdoc m:a/b\n * @return int Count.\n * @return null Nothing.\n * @throws \\Exception On error.\n *         Really.\n */\n/**/\n";
        let entries = parse_str(input);
        let attrs = &entries[0].attributes;
        assert_eq!(attrs.returns.len(), 2);
        assert_eq!(attrs.returns[1].ty, "null");
        assert_eq!(attrs.throws[0].ty, "\\Exception");
        assert_eq!(attrs.throws[0].text, "On error.\n         Really.");
    }

    #[test]
    fn generic_tag_continuation() {
        let input = "/**\n * @octdoc h:lib/x\n * @copyright 2012\n *   by someone\n */\n/**/\n";
        let entries = parse_str(input);
        assert_eq!(entries[0].attributes.tag("copyright"), Some("2012\n   by someone\n"));
    }

    #[test]
    fn repeated_generic_tag_replaces_value() {
        let input = "/**\n * @octdoc h:lib/x\n * @author a\n * @author b\n */\n/**/\n";
        let entries = parse_str(input);
        assert_eq!(entries[0].attributes.tags.len(), 1);
        assert_eq!(entries[0].attributes.tag("author"), Some("b\n"));
    }

    #[test]
    fn unknown_type_is_kept() {
        let entries = parse_str("/**\n * @octdoc a:output/addFile\n */\n/**/\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].doc_type, DocType::Other('a'));
    }

    #[test]
    fn entries_sorted_by_type_then_scope() {
        let input = "\
/**\n * @octdoc m:x/b\n */\n/**/\n\
/**\n * @octdoc m:x/a\n */\n/**/\n\
/**\n * @octdoc c:x\n */\n/**/\n\
/**\n * @octdoc p:x/$p\n */\n/**/\n\
/**\n * @octdoc h:x\n */\n/**/\n";
        let scopes: Vec<(DocType, String)> = parse_str(input)
            .into_iter()
            .map(|e| (e.doc_type, e.scope))
            .collect();
        assert_eq!(
            scopes,
            vec![
                (DocType::Header, "x".to_string()),
                (DocType::Class, "x".to_string()),
                (DocType::Property, "x/$p".to_string()),
                (DocType::Method, "x/a".to_string()),
                (DocType::Method, "x/b".to_string()),
            ]
        );
    }

    #[test]
    fn sort_is_stable_for_ties() {
        let mut entries = vec![
            DocEntry { scope: "s".into(), line: 1, doc_type: DocType::Method, ..Default::default() },
            DocEntry { scope: "s".into(), line: 2, doc_type: DocType::Method, ..Default::default() },
            DocEntry { scope: "a".into(), line: 3, doc_type: DocType::Method, ..Default::default() },
        ];
        sort_entries(&mut entries);
        let lines: Vec<usize> = entries.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 1, 2]);
    }

    #[test]
    fn start_line_recorded() {
        let entries = parse_str("\n\n#**\n# @octdoc h:make/all\n#**\n");
        assert_eq!(entries[0].line, 3);
    }
}
