//! Inline markup: emphasis delimiters, bare URIs and dash entities.

use super::{Inline, MAX_DEPTH};
use regex::Regex;
use std::sync::LazyLock;

static RE_URI: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:https?|ftps?|sftp|file)://[^\s<>]+|mailto:[^\s<>]+").unwrap()
});

static RE_ENTITY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"&(mdash|ndash);").unwrap());

const DELIMITERS: [char; 5] = ['*', '~', '_', '-', '@'];

/// Characters allowed right after a closing delimiter besides whitespace.
const TRAILING_PUNCT: [char; 8] = ['.', ',', ';', ':', '!', '?', ')', '\''];

/// One recognized inline construct in the scanned text.
struct Match {
    start: usize,
    end: usize,
    node: Inline,
}

/// Format one line of text.
pub(crate) fn format(text: &str) -> Vec<Inline> {
    let text = rewrite_dashes(text);
    let mut out = Vec::new();
    scan(&text, 0, &mut out);
    out
}

/// ` -- ` becomes an en dash; `--` squeezed between two words an em dash.
/// Anything else (`---`, `--flag`) is left alone.
fn rewrite_dashes(text: &str) -> String {
    let spaced = text.replace(" -- ", " &ndash; ");
    let chars: Vec<char> = spaced.chars().collect();
    let is_word = |c: Option<&char>| c.is_some_and(|c| !c.is_whitespace() && *c != '-');

    let mut out = String::with_capacity(spaced.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '-'
            && chars.get(i + 1) == Some(&'-')
            && i > 0
            && is_word(chars.get(i - 1))
            && is_word(chars.get(i + 2))
        {
            out.push_str("&mdash;");
            i += 2;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn scan(text: &str, depth: usize, out: &mut Vec<Inline>) {
    if depth > MAX_DEPTH {
        push_text(out, text);
        return;
    }

    let mut pos = 0;
    while let Some(m) = next_match(text, pos, depth) {
        push_text(out, &text[pos..m.start]);
        out.push(m.node);
        pos = m.end;
    }
    push_text(out, &text[pos..]);
}

fn push_text(out: &mut Vec<Inline>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Inline::Text { text: last }) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(Inline::text(text));
    }
}

/// Earliest construct at or after `from`. On equal starts a delimiter wins
/// over a URI, and a URI over an entity.
fn next_match(text: &str, from: usize, depth: usize) -> Option<Match> {
    let candidates = [
        find_delimited(text, from, depth),
        find_uri(text, from),
        find_entity(text, from),
    ];
    candidates
        .into_iter()
        .flatten()
        .reduce(|best, m| if m.start < best.start { m } else { best })
}

fn find_delimited(text: &str, from: usize, depth: usize) -> Option<Match> {
    for (i, c) in text[from..].char_indices() {
        let i = from + i;
        if !DELIMITERS.contains(&c) || !opens(text, i, c) {
            continue;
        }
        let inner_start = i + c.len_utf8();
        if let Some(close) = find_closer(text, inner_start, c) {
            let mut children = Vec::new();
            scan(&text[inner_start..close], depth + 1, &mut children);
            return Some(Match {
                start: i,
                end: close + c.len_utf8(),
                node: wrap(c, children),
            });
        }
    }
    None
}

/// Opening delimiter: preceded by whitespace, `(` or the start of text, and
/// followed by a non-space that is not the delimiter again.
fn opens(text: &str, at: usize, delim: char) -> bool {
    let before = text[..at].chars().next_back();
    let after = text[at + delim.len_utf8()..].chars().next();
    let outside_ok = before.map_or(true, |b| b.is_whitespace() || b == '(');
    let inside_ok = after.is_some_and(|a| !a.is_whitespace() && a != delim);
    outside_ok && inside_ok
}

/// First closing delimiter after `from`: preceded by a non-space and
/// followed by whitespace, punctuation or the end of text.
fn find_closer(text: &str, from: usize, delim: char) -> Option<usize> {
    for (j, c) in text[from..].char_indices() {
        let j = from + j;
        if c != delim || j == from {
            continue;
        }
        let before = text[..j].chars().next_back();
        let after = text[j + delim.len_utf8()..].chars().next();
        let inside_ok = before.is_some_and(|b| !b.is_whitespace());
        let outside_ok =
            after.map_or(true, |a| a.is_whitespace() || TRAILING_PUNCT.contains(&a));
        if inside_ok && outside_ok {
            return Some(j);
        }
    }
    None
}

fn wrap(delim: char, children: Vec<Inline>) -> Inline {
    match delim {
        '*' => Inline::Bold { children },
        '~' => Inline::Italic { children },
        '_' => Inline::Underline { children },
        '-' => Inline::Strikethrough { children },
        _ => Inline::Code { children },
    }
}

fn find_uri(text: &str, from: usize) -> Option<Match> {
    for m in RE_URI.find_iter(&text[from..]) {
        let start = from + m.start();
        let before = text[..start].chars().next_back();
        if !before.map_or(true, |b| b.is_whitespace() || b == '(' || b == '<') {
            continue;
        }
        let href = trim_uri(m.as_str());
        let text = href.strip_prefix("mailto:").unwrap_or(href).to_string();
        return Some(Match {
            start,
            end: start + href.len(),
            node: Inline::Link {
                href: href.to_string(),
                text,
            },
        });
    }
    None
}

/// Drop sentence punctuation glued to the end of a URI.
fn trim_uri(uri: &str) -> &str {
    let mut uri = uri.trim_end_matches(['.', ',', ';', ':', '!', '?', '\'', '"']);
    if uri.ends_with(')') && uri.matches('(').count() < uri.matches(')').count() {
        uri = &uri[..uri.len() - 1];
    }
    uri
}

fn find_entity(text: &str, from: usize) -> Option<Match> {
    let caps = RE_ENTITY.captures_at(text, from)?;
    let whole = caps.get(0)?;
    Some(Match {
        start: whole.start(),
        end: whole.end(),
        node: Inline::Entity {
            name: caps[1].to_string(),
        },
    })
}
