//! Grid tables.
//!
//! ```text
//! +--------+--------+
//! | Name   | Value  |
//! +========+========+
//! | spans both cols |
//! +--------+--------+
//! | multi  | b      |
//! | line   |        |
//! +--------+--------+
//! ```
//!
//! Column boundaries are the `+` positions of all fences. Data lines between
//! two fences make up one row; a fence containing `=` turns every row above
//! it into a header row.

use super::{Block, Cell, Formatter, Inline, Row, Table};
use regex::Regex;
use std::sync::LazyLock;

static RE_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+(?:[-=]+\+)+$").unwrap());

static RE_ROW: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\|.*\|$").unwrap());

pub(super) fn is_fence(line: &str) -> bool {
    RE_FENCE.is_match(line)
}

fn is_row(line: &str) -> bool {
    RE_ROW.is_match(line)
}

#[derive(Debug, Default)]
struct DraftCell {
    col: usize,
    colspan: usize,
    lines: Vec<String>,
}

#[derive(Debug, Default)]
struct DraftRow {
    header: bool,
    cells: Vec<DraftCell>,
}

impl DraftRow {
    /// Text at an already populated column continues that cell.
    fn add(&mut self, col: usize, colspan: usize, text: String) {
        match self.cells.binary_search_by_key(&col, |c| c.col) {
            Ok(i) => {
                let cell = &mut self.cells[i];
                cell.colspan = cell.colspan.max(colspan);
                cell.lines.push(text);
            }
            Err(i) => self.cells.insert(
                i,
                DraftCell {
                    col,
                    colspan,
                    lines: vec![text],
                },
            ),
        }
    }

    /// Stretch each cell over the unfilled columns up to its right neighbour.
    fn close_gaps(&mut self) {
        for i in 1..self.cells.len() {
            let next_col = self.cells[i].col;
            let cell = &mut self.cells[i - 1];
            cell.colspan = cell.colspan.max(next_col - cell.col);
        }
    }
}

/// Parse the table starting at the first line, which must be a fence.
///
/// Lines are consumed while they are fences or `|...|` rows; the number of
/// consumed lines is returned with the table. Lines are expected trimmed.
pub(super) fn parse<'a, I>(fmt: &Formatter, lines: I) -> (Table, usize)
where
    I: IntoIterator<Item = &'a str>,
{
    let lines: Vec<&str> = lines
        .into_iter()
        .take_while(|l| is_fence(l) || is_row(l))
        .collect();
    let consumed = lines.len();

    let mut boundaries: Vec<usize> = lines
        .iter()
        .filter(|l| is_fence(l))
        .flat_map(|l| {
            l.chars()
                .enumerate()
                .filter(|(_, c)| *c == '+')
                .map(|(i, _)| i)
        })
        .collect();
    boundaries.sort_unstable();
    boundaries.dedup();

    if boundaries.len() < 2 {
        return (Table::default(), consumed);
    }
    let widths = column_widths(&boundaries);

    let mut rows: Vec<DraftRow> = Vec::new();
    let mut current = DraftRow::default();
    for line in &lines {
        if is_fence(line) {
            finish_row(&mut rows, &mut current);
            if line.contains('=') {
                rows.iter_mut().for_each(|r| r.header = true);
            }
            continue;
        }
        for (col, colspan, text) in split_row(line, &boundaries) {
            current.add(col, colspan, text);
        }
    }
    finish_row(&mut rows, &mut current);

    let mut table = Table {
        widths,
        ..Table::default()
    };
    for draft in rows {
        let header = draft.header;
        let row = build_row(fmt, draft, &table.widths);
        if header {
            table.head.push(row);
        } else {
            table.body.push(row);
        }
    }
    (table, consumed)
}

fn column_widths(boundaries: &[usize]) -> Vec<u8> {
    let total = (boundaries[boundaries.len() - 1] - boundaries[0]) as f64;
    boundaries
        .windows(2)
        .map(|w| ((w[1] - w[0]) as f64 * 100.0 / total).round() as u8)
        .collect()
}

fn finish_row(rows: &mut Vec<DraftRow>, current: &mut DraftRow) {
    let mut row = std::mem::take(current);
    if row.cells.is_empty() {
        return;
    }
    row.close_gaps();
    rows.push(row);
}

/// Split a data line into `(column, colspan, text)` cells.
///
/// When the outer pipes sit on the outer boundaries, only pipes on a
/// boundary separate cells, so a cell may span columns and contain literal
/// pipes. Otherwise every pipe separates and cells fill columns in order.
fn split_row(line: &str, boundaries: &[usize]) -> Vec<(usize, usize, String)> {
    let chars: Vec<char> = line.chars().collect();
    let pipes: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == '|')
        .map(|(i, _)| i)
        .collect();
    let text = |from: usize, to: usize| -> String {
        chars[from + 1..to].iter().collect::<String>().trim().to_string()
    };

    let aligned = pipes.first() == boundaries.first() && pipes.last() == boundaries.last();
    if aligned {
        let seps: Vec<(usize, usize)> = pipes
            .iter()
            .filter_map(|p| boundaries.binary_search(p).ok().map(|b| (*p, b)))
            .collect();
        seps.windows(2)
            .map(|w| (w[0].1, w[1].1 - w[0].1, text(w[0].0, w[1].0)))
            .collect()
    } else {
        pipes
            .windows(2)
            .enumerate()
            .map(|(col, w)| (col, 1, text(w[0], w[1])))
            .collect()
    }
}

fn build_row(fmt: &Formatter, draft: DraftRow, widths: &[u8]) -> Row {
    let cells = draft
        .cells
        .into_iter()
        .map(|cell| {
            let width = widths
                .iter()
                .skip(cell.col)
                .take(cell.colspan)
                .map(|w| *w as u32)
                .sum::<u32>()
                .min(u8::MAX as u32) as u8;
            Cell {
                header: draft.header,
                colspan: cell.colspan,
                width,
                children: format_cell(fmt, &cell.lines),
            }
        })
        .collect();
    Row { cells }
}

fn format_cell(fmt: &Formatter, lines: &[String]) -> Vec<Block> {
    let text = lines.join("\n");
    let text = text.trim_matches('\n');
    if text.trim().is_empty() {
        return Vec::new();
    }
    match fmt.nested() {
        Some(inner) => inner.format(text).children,
        None => vec![Block::Paragraph {
            content: vec![Inline::text(text)],
        }],
    }
}
