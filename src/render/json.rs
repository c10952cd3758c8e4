//! JSON output for tooling integration.
//!
//! Pages are serialized with every entry's raw fields plus its formatted
//! description tree and snippet excerpt.

use crate::error::Result;
use crate::markup::Document;
use crate::model::{DocEntry, DocType};
use crate::organize::{Index, Page};
use crate::render::{excerpt, Format, RenderOptions};
use serde::Serialize;

pub struct JsonFormat {
    options: RenderOptions,
}

impl JsonFormat {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }
}

#[derive(Serialize)]
struct PageDoc<'a> {
    documentation: &'a str,
    scope: &'a str,
    name: &'a str,
    title: &'a str,
    #[serde(rename = "type")]
    doc_type: DocType,
    entries: Vec<EntryDoc<'a>>,
}

#[derive(Serialize)]
struct EntryDoc<'a> {
    #[serde(flatten)]
    entry: &'a DocEntry,
    formatted: Document,
    excerpt: String,
}

#[derive(Serialize)]
struct IndexDoc<'a> {
    documentation: &'a str,
    #[serde(flatten)]
    index: &'a Index,
}

impl Format for JsonFormat {
    fn file_extension(&self) -> &str {
        "json"
    }

    fn page(&self, page: &Page) -> Result<String> {
        let doc = PageDoc {
            documentation: &self.options.title,
            scope: &page.scope,
            name: &page.name,
            title: &page.title,
            doc_type: page.doc_type,
            entries: page
                .entries
                .iter()
                .map(|entry| EntryDoc {
                    entry,
                    formatted: self.options.description(entry),
                    excerpt: excerpt(&entry.source, self.options.source_lines),
                })
                .collect(),
        };
        Ok(serde_json::to_string_pretty(&doc)? + "\n")
    }

    fn index(&self, index: &Index) -> Result<String> {
        let doc = IndexDoc {
            documentation: &self.options.title,
            index,
        };
        Ok(serde_json::to_string_pretty(&doc)? + "\n")
    }
}
