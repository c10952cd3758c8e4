//! Page assembly and index organization.
//!
//! Every source file with docblocks becomes one [`Page`]. Pages are grouped
//! into sections by the first directory of their scope, then by the type of
//! their first entry.

use crate::config::Patterns;
use crate::model::{DocEntry, DocType};
use crate::scan::SourceFile;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Known sections in index order, with their titles.
const SECTIONS: &[(&str, &str)] = &[
    ("libs", "Libraries"),
    ("libsjs", "Javascript"),
    ("styles", "Stylesheets"),
    ("tools", "Tools"),
    ("src", "Sources"),
    ("includes", "Includes"),
];

const INDEX_TYPES: [DocType; 4] = [
    DocType::Header,
    DocType::Class,
    DocType::Trait,
    DocType::Interface,
];

/// Documentation of one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    /// Relative directory plus stripped base name, e.g. `/libs/doc`.
    pub scope: String,
    /// File name stem of the rendered page, e.g. `libs_doc`.
    pub name: String,
    /// Scope of the first entry.
    pub title: String,
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub entries: Vec<DocEntry>,
}

impl Page {
    /// Build the page of a parsed file.
    ///
    /// Returns `None` for files without docblocks and for files whose first
    /// entry cannot head a page.
    pub fn assemble(file: &SourceFile, entries: Vec<DocEntry>, patterns: &Patterns) -> Option<Page> {
        let first = entries.first()?;
        if !first.doc_type.is_page_root() {
            warn!(
                file = %file.path.display(),
                line = first.line,
                "first part in a file must be of type 'class', 'header', 'interface' or 'trait'"
            );
            return None;
        }

        let scope = format!("{}/{}", file.dir(), patterns.strip(file.base_name()));
        let name = scope.trim_start_matches('/').replace(['/', '.'], "_");
        Some(Page {
            title: first.scope.clone(),
            doc_type: first.doc_type,
            scope,
            name,
            entries,
        })
    }

    /// Index label: the page title without its first component.
    pub fn label(&self) -> &str {
        self.title
            .split_once('/')
            .map(|(_, rest)| rest)
            .unwrap_or(self.title.as_str())
    }
}

/// Organized table of contents of all pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Index {
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub key: String,
    pub title: String,
    pub groups: Vec<TypeGroup>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeGroup {
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub title: String,
    pub pages: Vec<PageRef>,
}

/// A page as listed in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRef {
    pub name: String,
    pub title: String,
    pub label: String,
    /// Directory below the section directory, `""` at the section root.
    pub path: String,
    pub sort_key: String,
}

impl PageRef {
    /// Directory components below the section.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|c| !c.is_empty())
    }
}

pub fn section_title(key: &str) -> String {
    if key.is_empty() {
        return "Misc".to_string();
    }
    if let Some((_, title)) = SECTIONS.iter().find(|(k, _)| *k == key) {
        return title.to_string();
    }
    let mut chars = key.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Known sections first in their fixed order, then the rest alphabetically.
fn section_rank(key: &str) -> (usize, &str) {
    let pos = SECTIONS
        .iter()
        .position(|(k, _)| *k == key)
        .unwrap_or(SECTIONS.len());
    (pos, key)
}

fn type_rank(t: DocType) -> (usize, u8, char) {
    let pos = INDEX_TYPES
        .iter()
        .position(|i| *i == t)
        .unwrap_or(INDEX_TYPES.len());
    (pos, t.sort_rank(), t.letter())
}

/// Group pages into sections and types, sorted for the index.
pub fn organize(pages: &[Page]) -> Index {
    let mut tree: BTreeMap<String, Vec<(DocType, PageRef)>> = BTreeMap::new();

    for page in pages {
        let (dir, base) = page.scope.rsplit_once('/').unwrap_or(("", page.scope.as_str()));
        let mut parts = dir.trim_start_matches('/').splitn(2, '/');
        let section = parts.next().unwrap_or("").to_string();
        let path = parts.next().unwrap_or("").to_string();
        let sort_key = if path.is_empty() {
            base.to_string()
        } else {
            format!("{path}/{base}")
        };

        tree.entry(section).or_default().push((
            page.doc_type,
            PageRef {
                name: page.name.clone(),
                title: page.title.clone(),
                label: page.label().to_string(),
                path,
                sort_key,
            },
        ));
    }

    let mut sections: Vec<Section> = tree
        .into_iter()
        .map(|(key, refs)| {
            let mut groups: Vec<TypeGroup> = Vec::new();
            for (doc_type, page) in refs {
                match groups.iter_mut().find(|g| g.doc_type == doc_type) {
                    Some(group) => group.pages.push(page),
                    None => groups.push(TypeGroup {
                        doc_type,
                        title: doc_type.title().to_string(),
                        pages: vec![page],
                    }),
                }
            }
            groups.sort_by_key(|g| type_rank(g.doc_type));
            for group in &mut groups {
                group.pages.sort_by(|a, b| a.sort_key.cmp(&b.sort_key));
            }
            Section {
                title: section_title(&key),
                key,
                groups,
            }
        })
        .collect();
    sections.sort_by(|a, b| section_rank(&a.key).cmp(&section_rank(&b.key)));

    Index { sections }
}
