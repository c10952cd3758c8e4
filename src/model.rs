//! Format-agnostic model of extracted documentation.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Kind of a documented item, taken from the letter in `@octdoc <letter>:<scope>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DocType {
    Class,
    Constant,
    Function,
    #[default]
    Header,
    Interface,
    License,
    Method,
    Property,
    Trait,
    Variable,
    /// Unrecognized letter, kept so the entry is not lost.
    Other(char),
}

impl DocType {
    /// Map a type letter. Unknown letters become [`DocType::Other`].
    pub fn from_letter(c: char) -> Self {
        match c {
            'c' => DocType::Class,
            'd' => DocType::Constant,
            'f' => DocType::Function,
            'h' => DocType::Header,
            'i' => DocType::Interface,
            'l' => DocType::License,
            'm' => DocType::Method,
            'p' => DocType::Property,
            't' => DocType::Trait,
            'v' => DocType::Variable,
            other => DocType::Other(other),
        }
    }

    pub fn letter(self) -> char {
        match self {
            DocType::Class => 'c',
            DocType::Constant => 'd',
            DocType::Function => 'f',
            DocType::Header => 'h',
            DocType::Interface => 'i',
            DocType::License => 'l',
            DocType::Method => 'm',
            DocType::Property => 'p',
            DocType::Trait => 't',
            DocType::Variable => 'v',
            DocType::Other(c) => c,
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, DocType::Other(_))
    }

    /// Position of the type when sorting the entries of one file.
    ///
    /// header < license < variable < function < class/interface/trait
    /// < constant < property < method < anything unrecognized.
    pub fn sort_rank(self) -> u8 {
        match self {
            DocType::Header => 0,
            DocType::License => 1,
            DocType::Variable => 2,
            DocType::Function => 3,
            DocType::Class | DocType::Interface | DocType::Trait => 4,
            DocType::Constant => 5,
            DocType::Property => 6,
            DocType::Method => 7,
            DocType::Other(_) => 8,
        }
    }

    /// Whether a file may start with an entry of this type.
    pub fn is_page_root(self) -> bool {
        matches!(
            self,
            DocType::Header | DocType::Class | DocType::Interface | DocType::Trait
        )
    }

    /// Human readable name used for headings.
    pub fn title(self) -> &'static str {
        match self {
            DocType::Class => "Class",
            DocType::Constant => "Constant",
            DocType::Function => "Function",
            DocType::Header => "Header",
            DocType::Interface => "Interface",
            DocType::License => "License",
            DocType::Method => "Method",
            DocType::Property => "Property",
            DocType::Trait => "Trait",
            DocType::Variable => "Variable",
            DocType::Other(_) => "Other",
        }
    }

    /// Heading level of the type heading on a content page.
    pub fn page_depth(self) -> u8 {
        match self {
            DocType::Constant | DocType::Property | DocType::Method => 3,
            _ => 1,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl Serialize for DocType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(self.letter())
    }
}

/// Parsed `@param` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    pub text: String,
}

/// Parsed `@return` or `@throws` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypedText {
    #[serde(rename = "type")]
    pub ty: String,
    pub text: String,
}

/// A free-form `@tag` and its accumulated (possibly multi-line) text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

/// Attributes collected from the `@tag` lines of one docblock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attributes {
    pub params: Vec<Param>,
    pub returns: Vec<TypedText>,
    pub throws: Vec<TypedText>,
    /// Every other tag, in the order it was first seen.
    pub tags: Vec<Tag>,
}

impl Attributes {
    /// Value of a free-form tag.
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value.as_str())
    }

    /// Set a free-form tag, replacing an earlier value. Returns its index.
    pub(crate) fn set_tag(&mut self, name: &str, value: String) -> usize {
        if let Some(idx) = self.tags.iter().position(|t| t.name == name) {
            self.tags[idx].value = value;
            idx
        } else {
            self.tags.push(Tag {
                name: name.to_string(),
                value,
            });
            self.tags.len() - 1
        }
    }
}

/// One documentation unit extracted from a docblock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocEntry {
    pub file: PathBuf,
    /// 1-based line of the block-open marker.
    pub line: usize,
    /// Slash-delimited logical path from the `@octdoc` tag.
    pub scope: String,
    #[serde(rename = "type")]
    pub doc_type: DocType,
    pub description: String,
    /// Raw source lines captured after the doc text.
    pub source: String,
    pub attributes: Attributes,
}

impl DocEntry {
    /// Last component of the scope, e.g. `exec` for `libs/doc/exec`.
    pub fn name(&self) -> &str {
        self.scope.rsplit('/').next().unwrap_or(&self.scope)
    }
}
