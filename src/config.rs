//! Run configuration: file selection patterns, formatting and output settings.

use crate::error::{Error, Result};
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Base names of files that are scanned for docblocks.
pub const DEFAULT_FILES: &[&str] = &[
    r".+\.erl$",
    r".+\.php$",
    r".+\.js$",
    r".+\.css$",
    r"^Makefile(|\..+)$",
];

/// Relative paths that are scanned.
pub const DEFAULT_INCLUDE: &[&str] = &["^/"];

/// Relative paths that are never scanned.
pub const DEFAULT_EXCLUDE: &[&str] = &[
    "/CVS/",
    r"/\.svn/",
    r"^/\.git/",
    "^/etc/",
    "^/data/",
    "^/tests?/",
    "^/tools/.*/app/",
    "^/tools/.*/data/",
    "^/tools/.*/libs/",
];

/// Removed from a file's base name to form its page scope.
pub const DEFAULT_STRIP: &[&str] = &[
    r"\.class\.php$",
    r"\.php$",
    r"\.js$",
    r"\.css$",
    r"\.erl$",
];

pub const DEFAULT_SOURCE_LINES: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Html,
    Json,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "html" => Ok(OutputFormat::Html),
            "json" => Ok(OutputFormat::Json),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Tar,
    Dir,
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tar" => Ok(Target::Tar),
            "dir" => Ok(Target::Dir),
            other => Err(Error::UnknownTarget(other.to_string())),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Target::Tar => "tar",
            Target::Dir => "dir",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub files: Vec<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub strip: Vec<String>,
    pub tab_width: usize,
    /// Snippet lines shown before the excerpt is cut.
    pub source_lines: usize,
    pub format: OutputFormat,
    pub target: Target,
    /// Free-form `name=value` properties; `title` names the documentation.
    pub properties: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        let owned = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            files: owned(DEFAULT_FILES),
            include: owned(DEFAULT_INCLUDE),
            exclude: owned(DEFAULT_EXCLUDE),
            strip: owned(DEFAULT_STRIP),
            tab_width: crate::markup::DEFAULT_TAB_WIDTH,
            source_lines: DEFAULT_SOURCE_LINES,
            format: OutputFormat::default(),
            target: Target::default(),
            properties: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn title(&self) -> &str {
        self.properties
            .get("title")
            .map(String::as_str)
            .unwrap_or("octdoc")
    }

    /// Compile the pattern lists.
    pub fn patterns(&self) -> Result<Patterns> {
        Ok(Patterns {
            files: combine(&self.files)?,
            include: combine(&self.include)?,
            exclude: combine(&self.exclude)?,
            strip: combine(&self.strip)?,
        })
    }
}

/// Compiled pattern lists. An empty list matches nothing.
#[derive(Debug, Clone)]
pub struct Patterns {
    files: Option<Regex>,
    include: Option<Regex>,
    exclude: Option<Regex>,
    strip: Option<Regex>,
}

impl Patterns {
    /// Whether a base name is a source file to scan.
    pub fn is_source_file(&self, name: &str) -> bool {
        matches(&self.files, name)
    }

    pub fn is_included(&self, path: &str) -> bool {
        matches(&self.include, path)
    }

    pub fn is_excluded(&self, path: &str) -> bool {
        matches(&self.exclude, path)
    }

    /// Base name with the configured extensions removed.
    pub fn strip<'a>(&self, name: &'a str) -> std::borrow::Cow<'a, str> {
        match &self.strip {
            Some(re) => re.replace_all(name, ""),
            None => std::borrow::Cow::Borrowed(name),
        }
    }
}

fn matches(re: &Option<Regex>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

/// Join patterns into one alternation, validating each on its own first so
/// the error names the offending pattern.
fn combine(patterns: &[String]) -> Result<Option<Regex>> {
    if patterns.is_empty() {
        return Ok(None);
    }
    for pattern in patterns {
        Regex::new(pattern).map_err(|source| Error::Pattern {
            pattern: pattern.clone(),
            source,
        })?;
    }
    let joined = patterns
        .iter()
        .map(|p| format!("(?:{p})"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&joined)
        .map(Some)
        .map_err(|source| Error::Pattern {
            pattern: joined,
            source,
        })
}

/// Parse a `name=value` property. A bare `name` sets the flag value `true`.
pub fn parse_property(s: &str) -> std::result::Result<(String, String), String> {
    let (name, value) = s.split_once('=').unwrap_or((s, "true"));
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("expected name=value or name, got '{s}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_patterns() {
        let p = Config::default().patterns().unwrap();
        assert!(p.is_source_file("doc.class.php"));
        assert!(p.is_source_file("app.js"));
        assert!(p.is_source_file("Makefile"));
        assert!(p.is_source_file("Makefile.linux"));
        assert!(!p.is_source_file("README.md"));
        assert!(!p.is_source_file(".php"));
    }

    #[test]
    fn default_excludes() {
        let p = Config::default().patterns().unwrap();
        assert!(p.is_excluded("/.git/config"));
        assert!(p.is_excluded("/tests/a.php"));
        assert!(p.is_excluded("/test/a.php"));
        assert!(p.is_excluded("/libs/CVS/a.php"));
        assert!(p.is_excluded("/tools/x/libs/a.php"));
        assert!(!p.is_excluded("/libs/doc.class.php"));
        assert!(!p.is_excluded("/tools/x/main.php"));
        assert!(p.is_included("/libs/doc.class.php"));
    }

    #[test]
    fn strip_removes_longest_extension() {
        let p = Config::default().patterns().unwrap();
        assert_eq!(p.strip("doc.class.php"), "doc");
        assert_eq!(p.strip("main.php"), "main");
        assert_eq!(p.strip("Makefile"), "Makefile");
    }

    #[test]
    fn empty_lists_match_nothing() {
        let config = Config {
            files: vec![],
            exclude: vec![],
            ..Config::default()
        };
        let p = config.patterns().unwrap();
        assert!(!p.is_source_file("a.php"));
        assert!(!p.is_excluded("/.git/x"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let config = Config {
            files: vec!["(unclosed".into()],
            ..Config::default()
        };
        let err = config.patterns().unwrap_err();
        assert!(matches!(err, Error::Pattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn format_and_target_names() {
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("dir".parse::<Target>().unwrap(), Target::Dir);
        assert!(matches!("pdf".parse::<OutputFormat>(), Err(Error::UnknownFormat(_))));
        assert!(matches!("zip".parse::<Target>(), Err(Error::UnknownTarget(_))));
    }

    #[test]
    fn properties() {
        assert_eq!(
            parse_property("title=My Docs"),
            Ok(("title".to_string(), "My Docs".to_string()))
        );
        assert_eq!(
            parse_property("a=b=c"),
            Ok(("a".to_string(), "b=c".to_string()))
        );
        assert_eq!(
            parse_property("draft"),
            Ok(("draft".to_string(), "true".to_string()))
        );
        assert!(parse_property("=x").is_err());
        assert!(parse_property("").is_err());
        assert_eq!(Config::default().title(), "octdoc");
    }
}
