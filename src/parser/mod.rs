//! Docblock extraction from source files.

pub mod dialect;
pub mod docblock;

pub use docblock::{parse, parse_lines, sort_entries};

use crate::error::{Error, Result};
use crate::model::DocEntry;
use std::fs;
use std::path::Path;

/// Read a source file and extract its docblocks.
///
/// Invalid UTF-8 is replaced rather than rejected. An unreadable file is an
/// error for the caller to log and skip.
pub fn parse_file(path: &Path) -> Result<Vec<DocEntry>> {
    let bytes = fs::read(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8_lossy(&bytes);
    Ok(docblock::parse(&content, path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_file_reads_from_disk() {
        let mut file = NamedTempFile::with_suffix(".php").unwrap();
        file.write_all(b"<?php\n/**\n * @octdoc c:lib/a\n */\nclass a {}\n/**/\n")
            .unwrap();
        let entries = parse_file(file.path()).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file, file.path());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = parse_file(Path::new("/nonexistent/octdoc/file.php")).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
