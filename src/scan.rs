//! Source tree discovery.
//!
//! Walks the input directory in sorted order and keeps the files selected by
//! the configured patterns. Nothing is read at this stage.

use crate::config::Patterns;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A file selected for parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the scanned root, with a leading `/`.
    pub relative: String,
}

impl SourceFile {
    /// Directory part of the relative path, `""` for files at the root.
    pub fn dir(&self) -> &str {
        self.relative
            .rsplit_once('/')
            .map(|(dir, _)| dir)
            .unwrap_or("")
    }

    pub fn base_name(&self) -> &str {
        self.relative
            .rsplit_once('/')
            .map(|(_, name)| name)
            .unwrap_or(&self.relative)
    }
}

pub fn scan(root: &Path, patterns: &Patterns) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    let entries = read_sorted(root)?;
    walk(entries, "", patterns, &mut files);
    Ok(files)
}

fn walk(
    entries: Vec<(PathBuf, String, bool)>,
    prefix: &str,
    patterns: &Patterns,
    files: &mut Vec<SourceFile>,
) {
    for (path, name, is_dir) in entries {
        let relative = format!("{prefix}/{name}");
        if is_dir {
            // Excluded directories are pruned rather than walked and filtered.
            if patterns.is_excluded(&format!("{relative}/")) {
                tracing::debug!(dir = %relative, "skipping excluded directory");
                continue;
            }
            match read_sorted(&path) {
                Ok(children) => walk(children, &relative, patterns, files),
                Err(e) => tracing::warn!("{e}"),
            }
        } else if patterns.is_included(&relative)
            && !patterns.is_excluded(&relative)
            && patterns.is_source_file(&name)
        {
            files.push(SourceFile { path, relative });
        }
    }
}

/// Directory entries as `(path, name, is_dir)`, sorted by name.
fn read_sorted(dir: &Path) -> Result<Vec<(PathBuf, String, bool)>> {
    let read_err = |source| Error::Read {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries: Vec<_> = fs::read_dir(dir)
        .map_err(read_err)?
        .filter_map(std::result::Result::ok)
        .map(|e| {
            let is_dir = e.path().is_dir();
            let name = e.file_name().to_string_lossy().into_owned();
            (e.path(), name, is_dir)
        })
        .collect();
    entries.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn relatives(files: &[SourceFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative.as_str()).collect()
    }

    #[test]
    fn selects_and_sorts() {
        let tmp = TempDir::new().unwrap();
        for rel in [
            "libs/z.class.php",
            "libs/a.php",
            "libs/README.md",
            "tests/t.php",
            ".git/hooks/x.php",
            "Makefile",
            "libsjs/app.js",
        ] {
            touch(tmp.path(), rel);
        }
        let patterns = Config::default().patterns().unwrap();
        let files = scan(tmp.path(), &patterns).unwrap();
        assert_eq!(
            relatives(&files),
            vec!["/Makefile", "/libs/a.php", "/libs/z.class.php", "/libsjs/app.js"]
        );
        assert_eq!(files[1].dir(), "/libs");
        assert_eq!(files[1].base_name(), "a.php");
        assert_eq!(files[0].dir(), "");
    }

    #[test]
    fn missing_root_is_an_error() {
        let patterns = Config::default().patterns().unwrap();
        let err = scan(Path::new("/nonexistent/octdoc/root"), &patterns).unwrap_err();
        assert!(matches!(err, Error::Read { .. }));
    }
}
