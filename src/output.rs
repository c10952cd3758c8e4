//! Output sinks for rendered files.

use crate::config::Target;
use crate::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Destination of the rendered documentation.
pub trait Output {
    /// Store one file under a `/`-separated relative name.
    fn add_file(&mut self, name: &str, content: &[u8]) -> Result<()>;

    /// Flush everything; no file can be added afterwards.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Open the sink for a target. A tar archive without a destination is
/// streamed to stdout; a directory target needs a destination.
pub fn open(target: Target, dest: Option<&Path>) -> Result<Box<dyn Output>> {
    match (target, dest) {
        (Target::Dir, Some(dir)) => Ok(Box::new(DirOutput::new(dir)?)),
        (Target::Dir, None) => Err(Error::MissingOutput),
        (Target::Tar, Some(path)) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|source| write_err(parent, source))?;
            }
            let file = File::create(path).map_err(|source| write_err(path, source))?;
            Ok(Box::new(TarOutput::new(BufWriter::new(file))))
        }
        (Target::Tar, None) => Ok(Box::new(TarOutput::new(io::stdout()))),
    }
}

fn write_err(path: &Path, source: io::Error) -> Error {
    Error::Write {
        name: path.display().to_string(),
        source,
    }
}

/// Writes files below a directory, creating it and any subdirectories.
pub struct DirOutput {
    root: PathBuf,
}

impl DirOutput {
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root).map_err(|source| write_err(root, source))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }
}

impl Output for DirOutput {
    fn add_file(&mut self, name: &str, content: &[u8]) -> Result<()> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| write_err(parent, source))?;
        }
        fs::write(&path, content).map_err(|source| write_err(&path, source))?;
        tracing::debug!(file = %path.display(), "written");
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

/// Appends files to a ustar archive.
pub struct TarOutput<W: Write> {
    builder: tar::Builder<W>,
    mtime: u64,
}

impl<W: Write> TarOutput<W> {
    pub fn new(writer: W) -> Self {
        let mtime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Self {
            builder: tar::Builder::new(writer),
            mtime,
        }
    }
}

impl<W: Write> Output for TarOutput<W> {
    fn add_file(&mut self, name: &str, content: &[u8]) -> Result<()> {
        let mut header = tar::Header::new_ustar();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(self.mtime);
        self.builder
            .append_data(&mut header, name, content)
            .map_err(|source| Error::Write {
                name: name.to_string(),
                source,
            })?;
        tracing::debug!(file = name, "archived");
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<()> {
        let archive_err = |source| Error::Write {
            name: "archive".to_string(),
            source,
        };
        let mut writer = self.builder.into_inner().map_err(archive_err)?;
        writer.flush().map_err(archive_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    #[test]
    fn dir_output_creates_subdirectories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("out");
        let mut out = open(Target::Dir, Some(&root)).unwrap();
        out.add_file("index.html", b"<h1>Index</h1>").unwrap();
        out.add_file("content/libs_doc.html", b"doc").unwrap();
        out.finish().unwrap();
        assert_eq!(fs::read_to_string(root.join("content/libs_doc.html")).unwrap(), "doc");
        assert!(root.join("index.html").is_file());
    }

    #[test]
    fn dir_target_needs_destination() {
        assert!(matches!(open(Target::Dir, None), Err(Error::MissingOutput)));
    }

    #[test]
    fn tar_output_round_trips() {
        let mut out = TarOutput::new(Vec::new());
        out.add_file("index.html", b"index").unwrap();
        out.add_file("content/a.html", b"page a").unwrap();
        let bytes = out.builder.into_inner().unwrap();

        let mut archive = tar::Archive::new(bytes.as_slice());
        let mut seen = Vec::new();
        for entry in archive.entries().unwrap() {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().into_owned();
            let mut body = String::new();
            entry.read_to_string(&mut body).unwrap();
            seen.push((path, body));
        }
        assert_eq!(
            seen,
            vec![
                ("index.html".to_string(), "index".to_string()),
                ("content/a.html".to_string(), "page a".to_string()),
            ]
        );
    }

    #[test]
    fn tar_output_to_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/doc.tar");
        let mut out = open(Target::Tar, Some(&path)).unwrap();
        out.add_file("index.html", b"x").unwrap();
        out.finish().unwrap();
        assert!(fs::metadata(&path).unwrap().len() >= 1024);
    }
}
