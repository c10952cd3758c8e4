//! octdoc: extract `@octdoc` docblocks from a source tree and render them
//! as a browsable documentation bundle.
//!
//! The core is the docblock [`parser`] and the description [`markup`]
//! formatter. The rest wires them into a pipeline: [`scan`] a tree, parse
//! every selected file, [`organize`] the pages, [`render`] them and hand the
//! result to an [`output`] sink.

pub mod config;
pub mod error;
pub mod markup;
pub mod model;
pub mod organize;
pub mod output;
pub mod parser;
pub mod render;
pub mod scan;
pub mod toc;

pub use error::{Error, Result};

use config::Config;
use organize::Page;
use output::Output;
use std::path::Path;
use tracing::{info, warn};

/// Counts reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub files: usize,
    pub pages: usize,
    pub entries: usize,
}

/// Document the tree below `input` into `output`.
///
/// Unreadable files and files that cannot form a page are logged and
/// skipped. The output sink is finished by the caller.
pub fn generate(config: &Config, input: &Path, output: &mut dyn Output) -> Result<Summary> {
    if !input.is_dir() {
        return Err(Error::NotADirectory(input.to_path_buf()));
    }
    let patterns = config.patterns()?;
    let files = scan::scan(input, &patterns)?;
    info!(count = files.len(), root = %input.display(), "scanned source tree");

    let mut summary = Summary {
        files: files.len(),
        ..Summary::default()
    };
    let mut pages = Vec::new();
    for file in &files {
        let entries = match parser::parse_file(&file.path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("skipping {}: {}", file.relative, e);
                continue;
            }
        };
        if let Some(page) = Page::assemble(file, entries, &patterns) {
            summary.entries += page.entries.len();
            pages.push(page);
        }
    }
    summary.pages = pages.len();

    let format = render::create_format(config.format, render::RenderOptions::from_config(config));
    for page in &pages {
        let content = format.page(page)?;
        output.add_file(&format.page_path(page), content.as_bytes())?;
    }
    let index = organize::organize(&pages);
    output.add_file(&format.index_path(), format.index(&index)?.as_bytes())?;

    info!(
        pages = summary.pages,
        entries = summary.entries,
        "documentation written"
    );
    Ok(summary)
}
