//! octdoc: generate documentation from `@octdoc` docblocks.
//!
//! `octdoc -i src/ -o doc.tar` scans `src/`, renders every documented file
//! and writes the bundle as a tar archive (or to stdout without `-o`).

use anyhow::{Context, Result};
use clap::Parser;
use octdoc::config::{self, Config, OutputFormat, Target};
use octdoc::output;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "octdoc",
    version,
    about = "Generate documentation from @octdoc docblocks in a source tree"
)]
struct Cli {
    /// Source directory to scan
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Output file (tar) or directory (dir). A tar archive goes to stdout if omitted.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output format: html (default), json
    #[arg(short = 'f', long, default_value = "html")]
    format: String,

    /// Output target: tar (default), dir
    #[arg(short = 't', long, default_value = "tar")]
    target: String,

    /// Property as name=value (e.g. -p title=MyProject), or a bare name set to true. Repeatable.
    #[arg(short = 'p', long = "property", value_parser = config::parse_property)]
    properties: Vec<(String, String)>,

    /// Columns per indentation level in descriptions
    #[arg(long, default_value_t = octdoc::markup::DEFAULT_TAB_WIDTH)]
    tab_width: usize,

    /// Snippet lines shown per entry before the excerpt is cut
    #[arg(long, default_value_t = config::DEFAULT_SOURCE_LINES)]
    source_lines: usize,

    /// Base-name pattern of files to scan. Replaces the defaults; repeatable.
    #[arg(long = "files")]
    files: Vec<String>,

    /// Relative-path pattern of files to scan. Replaces the defaults; repeatable.
    #[arg(long)]
    include: Vec<String>,

    /// Relative-path pattern of files and directories to skip. Replaces the defaults; repeatable.
    #[arg(long)]
    exclude: Vec<String>,

    /// Pattern removed from base names to form page scopes. Replaces the defaults; repeatable.
    #[arg(long)]
    strip: Vec<String>,

    /// Log progress (info level) unless RUST_LOG is set
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = build_config(&cli)?;
    anyhow::ensure!(
        cli.input.is_dir(),
        "input is not a directory: {}",
        cli.input.display()
    );
    let mut out = output::open(config.target, cli.output.as_deref())
        .context("failed to open output")?;
    octdoc::generate(&config, &cli.input, out.as_mut())
        .with_context(|| format!("failed to document {}", cli.input.display()))?;
    out.finish().context("failed to finish output")?;
    Ok(())
}

/// Logs go to stderr so a tar archive can be streamed to stdout.
fn init_tracing(verbose: bool) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if verbose => EnvFilter::new("info"),
        Err(_) => EnvFilter::new("warn"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config {
        format: cli.format.parse::<OutputFormat>()?,
        target: cli.target.parse::<Target>()?,
        tab_width: cli.tab_width,
        source_lines: cli.source_lines,
        properties: cli.properties.iter().cloned().collect(),
        ..Config::default()
    };
    let lists = [
        (&mut config.files, &cli.files),
        (&mut config.include, &cli.include),
        (&mut config.exclude, &cli.exclude),
        (&mut config.strip, &cli.strip),
    ];
    for (list, overrides) in lists {
        if !overrides.is_empty() {
            *list = overrides.clone();
        }
    }
    // Surface pattern errors before any output is created.
    config.patterns().context("invalid pattern")?;
    Ok(config)
}
