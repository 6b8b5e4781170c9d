use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use redline_engine::{default_renderer, DocumentRenderer, OpenSource};
use redline_export::{export_flattened, export_vector, ExportOptions};
use redline_model::{AnnotationStore, Stroke};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

const STROKES_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Parser)]
#[command(name = "redline-cli")]
#[command(about = "Redline CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print machine-readable PDF metadata.
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Burn strokes into the PDF as vector line annotations.
    Annotate {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Strokes JSON file (versioned envelope).
        #[arg(long)]
        strokes: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Line thickness in points.
        #[arg(long, default_value_t = 2.0)]
        thickness: f32,
    },
    /// Export an image-flattened copy with strokes drawn in.
    Flatten {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        #[arg(long)]
        strokes: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Raster scale in pixels per point.
        #[arg(long, default_value_t = 1.0)]
        scale: f32,
    },
    /// Print CLI version.
    Version,
}

#[derive(Debug, Serialize)]
struct InfoOutput {
    path: String,
    page_count: u32,
    first_page_size_pt: Option<PageSizeOutput>,
}

#[derive(Debug, Serialize)]
struct PageSizeOutput {
    width: f32,
    height: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct StrokesEnvelope {
    version: u32,
    strokes: Vec<Stroke>,
}

pub fn run<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Annotate { file, strokes, output, thickness } => {
            let options = ExportOptions { thickness, ..ExportOptions::default() };
            run_export(&file, &strokes, &output, |bytes, store| {
                export_vector(bytes, store, &options).context("vector export failed")
            })
        }
        Commands::Flatten { file, strokes, output, scale } => {
            let options = ExportOptions { scale, ..ExportOptions::default() };
            run_export(&file, &strokes, &output, |bytes, store| {
                export_flattened(bytes, store, &options).context("flattened export failed")
            })
        }
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_info(file: &Path) -> Result<()> {
    ensure_pdf_exists(file)?;

    let mut renderer = default_renderer();
    let handle = renderer.open(OpenSource::from(file)).context("failed to open PDF")?;

    let page_count = renderer.page_count(handle)?;
    let first_page_size_pt = if page_count > 0 {
        let size = renderer.page_size(handle, 0)?;
        Some(PageSizeOutput { width: size.width_pt, height: size.height_pt })
    } else {
        None
    };

    let payload = InfoOutput { path: file.display().to_string(), page_count, first_page_size_pt };

    let json = serde_json::to_string_pretty(&payload)?;
    println!("{json}");

    renderer.close(handle)?;

    Ok(())
}

fn run_export(
    file: &Path,
    strokes_path: &Path,
    output: &Path,
    export: impl FnOnce(&[u8], &AnnotationStore) -> Result<Vec<u8>>,
) -> Result<()> {
    ensure_pdf_exists(file)?;

    let store = load_strokes(strokes_path)?;
    let source = fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;

    let bytes = export(&source, &store)?;

    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, bytes)
        .with_context(|| format!("failed to write output to {}", output.display()))?;

    println!("{}", output.display());
    Ok(())
}

fn load_strokes(path: &Path) -> Result<AnnotationStore> {
    let bytes = fs::read(path)
        .with_context(|| format!("failed to read strokes file {}", path.display()))?;
    let envelope: StrokesEnvelope =
        serde_json::from_slice(&bytes).context("strokes file is not valid strokes JSON")?;

    if envelope.version != STROKES_SCHEMA_VERSION {
        anyhow::bail!(
            "unsupported strokes schema version {} (expected {})",
            envelope.version,
            STROKES_SCHEMA_VERSION
        );
    }

    let mut store = AnnotationStore::new();
    for (index, stroke) in envelope.strokes.into_iter().enumerate() {
        if stroke.page == 0 {
            anyhow::bail!("stroke {index} has page 0; pages are 1-based");
        }
        if !store.push_finalized(stroke) {
            anyhow::bail!("stroke {index} is invalid: needs at least 2 finite points");
        }
    }

    Ok(store)
}

fn ensure_pdf_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        anyhow::bail!("file does not exist: {}", path.display());
    }

    if !path.is_file() {
        anyhow::bail!("path is not a file: {}", path.display());
    }

    Ok(())
}
