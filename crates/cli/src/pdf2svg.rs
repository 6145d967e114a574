//! pdf2svg - render a serialized page bundle to per-page SVG files.
//!
//! The positional argument names the operator dump the upstream
//! producer wrote for a PDF; each page renders to
//! `<basename>-<pageNum>.svg` inside the output directory.

mod bundle;

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

use vellum_core::error::{RenderError, Result};
use vellum_core::utils::mult_matrix;
use vellum_core::{render_pages, IdCounters, PageTask, RenderOptions};

#[derive(Parser, Debug)]
#[command(name = "pdf2svg")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the page bundle produced for a PDF.
    #[arg(default_value = "./test3.pdf")]
    input: PathBuf,

    /// Directory the per-page SVG files are written to (created if
    /// missing).
    #[arg(short, long, default_value = "svgdump")]
    output_dir: PathBuf,

    /// Extra scale applied on top of each page's base transform.
    #[arg(short, long, default_value_t = 1.0)]
    scale: f64,

    /// Embed font programs as @font-face data URLs.
    #[arg(long)]
    embed_fonts: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let text = fs::read_to_string(&args.input)?;
    let (common_objs, mut tasks) = bundle::parse_document(&text)?;

    if args.scale != 1.0 {
        for task in &mut tasks {
            scale_task(task, args.scale);
        }
    }

    fs::create_dir_all(&args.output_dir)?;

    let counters = IdCounters::new();
    let options = RenderOptions {
        embed_fonts: args.embed_fonts,
    };
    let total = tasks.len();
    let results = render_pages(&tasks, &common_objs, options, &counters);

    let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("page")
        .to_string();

    let mut failures = 0usize;
    for (index, result) in results.into_iter().enumerate() {
        let page_num = index + 1;
        match result {
            Ok(doc) => {
                let path = args.output_dir.join(format!("{stem}-{page_num}.svg"));
                let file = fs::File::create(&path)?;
                let mut out = std::io::BufWriter::new(file);
                doc.write(&mut out)?;
                out.flush()?;
                info!("wrote {}", path.display());
            }
            Err(err) => {
                failures += 1;
                error!("page {page_num} failed: {err}");
            }
        }
    }

    if total > 0 && failures == total {
        return Err(RenderError::Bundle("every page failed to render".into()));
    }
    Ok(())
}

/// Scales a page's device space: the viewport grows and the base
/// transform picks up a trailing scale.
fn scale_task(task: &mut PageTask, scale: f64) {
    task.viewport.width *= scale;
    task.viewport.height *= scale;
    task.viewport.transform = mult_matrix(
        task.viewport.transform,
        (scale, 0.0, 0.0, scale, 0.0, 0.0),
    );
}
