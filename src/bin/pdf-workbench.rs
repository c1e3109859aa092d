//! PDF Workbench CLI tool
//!
//! Command-line front end for the conversion and manipulation pipeline.
//! Each subcommand is one synchronous operation: it stages its work in a
//! temporary directory that is removed when the operation finishes, and
//! only promotes output on success.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use glob::glob;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use pdf_workbench::convert::convert_to_pdf;
use pdf_workbench::pdf::{
    add_page_numbers, apply_watermark, extract_pages, merge_files, page_count, probe, rotate_page,
    split_file_name, split_to_files, split_to_zip, WatermarkOptions,
};
use pdf_workbench::range::parse_page_range;

/// PDF Workbench - convert files to PDF and rework PDF pages
#[derive(Parser)]
#[command(name = "pdf-workbench")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Convert images and office files to PDF
    pdf-workbench convert -d out/ scan.jpg report.docx

    # Merge files (converting non-PDFs first) and number the pages
    pdf-workbench merge -o combined.pdf --number cover.png body.pdf

    # Pull pages 1, 3 and 5-10 into a new PDF
    pdf-workbench extract input.pdf -o subset.pdf --pages \"1,3,5-10\"

    # Split into one file per page, packaged as a ZIP
    pdf-workbench split input.pdf --zip pages.zip

    # Stamp a diagonal watermark across every page
    pdf-workbench watermark input.pdf -o stamped.pdf --text DRAFT")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert images and office documents to PDF
    Convert {
        /// Input files. Supports glob patterns like "*.docx"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Directory for the converted PDFs
        #[arg(short = 'd', long, default_value = ".")]
        outdir: PathBuf,

        /// Add page numbers to each converted PDF
        #[arg(long)]
        number: bool,
    },

    /// Merge files into a single PDF, converting non-PDF inputs first
    Merge {
        /// Input files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Add page numbers to the merged PDF
        #[arg(long)]
        number: bool,
    },

    /// Split a PDF into one file per page
    Split {
        /// Input PDF file
        input: PathBuf,

        /// Directory for the per-page PDFs
        #[arg(short = 'd', long, default_value = ".")]
        outdir: PathBuf,

        /// Package the pages into a ZIP archive instead of loose files
        #[arg(long, value_name = "FILE")]
        zip: Option<PathBuf>,
    },

    /// Extract a subset of pages into a new PDF
    Extract {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Pages to keep, e.g. "1,3,5-10"
        #[arg(short, long)]
        pages: String,
    },

    /// Rotate pages by a quarter, half or three-quarter turn
    Rotate {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Degrees to add: 90, 180 or 270
        #[arg(long, value_parser = parse_degrees)]
        degrees: u32,

        /// Pages to rotate, e.g. "1,3,5-10" (default: all pages)
        #[arg(short, long)]
        pages: Option<String>,
    },

    /// Draw a semi-transparent watermark across every page
    Watermark {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,

        /// Watermark text
        #[arg(long)]
        text: String,

        /// Font size in points
        #[arg(long, default_value_t = 48.0)]
        font_size: f32,

        /// Opacity between 0.0 and 1.0
        #[arg(long, default_value_t = 0.3)]
        opacity: f32,

        /// Rotation around the page midpoint, 0-90 degrees
        #[arg(long, default_value_t = 45.0)]
        angle: f32,
    },

    /// Add "page/total" numbers to every page
    Number {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            inputs,
            outdir,
            number,
        } => cmd_convert(inputs, outdir, number),
        Commands::Merge {
            inputs,
            output,
            number,
        } => cmd_merge(inputs, output, number),
        Commands::Split { input, outdir, zip } => cmd_split(input, outdir, zip),
        Commands::Extract {
            input,
            output,
            pages,
        } => cmd_extract(input, output, pages),
        Commands::Rotate {
            input,
            output,
            degrees,
            pages,
        } => cmd_rotate(input, output, degrees, pages),
        Commands::Watermark {
            input,
            output,
            text,
            font_size,
            opacity,
            angle,
        } => cmd_watermark(input, output, text, font_size, opacity, angle),
        Commands::Number { input, output } => cmd_number(input, output),
        Commands::Info { input } => cmd_info(input),
    }
}

/// Accept only quarter-turn rotation increments
fn parse_degrees(s: &str) -> Result<u32, String> {
    match s {
        "90" => Ok(90),
        "180" => Ok(180),
        "270" => Ok(270),
        _ => Err(format!("must be 90, 180 or 270, got {}", s)),
    }
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matched = false;
            for entry in glob(&pattern)? {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                bail!("No files matched pattern: {}", pattern);
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    Ok(paths)
}

fn check_inputs_exist(paths: &[PathBuf]) -> anyhow::Result<()> {
    for path in paths {
        if !path.exists() {
            bail!("Input file not found: {}", path.display());
        }
    }
    Ok(())
}

fn file_stem(path: &Path) -> anyhow::Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_string())
        .with_context(|| format!("Unusable file name: {}", path.display()))
}

/// Convert each input to PDF, staging in a temp dir and promoting the
/// results into the output directory.
fn cmd_convert(inputs: Vec<String>, outdir: PathBuf, number: bool) -> anyhow::Result<()> {
    let inputs = expand_globs(inputs)?;
    check_inputs_exist(&inputs)?;
    std::fs::create_dir_all(&outdir)?;

    let staging = TempDir::new()?;

    for input in &inputs {
        eprintln!("Converting {}...", input.display());
        let pdf_path = convert_to_pdf(input, staging.path())
            .with_context(|| format!("Failed to convert {}", input.display()))?;

        if number {
            let mut doc = lopdf::Document::load(&pdf_path)?;
            add_page_numbers(&mut doc)?;
            let numbered = staging.path().join(format!("{}_numbered.pdf", file_stem(&pdf_path)?));
            doc.save(&numbered)?;
            let final_path = outdir.join(format!("{}.pdf", file_stem(input)?));
            std::fs::copy(&numbered, &final_path)?;
            eprintln!("Wrote {}", final_path.display());
        } else {
            let final_path = outdir.join(format!("{}.pdf", file_stem(input)?));
            // Passthrough PDFs come back as the input path itself; don't
            // copy a file onto itself.
            let same_file = match (pdf_path.canonicalize(), final_path.canonicalize()) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            };
            if !same_file {
                std::fs::copy(&pdf_path, &final_path)?;
            }
            eprintln!("Wrote {}", final_path.display());
        }
    }

    Ok(())
}

/// Convert non-PDF inputs, then merge everything in input order.
fn cmd_merge(inputs: Vec<String>, output: PathBuf, number: bool) -> anyhow::Result<()> {
    let inputs = expand_globs(inputs)?;
    check_inputs_exist(&inputs)?;

    let staging = TempDir::new()?;

    let mut pdf_paths = Vec::new();
    for input in &inputs {
        let pdf_path = convert_to_pdf(input, staging.path())
            .with_context(|| format!("Failed to convert {}", input.display()))?;
        pdf_paths.push(pdf_path);
    }

    eprintln!("Merging {} PDF files...", pdf_paths.len());
    let merged = staging.path().join("merged.pdf");
    merge_files(&pdf_paths, &merged)?;

    if number {
        let mut doc = lopdf::Document::load(&merged)?;
        add_page_numbers(&mut doc)?;
        doc.save(&merged)?;
    }

    std::fs::copy(&merged, &output)?;
    eprintln!("Merged to: {}", output.display());

    Ok(())
}

fn cmd_split(input: PathBuf, outdir: PathBuf, zip: Option<PathBuf>) -> anyhow::Result<()> {
    check_inputs_exist(std::slice::from_ref(&input))?;
    let base_name = file_stem(&input)?;
    let doc = lopdf::Document::load(&input)?;

    match zip {
        Some(zip_path) => {
            let bytes = split_to_zip(&doc, &base_name)?;
            std::fs::write(&zip_path, bytes)?;
            eprintln!("Wrote {}", zip_path.display());
        }
        None => {
            std::fs::create_dir_all(&outdir)?;
            let staging = TempDir::new()?;
            let staged = split_to_files(&doc, &base_name, staging.path())?;
            for (i, path) in staged.iter().enumerate() {
                let final_path = outdir.join(split_file_name(&base_name, i + 1));
                std::fs::copy(path, &final_path)?;
            }
            eprintln!("Wrote {} pages to {}", staged.len(), outdir.display());
        }
    }

    Ok(())
}

fn cmd_extract(input: PathBuf, output: PathBuf, pages: String) -> anyhow::Result<()> {
    check_inputs_exist(std::slice::from_ref(&input))?;
    let doc = lopdf::Document::load(&input)?;

    let total = page_count(&doc) as u32;
    let selected = parse_page_range(&pages, total);
    if selected.is_empty() {
        eprintln!("No valid pages in \"{}\" (document has {} pages); nothing to do", pages, total);
        return Ok(());
    }

    let mut extracted = extract_pages(&doc, &selected)?;
    extracted.compress();
    extracted.save(&output)?;
    eprintln!("Extracted {} pages to {}", selected.len(), output.display());

    Ok(())
}

fn cmd_rotate(
    input: PathBuf,
    output: PathBuf,
    degrees: u32,
    pages: Option<String>,
) -> anyhow::Result<()> {
    check_inputs_exist(std::slice::from_ref(&input))?;
    let mut doc = lopdf::Document::load(&input)?;

    let total = page_count(&doc) as u32;
    let selected = match pages {
        Some(spec) => {
            let selected = parse_page_range(&spec, total);
            if selected.is_empty() {
                eprintln!("No valid pages in \"{}\" (document has {} pages); nothing to do", spec, total);
                return Ok(());
            }
            selected
        }
        None => (1..=total).collect(),
    };

    for &page_number in &selected {
        rotate_page(&mut doc, page_number, degrees)?;
    }

    doc.save(&output)?;
    eprintln!(
        "Rotated {} pages by {}°, wrote {}",
        selected.len(),
        degrees,
        output.display()
    );

    Ok(())
}

fn cmd_watermark(
    input: PathBuf,
    output: PathBuf,
    text: String,
    font_size: f32,
    opacity: f32,
    angle: f32,
) -> anyhow::Result<()> {
    check_inputs_exist(std::slice::from_ref(&input))?;
    let mut doc = lopdf::Document::load(&input)?;

    let options = WatermarkOptions {
        text,
        font_size,
        opacity,
        angle,
    };
    apply_watermark(&mut doc, &options)?;

    doc.compress();
    doc.save(&output)?;
    eprintln!("Watermarked: {}", output.display());

    Ok(())
}

fn cmd_number(input: PathBuf, output: PathBuf) -> anyhow::Result<()> {
    check_inputs_exist(std::slice::from_ref(&input))?;
    let mut doc = lopdf::Document::load(&input)?;

    add_page_numbers(&mut doc)?;

    doc.compress();
    doc.save(&output)?;
    eprintln!("Numbered: {}", output.display());

    Ok(())
}

fn cmd_info(input: PathBuf) -> anyhow::Result<()> {
    check_inputs_exist(std::slice::from_ref(&input))?;

    let info = probe(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", info.page_count);
    if let Some(title) = info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = info.author {
        println!("Author: {}", author);
    }

    Ok(())
}
