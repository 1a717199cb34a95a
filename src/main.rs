//! asn-labels – command-line label-sheet generator.
//!
//! Usage:
//!   asn-labels [--format averyL4731] [--pages 2 | --labels 300] [-o labels.pdf]
//!
//! Each label carries a QR code and its printed sequence number, e.g.
//! `ASN000001`. Run with `RUST_LOG=debug` for per-page output.

use std::{fs, path::PathBuf, process};

use clap::Parser;

use asn_labels::error::Result;
use asn_labels::layout::{Orientation, Point, Scale, Spacing};
use asn_labels::options::{ContentMode, RenderOptions, StartPosition};
use asn_labels::pipeline::{compute_layout, generate_pdf, resolve_total};
use asn_labels::sheet::SheetRegistry;

#[derive(Debug, Parser)]
#[command(name = "asn-labels", version, about = "Print QR code labels onto Avery-style label sheets")]
struct Cli {
    /// Sheet format key
    #[arg(short, long, default_value = "averyL4731")]
    format: String,

    /// Output path
    #[arg(short, long, default_value = "labels.pdf")]
    output: PathBuf,

    /// Number of slots to cover, skipped ones included
    #[arg(short = 'n', long, conflicts_with = "pages")]
    labels: Option<usize>,

    /// Whole pages to fill when --labels is not given
    #[arg(short, long, default_value_t = 1)]
    pages: usize,

    /// Leading slots to leave empty (already used labels)
    #[arg(long, conflicts_with = "start_at")]
    skip: Option<usize>,

    /// First label position on the sheet as ROW:COLUMN, 1-based
    #[arg(long, value_name = "ROW:COL")]
    start_at: Option<StartPosition>,

    /// Fill columns top to bottom before moving right
    #[arg(long)]
    column_major: bool,

    /// Draw each cell's outline
    #[arg(short = 'd', long)]
    border: bool,

    /// Draw outlines only, no codes or text
    #[arg(long)]
    blank: bool,

    /// First sequence number
    #[arg(long)]
    start: Option<u64>,

    /// Zero-padded width of the sequence number
    #[arg(long)]
    digits: Option<usize>,

    /// Prefix encoded in the QR code
    #[arg(long)]
    prefix: Option<String>,

    /// Prefix of the printed text, if different from --prefix
    #[arg(long)]
    print_prefix: Option<String>,

    /// Horizontal printer offset in millimetres
    #[arg(long, allow_hyphen_values = true)]
    offset_x: Option<f32>,

    /// Vertical printer offset in millimetres
    #[arg(long, allow_hyphen_values = true)]
    offset_y: Option<f32>,

    /// Horizontal printer scale factor
    #[arg(long)]
    scale_x: Option<f32>,

    /// Vertical printer scale factor
    #[arg(long)]
    scale_y: Option<f32>,

    /// Horizontal padding inside each cell in millimetres
    #[arg(long)]
    margin_x: Option<f32>,

    /// Vertical padding inside each cell in millimetres
    #[arg(long)]
    margin_y: Option<f32>,

    /// Document title in PDF metadata
    #[arg(long)]
    title: Option<String>,

    /// JSON render options file; flags override its values
    #[arg(long, value_name = "FILE")]
    options: Option<PathBuf>,

    /// JSON file of extra sheet formats
    #[arg(long, value_name = "FILE")]
    formats: Option<PathBuf>,

    /// Print the known sheet formats and exit
    #[arg(long)]
    list_formats: bool,

    /// Write the layout snapshot as JSON instead of a PDF
    #[arg(long)]
    layout_json: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut registry = SheetRegistry::builtin();
    if let Some(path) = &cli.formats {
        let added = registry.extend_from_json(&fs::read_to_string(path)?)?;
        log::info!("Loaded {added} sheet formats from '{}'", path.display());
    }

    if cli.list_formats {
        for (key, layout) in registry.iter() {
            let page = layout.page_dimensions();
            println!(
                "{key:<12} {}x{} labels, {:.1}x{:.1} mm on {:.1}x{:.1} mm",
                layout.grid.columns,
                layout.grid.rows,
                layout.cell_size.width,
                layout.cell_size.height,
                page.width,
                page.height
            );
        }
        return Ok(());
    }

    let layout = registry.get(&cli.format)?;
    let options = build_options(&cli, layout)?;
    let total = resolve_total(layout, cli.labels, cli.pages)?;

    let (bytes, summary) = if cli.layout_json {
        let (document, summary) = compute_layout(&registry, &cli.format, &options, total)?;
        (document.to_json().into_bytes(), summary)
    } else {
        generate_pdf(&registry, &cli.format, &options, total)?
    };

    // Create output directory if necessary.
    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(&cli.output, &bytes)?;

    eprintln!(
        "Wrote '{}' ({} bytes, {} page{}, {} label{})",
        cli.output.display(),
        bytes.len(),
        summary.pages,
        if summary.pages == 1 { "" } else { "s" },
        summary.labels_drawn,
        if summary.labels_drawn == 1 { "" } else { "s" }
    );
    if summary.slots_omitted > 0 {
        eprintln!(
            "{} label{} fell off the page with this calibration",
            summary.slots_omitted,
            if summary.slots_omitted == 1 { "" } else { "s" }
        );
    }
    Ok(())
}

/// Options file (or defaults) with command-line flags layered on top.
fn build_options(cli: &Cli, layout: &asn_labels::sheet::SheetLayout) -> Result<RenderOptions> {
    let mut options = match &cli.options {
        Some(path) => RenderOptions::from_json(&fs::read_to_string(path)?)?,
        None => RenderOptions::default(),
    };

    if let Some(title) = &cli.title {
        options.title = title.clone();
    }
    if cli.column_major {
        options.orientation = Orientation::ColumnMajor;
    }
    if cli.border {
        options.border = true;
    }
    if cli.blank {
        options.content = ContentMode::Blank;
    }

    let numbering = &mut options.numbering;
    if let Some(start) = cli.start {
        numbering.counter_start = start;
    }
    if let Some(digits) = cli.digits {
        numbering.counter_digits = digits;
    }
    if let Some(prefix) = &cli.prefix {
        numbering.code_prefix = prefix.clone();
    }
    if let Some(print_prefix) = &cli.print_prefix {
        numbering.print_prefix = Some(print_prefix.clone());
    }

    let calibration = &mut options.calibration;
    calibration.offset = Point::new(
        cli.offset_x.unwrap_or(calibration.offset.x),
        cli.offset_y.unwrap_or(calibration.offset.y),
    );
    calibration.scale = Scale {
        x: cli.scale_x.unwrap_or(calibration.scale.x),
        y: cli.scale_y.unwrap_or(calibration.scale.y),
    };
    options.inner_margin = Spacing::new(
        cli.margin_x.unwrap_or(options.inner_margin.x),
        cli.margin_y.unwrap_or(options.inner_margin.y),
    );

    if let Some(skip) = cli.skip {
        options.skip = skip;
    } else if let Some(position) = cli.start_at {
        options.skip = position.to_skip(layout, options.orientation)?;
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "asn-labels",
            "--format",
            "avery5160",
            "--prefix",
            "BOX",
            "--digits",
            "4",
            "--offset-x",
            "-1.5",
            "--start-at",
            "2:3",
            "--column-major",
        ]);
        let registry = SheetRegistry::builtin();
        let layout = registry.get(&cli.format).unwrap();
        let options = build_options(&cli, layout).unwrap();

        assert_eq!(options.numbering.code_prefix, "BOX");
        assert_eq!(options.numbering.counter_digits, 4);
        assert_eq!(options.calibration.offset, Point::new(-1.5, 0.0));
        assert_eq!(options.orientation, Orientation::ColumnMajor);
        // Column 3 of 3, row 2 of 10, filled column by column.
        assert_eq!(options.skip, 21);
    }

    #[test]
    fn labels_and_pages_conflict() {
        assert!(Cli::try_parse_from(["asn-labels", "-n", "5", "-p", "2"]).is_err());
    }
}
