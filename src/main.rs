//! Redaction CLI.
//!
//! Loads scanned page images, runs sensitive-data detection (against sidecar
//! OCR output when provided), applies manual regions, and writes a flattened
//! PDF where every selected region is painted opaque.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};

use blackout::{
    Classifier, ExtractionAdapter, NormalizedRect, NullRecognizer, RasterDocument,
    RedactionSession, SensitiveCategory, TextRecognizer,
};

/// Scanned-document redaction tool.
///
/// Detection needs recognized text: point --sidecar at a directory of
/// per-page OCR output files (one `.txt` per page image, tab-separated
/// `x y width height text` lines in normalized page coordinates). Without
/// sidecars, only --rect regions are redacted.
#[derive(Parser)]
#[command(name = "blackout")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Input page images, in page order
    #[arg(short, long, value_name = "FILE", required = true, num_args = 1..)]
    input: Vec<PathBuf>,

    /// Output PDF path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory of per-page OCR sidecar files (named after each input
    /// image, .txt extension)
    #[arg(long, value_name = "DIR")]
    sidecar: Option<PathBuf>,

    /// Categories to detect (default: all built-in)
    #[arg(long, value_delimiter = ',', value_name = "CATEGORY")]
    categories: Vec<CategoryArg>,

    /// Additional custom regex pattern to detect (can be repeated)
    #[arg(short, long, value_name = "PATTERN")]
    pattern: Vec<String>,

    /// Manual region as PAGE:X:Y:W:H in normalized page coordinates,
    /// origin bottom-left (can be repeated)
    #[arg(long, value_name = "SPEC")]
    rect: Vec<String>,

    /// Scan resolution of the input images, in dots per inch
    #[arg(long, default_value_t = 150.0)]
    dpi: f32,

    /// List detections without writing output
    #[arg(long)]
    list: bool,

    /// Deselect automatic findings below this confidence before applying
    #[arg(long, value_name = "CONF")]
    min_confidence: Option<f32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CategoryArg {
    Ssn,
    CreditCard,
    Phone,
    PhoneIntl,
    Email,
    Date,
    Passport,
    PassportIntl,
    BankAccount,
    Address,
    IpAddress,
}

impl From<CategoryArg> for SensitiveCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Ssn => Self::Ssn,
            CategoryArg::CreditCard => Self::CreditCard,
            CategoryArg::Phone => Self::Phone,
            CategoryArg::PhoneIntl => Self::PhoneIntl,
            CategoryArg::Email => Self::Email,
            CategoryArg::Date => Self::Date,
            CategoryArg::Passport => Self::Passport,
            CategoryArg::PassportIntl => Self::PassportIntl,
            CategoryArg::BankAccount => Self::BankAccount,
            CategoryArg::Address => Self::Address,
            CategoryArg::IpAddress => Self::IpAddress,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let document = RasterDocument::open_images(&cli.input, cli.dpi)
        .context("failed to open input pages")?;

    let recognizer: Arc<dyn TextRecognizer> = match &cli.sidecar {
        Some(dir) => {
            let files = cli
                .input
                .iter()
                .map(|page| {
                    let stem = page
                        .file_stem()
                        .map(|s| s.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    dir.join(stem).with_extension("txt")
                })
                .collect();
            Arc::new(blackout::SidecarRecognizer::from_files(files))
        }
        None => Arc::new(NullRecognizer),
    };

    let categories: Vec<SensitiveCategory> = if cli.categories.is_empty() {
        SensitiveCategory::BUILTIN.to_vec()
    } else {
        cli.categories.iter().map(|c| (*c).into()).collect()
    };
    let mut classifier = Classifier::for_categories(&categories);
    for pattern in &cli.pattern {
        classifier
            .add_custom_pattern(pattern)
            .with_context(|| format!("invalid pattern '{pattern}'"))?;
    }

    let adapter = ExtractionAdapter::new(recognizer);
    let mut session = RedactionSession::new(document, adapter, classifier);

    let page_count = cli.input.len();
    let summary = session
        .analyze_with_progress(|p| {
            if p.page_count > 1 {
                eprintln!(
                    "  page {}/{} analyzed ({} regions so far)",
                    p.page_index + 1,
                    p.page_count,
                    p.regions_found
                );
            }
        })
        .context("analysis failed")?;

    if let Some(floor) = cli.min_confidence {
        let low: Vec<_> = session
            .store()
            .iter()
            .filter(|r| r.confidence.map(|c| c < floor).unwrap_or(false))
            .map(|r| r.id)
            .collect();
        for id in low {
            session.toggle_region(id);
        }
    }

    for spec in &cli.rect {
        let rect = parse_rect_spec(spec)?;
        if session.add_manual_region_normalized(rect.0, rect.1).is_none() {
            bail!("invalid --rect '{spec}': page out of range or rect outside the page");
        }
    }

    println!(
        "Found {} region(s) across {} page(s){}",
        session.store().len(),
        page_count,
        if summary.pages_without_text.is_empty() {
            String::new()
        } else {
            format!(" ({} page(s) had no text)", summary.pages_without_text.len())
        }
    );

    for region in session.store().iter() {
        let label = region
            .category
            .map(|c| c.label().to_string())
            .unwrap_or_else(|| "manual".to_string());
        let text = region.detected_text.as_deref().unwrap_or("-");
        let confidence = region
            .confidence
            .map(|c| format!("{c:.2}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  page {:>3}  {:<14} conf {:<5} {} {}",
            region.page_index + 1,
            label,
            confidence,
            if region.is_selected { "[x]" } else { "[ ]" },
            text
        );
    }

    if cli.list {
        return Ok(());
    }

    let output = match &cli.output {
        Some(path) => path.clone(),
        None => bail!("--output is required unless --list is given"),
    };

    let flattened = session.apply().context("composition failed")?;
    flattened
        .save_pdf(&output)
        .context("failed to write output PDF")?;

    println!(
        "Wrote {} flattened page(s) to {}",
        flattened.page_count(),
        output.display()
    );
    Ok(())
}

/// Parses PAGE:X:Y:W:H (1-based page, normalized coordinates).
fn parse_rect_spec(spec: &str) -> Result<(usize, NormalizedRect)> {
    let parts: Vec<&str> = spec.split(':').collect();
    if parts.len() != 5 {
        bail!("expected PAGE:X:Y:W:H, got '{spec}'");
    }
    let page: usize = parts[0]
        .parse()
        .with_context(|| format!("bad page in '{spec}'"))?;
    if page == 0 {
        bail!("pages are 1-based in '{spec}'");
    }
    let mut values = [0.0f32; 4];
    for (slot, part) in values.iter_mut().zip(&parts[1..]) {
        *slot = part
            .parse()
            .with_context(|| format!("bad coordinate '{part}' in '{spec}'"))?;
    }
    Ok((
        page - 1,
        NormalizedRect::new(values[0], values[1], values[2], values[3]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rect_spec() {
        let (page, rect) = parse_rect_spec("2:0.1:0.2:0.3:0.4").unwrap();
        assert_eq!(page, 1);
        assert!((rect.x - 0.1).abs() < 1e-6);
        assert!((rect.height - 0.4).abs() < 1e-6);

        assert!(parse_rect_spec("0:0:0:1:1").is_err());
        assert!(parse_rect_spec("1:0.1:0.2").is_err());
        assert!(parse_rect_spec("1:a:b:c:d").is_err());
    }

    #[test]
    fn test_cli_parses() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
