//! # CLI Module
//!
//! Command-line interface for the photo copier.
//!
//! ## Usage
//! ```bash
//! # Copy a memory card into ~/Pictures/<year>/<year-month-day>
//! photo-copier copy --src /Volumes/CARD/DCIM --dst ~/Pictures
//!
//! # One folder per month, eight workers
//! photo-copier copy --src ./dump --dst ./library --format %Y-%m --num-workers 8
//!
//! # Make 1024px wide JPEG previews
//! photo-copier resize --src ./library --dst ./previews --width 1024 --height 0
//!
//! # Previews with a credit line
//! photo-copier resize --src ./library --dst ./previews --width 1024 --watermark "© Me"
//!
//! # Watermark at full size, black text
//! photo-copier watermark --src ./library --dst ./marked --watermark "© Me" \
//!     --watermark-color black
//! ```

use clap::{Args, Parser, Subcommand};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photo_copier::config::{ConfigOverrides, CopyConfig};
use photo_copier::core::copier::CancellationToken;
use photo_copier::core::pipeline::{Pipeline, PipelineResult};
use photo_copier::core::transform::{
    transform_tree, Resize, Transform, Watermark, WatermarkColor, DEFAULT_WATERMARK_SIZE,
};
use photo_copier::events::{CopyEvent, Event, EventChannel, PipelineEvent};
use photo_copier::Result;
use std::path::PathBuf;
use std::thread;
use tracing::{info, warn};

/// Photo Copier - file photos by the day they were taken
#[derive(Parser, Debug)]
#[command(name = "photo-copier")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Copy photos into a date-based directory tree
    Copy {
        /// Directory to copy from
        #[arg(long, default_value = "./")]
        src: PathBuf,

        /// Root of the destination tree
        #[arg(long)]
        dst: PathBuf,

        /// strftime layout of destination directories, `/` separates levels
        #[arg(long)]
        format: Option<String>,

        /// Only look at the top level of the source
        #[arg(long)]
        no_recurse: bool,

        /// Number of copy workers (defaults to the number of CPUs)
        #[arg(long)]
        num_workers: Option<usize>,

        /// Ignore dot-files and dot-directories
        #[arg(long)]
        skip_hidden: bool,

        /// Config file to use instead of the standard locations
        #[arg(long)]
        config: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write resized JPEG copies of every photo
    Resize {
        /// Directory to read photos from
        #[arg(long)]
        src: PathBuf,

        /// Directory to write resized photos into
        #[arg(long)]
        dst: PathBuf,

        /// Target width (0 keeps the aspect ratio)
        #[arg(long, default_value = "0")]
        width: u32,

        /// Target height (0 keeps the aspect ratio)
        #[arg(long, default_value = "0")]
        height: u32,

        /// Also draw this text on every resized photo
        #[arg(long)]
        watermark: Option<String>,

        #[command(flatten)]
        style: WatermarkStyle,

        /// Only look at the top level of the source
        #[arg(long)]
        no_recurse: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write full-size JPEG copies of every photo with a text watermark
    Watermark {
        /// Directory to read photos from
        #[arg(long)]
        src: PathBuf,

        /// Directory to write watermarked photos into
        #[arg(long)]
        dst: PathBuf,

        /// Text to draw near the bottom of each photo
        #[arg(long)]
        watermark: String,

        #[command(flatten)]
        style: WatermarkStyle,

        /// Only look at the top level of the source
        #[arg(long)]
        no_recurse: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Args, Debug)]
struct WatermarkStyle {
    /// Watermark text color (white or black)
    #[arg(long, default_value = "white")]
    watermark_color: WatermarkColor,

    /// Watermark text height in pixels
    #[arg(long, default_value_t = DEFAULT_WATERMARK_SIZE)]
    watermark_size: f32,

    /// Font file for the watermark (defaults to Arial or DejaVu Sans)
    #[arg(long)]
    watermark_font: Option<PathBuf>,
}

impl WatermarkStyle {
    fn build(&self, text: &str) -> Result<Watermark> {
        let color = self.watermark_color;
        let size = self.watermark_size;
        let watermark = match &self.watermark_font {
            Some(font) => Watermark::with_font_file(text, color, size, font)?,
            None => Watermark::with_system_font(text, color, size)?,
        };
        Ok(watermark)
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Copy {
            src,
            dst,
            format,
            no_recurse,
            num_workers,
            skip_hidden,
            config,
            verbose,
        } => {
            photo_copier::init_tracing(verbose);
            let overrides = ConfigOverrides {
                format,
                recursive: no_recurse.then_some(false),
                workers: num_workers,
                include_hidden: skip_hidden.then_some(false),
            };
            let config = CopyConfig::load(config.as_deref())?.with_overrides(overrides);
            run_copy(src, dst, config)
        }
        Commands::Resize {
            src,
            dst,
            width,
            height,
            watermark,
            style,
            no_recurse,
            verbose,
        } => {
            photo_copier::init_tracing(verbose);
            let resize = Resize::new(width, height);
            let transform: Box<dyn Transform> = match watermark {
                Some(text) => Box::new(resize.then(style.build(&text)?)),
                None => Box::new(resize),
            };
            run_transform(src, dst, transform.as_ref(), !no_recurse, "Resized")
        }
        Commands::Watermark {
            src,
            dst,
            watermark,
            style,
            no_recurse,
            verbose,
        } => {
            photo_copier::init_tracing(verbose);
            let watermark = style.build(&watermark)?;
            info!(text = watermark.text(), color = %watermark.color(), "adding watermark");
            run_transform(src, dst, &watermark, !no_recurse, "Watermarked")
        }
    }
}

fn run_copy(src: PathBuf, dst: PathBuf, config: CopyConfig) -> Result<()> {
    let term = Term::stderr();

    config.validate()?;
    config.log(&src, &dst);

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        warn!(error = %e, "unable to install interrupt handler");
    }

    let pipeline = Pipeline::builder()
        .source(&src)
        .destination(&dst)
        .template(config.template()?)
        .scan_config(config.scan_config())
        .workers(config.workers)
        .cancellation(cancel)
        .build();

    let (sender, receiver) = EventChannel::new();

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░"),
    );
    let progress = pb.clone();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    progress.set_message(format!("{}", phase));
                }
                Event::Copy(CopyEvent::Started { total }) => {
                    progress.set_length(total as u64);
                }
                Event::Copy(
                    CopyEvent::Copied { .. } | CopyEvent::Skipped { .. } | CopyEvent::Failed { .. },
                ) => {
                    progress.inc(1);
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    progress.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();
    pb.finish_and_clear();

    print_copy_summary(&term, &result?);
    Ok(())
}

fn run_transform(
    src: PathBuf,
    dst: PathBuf,
    transform: &dyn Transform,
    recursive: bool,
    verb: &str,
) -> Result<()> {
    let term = Term::stderr();
    let summary = transform_tree(&src, &dst, transform, recursive)?;

    term.write_line(&format!(
        "{} {} {} photos into {}",
        style("✓").green().bold(),
        verb,
        style(summary.processed).cyan(),
        dst.display()
    ))
    .ok();
    if summary.failed > 0 {
        term.write_line(&format!(
            "  {} could not be processed, see the log",
            style(summary.failed).red()
        ))
        .ok();
    }
    Ok(())
}

fn print_copy_summary(term: &Term, result: &PipelineResult) {
    let report = &result.report;
    let stats = &report.stats;

    term.write_line("").ok();
    if report.cancelled {
        term.write_line(&format!(
            "{} Copy interrupted",
            style("!").yellow().bold()
        ))
        .ok();
    } else {
        term.write_line(&format!("{} Copy Complete", style("✓").green().bold()))
            .ok();
    }
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} photos found in {:.1}s",
        style(result.total_candidates).cyan(),
        result.duration_ms as f64 / 1000.0
    ))
    .ok();
    term.write_line(&format!(
        "  {} copied ({})",
        style(stats.copied).cyan(),
        style(format_bytes(stats.bytes)).yellow()
    ))
    .ok();
    term.write_line(&format!(
        "  {} already present",
        style(stats.skipped).cyan()
    ))
    .ok();

    if stats.failed > 0 {
        term.write_line(&format!("  {} failed", style(stats.failed).red()))
            .ok();
    }
    if !result.scan_errors.is_empty() {
        term.write_line(&format!(
            "  {} files skipped while scanning",
            style(result.scan_errors.len()).dim()
        ))
        .ok();
    }

    term.write_line(&format!(
        "  {}/s",
        style(format_bytes(report.throughput() as u64)).dim()
    ))
    .ok();
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
