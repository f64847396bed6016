//! # Transform Module
//!
//! Batch image transforms for the `resize` and `watermark` commands.
//!
//! Every photo under the source is decoded, transformed and written to the
//! output directory as a JPEG named by the transform: `{stem}_{width}x{height}.jpg`
//! for a resize, `{stem}.jpg` for a watermark. A file that fails is logged
//! and counted; the batch carries on.

mod watermark;

pub use watermark::{
    find_font, font_dirs, Watermark, WatermarkColor, DEFAULT_SIZE as DEFAULT_WATERMARK_SIZE,
    FONT_NAMES,
};

use crate::core::scanner::{ScanConfig, WalkDirScanner};
use crate::error::{PhotoCopierError, TransformError};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use rayon::prelude::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info};

/// JPEG quality of transformed output
pub const OUTPUT_QUALITY: u8 = 90;

/// A pure image-to-image operation
pub trait Transform: Send + Sync {
    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, TransformError>;

    /// Name of the output file for a source with stem `stem`
    fn output_name(&self, stem: &str) -> String;

    /// Apply `next` to the output of this transform. The output file keeps
    /// this transform's name.
    fn then<T: Transform>(self, next: T) -> Then<Self, T>
    where
        Self: Sized,
    {
        Then { first: self, next }
    }
}

/// Two transforms applied in order, see [`Transform::then`]
#[derive(Debug, Clone)]
pub struct Then<A, B> {
    first: A,
    next: B,
}

impl<A: Transform, B: Transform> Transform for Then<A, B> {
    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, TransformError> {
        self.next.apply(self.first.apply(image)?)
    }

    fn output_name(&self, stem: &str) -> String {
        self.first.output_name(stem)
    }
}

/// Scale to `width` x `height` with Lanczos3.
///
/// A zero dimension is derived from the other one so the aspect ratio is
/// kept. Both zero leaves the image unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub width: u32,
    pub height: u32,
}

impl Resize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Output dimensions for an image of `src_w` x `src_h`
    pub fn target_size(&self, src_w: u32, src_h: u32) -> (u32, u32) {
        match (self.width, self.height) {
            (0, 0) => (src_w, src_h),
            (0, h) => (scale(src_w, h, src_h), h),
            (w, 0) => (w, scale(src_h, w, src_w)),
            (w, h) => (w, h),
        }
    }
}

fn scale(side: u32, numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 1;
    }
    let scaled = (side as f64 * numerator as f64 / denominator as f64).round() as u32;
    scaled.max(1)
}

impl Transform for Resize {
    fn apply(&self, image: DynamicImage) -> Result<DynamicImage, TransformError> {
        let (w, h) = self.target_size(image.width(), image.height());
        if (w, h) == (image.width(), image.height()) {
            return Ok(image);
        }
        Ok(image.resize_exact(w, h, FilterType::Lanczos3))
    }

    fn output_name(&self, stem: &str) -> String {
        format!("{}_{}x{}.jpg", stem, self.width, self.height)
    }
}

/// Outcome of a batch transform
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Apply `transform` to every photo under `source` and write the results
/// into `destination`.
pub fn transform_tree(
    source: &Path,
    destination: &Path,
    transform: &dyn Transform,
    recursive: bool,
) -> Result<TransformSummary, PhotoCopierError> {
    let scanner = WalkDirScanner::new(ScanConfig {
        recursive,
        ..ScanConfig::default()
    });
    let (files, errors) = scanner.discover(source, None)?;
    for e in &errors {
        error!("{e}");
    }

    fs::create_dir_all(destination).map_err(|source| TransformError::OutputDirectory {
        path: destination.to_path_buf(),
        source,
    })?;

    let processed = AtomicUsize::new(0);
    let failed = AtomicUsize::new(errors.len());

    files.par_iter().for_each(|path| {
        match transform_file(path, destination, transform) {
            Ok(output) => {
                info!(source = %path.display(), output = %output.display(), "saved image");
                processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                error!("{e}");
                failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    });

    Ok(TransformSummary {
        processed: processed.into_inner(),
        failed: failed.into_inner(),
    })
}

/// Decode, transform and save a single image. Returns the output path.
pub fn transform_file(
    path: &Path,
    destination: &Path,
    transform: &dyn Transform,
) -> Result<PathBuf, TransformError> {
    let image = image::open(path).map_err(|e| TransformError::Load {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let image = transform.apply(image)?;

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let output = destination.join(transform.output_name(&stem));
    save_jpeg(&image, &output)?;
    Ok(output)
}

fn save_jpeg(image: &DynamicImage, output: &Path) -> Result<(), TransformError> {
    let save_error = |reason: String| TransformError::Save {
        path: output.to_path_buf(),
        reason,
    };
    let file = File::create(output).map_err(|e| save_error(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, OUTPUT_QUALITY);
    // JPEG has no alpha channel
    DynamicImage::ImageRgb8(image.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| save_error(e.to_string()))?;
    writer.flush().map_err(|e| save_error(e.to_string()))
}
