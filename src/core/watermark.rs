//! Batch watermarking of JPEG photos.
//!
//! Every `.jpg` under the input folder gets the watermark scaled to a fraction
//! of the limiting dimension, centered and alpha-blended, and is written as
//! JPEG under the output folder with the same relative path.

use glob::{MatchOptions, Pattern};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::defaults::WatermarkConfig;
use crate::error::{Error, Result};
use crate::{io, log_info, log_status, paths};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkedFile {
    pub input: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkOutput {
    pub watermark: String,
    pub output_dir: String,
    pub files: Vec<WatermarkedFile>,
}

fn open_rgba(path: &Path) -> Result<RgbaImage> {
    image::open(path)
        .map(|img| img.to_rgba8())
        .map_err(|e| Error::image_processing_failed(path.display().to_string(), e.to_string()))
}

/// Scaled watermark size for an image, never smaller than 1x1.
pub fn scaled_size(image: (u32, u32), mark: (u32, u32), scale: f32) -> (u32, u32) {
    let ratio = f64::min(
        image.0 as f64 / mark.0 as f64,
        image.1 as f64 / mark.1 as f64,
    ) * scale as f64;
    let width = (mark.0 as f64 * ratio) as u32;
    let height = (mark.1 as f64 * ratio) as u32;
    (width.max(1), height.max(1))
}

/// Overlay `mark` centered on `base`.
pub fn apply(base: &mut RgbaImage, mark: &RgbaImage, scale: f32) {
    let (width, height) = scaled_size(base.dimensions(), mark.dimensions(), scale);
    let resized = imageops::resize(mark, width, height, FilterType::Lanczos3);
    let x = (base.width() as i64 - width as i64) / 2;
    let y = (base.height() as i64 - height as i64) / 2;
    imageops::overlay(base, &resized, x, y);
}

/// `.jpg` files below `input`, case-insensitive, sorted.
/// Anything inside `skip` is left out.
pub fn find_jpegs(input: &Path, skip: Option<&Path>) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/**/*.jpg", Pattern::escape(&input.to_string_lossy()));
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };

    let entries = glob::glob_with(&pattern, options).map_err(|e| {
        Error::validation_invalid_argument("input", e.to_string(), None, Some(vec![pattern.clone()]))
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .filter(|path| match skip {
            Some(skip) => !relative_to(path, input).starts_with(skip),
            None => true,
        })
        .collect();
    files.sort();
    Ok(files)
}

fn relative_to<'a>(path: &'a Path, base: &Path) -> &'a Path {
    path.strip_prefix(base).unwrap_or(path)
}

/// Output folder relative to the input folder, when nested inside it.
fn nested_output(input: &Path, output: &Path) -> Option<PathBuf> {
    let input = input.canonicalize().ok()?;
    let output = output.canonicalize().ok()?;
    output.strip_prefix(&input).ok().map(Path::to_path_buf)
}

/// Watermark every JPEG under `config.input`.
pub fn watermark_folder(config: &WatermarkConfig) -> Result<WatermarkOutput> {
    if config.scale.is_nan() || config.scale <= 0.0 {
        return Err(Error::config_invalid_value(
            "defaults.watermark.scale",
            Some(config.scale.to_string()),
            "Scale must be greater than zero",
        ));
    }

    let input = paths::expand(&config.input)?;
    let output = paths::expand(&config.output)?;
    let watermark_path = paths::expand(&config.watermark)?;

    let mark = open_rgba(&watermark_path)?;
    io::ensure_dir(&output, "create output folder")?;

    let skip = nested_output(&input, &output);
    let mut files = Vec::new();

    for source in find_jpegs(&input, skip.as_deref())? {
        let target = output.join(relative_to(&source, &input));
        if let Some(parent) = target.parent() {
            io::ensure_dir(parent, "create output subfolder")?;
        }

        log_status!("watermark", "Processing {}", source.display());
        let mut base = open_rgba(&source)?;
        apply(&mut base, &mark, config.scale);
        DynamicImage::ImageRgba8(base)
            .to_rgb8()
            .save_with_format(&target, ImageFormat::Jpeg)
            .map_err(|e| Error::image_processing_failed(target.display().to_string(), e.to_string()))?;

        log_info!("Watermarked {} -> {}", source.display(), target.display());
        files.push(WatermarkedFile {
            input: source.display().to_string(),
            output: target.display().to_string(),
        });
    }

    Ok(WatermarkOutput {
        watermark: watermark_path.display().to_string(),
        output_dir: output.display().to_string(),
        files,
    })
}
