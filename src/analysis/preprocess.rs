use anyhow::Context;
use image::{DynamicImage, GrayImage, imageops::FilterType};
use imageproc::{edges::canny, filter::gaussian_blur_f32};

use crate::{
    config::PreprocessConfig,
    foundation::error::{DrawStepsError, DrawStepsResult},
};

/// Binary edge map at working resolution (0 = background, 255 = edge).
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeMask {
    image: GrayImage,
    edge_pixels: u64,
}

impl EdgeMask {
    /// Wrap a mask; any non-zero pixel is an edge.
    pub fn from_binary(mut image: GrayImage) -> Self {
        let mut edge_pixels = 0u64;
        for p in image.pixels_mut() {
            if p.0[0] != 0 {
                p.0[0] = 255;
                edge_pixels += 1;
            }
        }
        Self { image, edge_pixels }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn edge_pixels(&self) -> u64 {
        self.edge_pixels
    }

    /// Edge pixels / total pixels.
    pub fn density(&self) -> f64 {
        let total = u64::from(self.width()) * u64::from(self.height());
        if total == 0 {
            return 0.0;
        }
        self.edge_pixels as f64 / total as f64
    }

    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] != 0
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }
}

/// Output of preprocessing: the working-resolution luminance plus its edge map.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Resized 8-bit luminance (unsmoothed).
    pub gray: GrayImage,
    pub edges: EdgeMask,
    /// Dimensions of the decoded source before resizing.
    pub source_width: u32,
    pub source_height: u32,
}

impl PreparedImage {
    pub fn width(&self) -> u32 {
        self.gray.width()
    }

    pub fn height(&self) -> u32 {
        self.gray.height()
    }
}

/// Decode encoded image bytes (any format the `image` crate recognises).
pub fn decode_image(bytes: &[u8]) -> DrawStepsResult<DynamicImage> {
    let img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(img)
}

/// Decode and preprocess in one call.
pub fn preprocess_bytes(bytes: &[u8], cfg: &PreprocessConfig) -> DrawStepsResult<PreparedImage> {
    let img = decode_image(bytes)?;
    preprocess_image(&img, cfg)
}

#[tracing::instrument(skip(img, cfg), fields(w = img.width(), h = img.height()))]
pub fn preprocess_image(img: &DynamicImage, cfg: &PreprocessConfig) -> DrawStepsResult<PreparedImage> {
    let (source_width, source_height) = (img.width(), img.height());
    if source_width == 0 || source_height == 0 {
        return Err(DrawStepsError::empty_image("image has zero size"));
    }

    let gray = resize_to_working(img, cfg.working_max_side).to_luma8();

    let range = luminance_range(&gray);
    if range < cfg.min_luminance_range {
        return Err(DrawStepsError::empty_image(format!(
            "luminance range {range} is below {}",
            cfg.min_luminance_range
        )));
    }

    let edges = detect_edges(&gray, cfg);
    if edges.edge_pixels() == 0 {
        return Err(DrawStepsError::empty_image(
            "no edges detected after threshold retry",
        ));
    }

    tracing::debug!(
        width = gray.width(),
        height = gray.height(),
        edge_density = edges.density(),
        "preprocessed image"
    );

    Ok(PreparedImage {
        gray,
        edges,
        source_width,
        source_height,
    })
}

/// Downscale so the longest side is at most `max_side`; never upscales.
fn resize_to_working(img: &DynamicImage, max_side: u32) -> DynamicImage {
    if img.width().max(img.height()) <= max_side {
        return img.clone();
    }
    img.resize(max_side, max_side, FilterType::CatmullRom)
}

fn luminance_range(gray: &GrayImage) -> u8 {
    let (mut lo, mut hi) = (u8::MAX, u8::MIN);
    for p in gray.pixels() {
        lo = lo.min(p.0[0]);
        hi = hi.max(p.0[0]);
    }
    hi.saturating_sub(lo)
}

/// Canny with one density-driven retry: too dense raises both thresholds by
/// `threshold_step`, too sparse lowers them by the same factor.
fn detect_edges(gray: &GrayImage, cfg: &PreprocessConfig) -> EdgeMask {
    let smoothed = gaussian_blur_f32(gray, cfg.blur_sigma);
    let first = EdgeMask::from_binary(canny(&smoothed, cfg.canny_low, cfg.canny_high));
    let density = first.density();

    let factor = if density > cfg.max_edge_density {
        cfg.threshold_step
    } else if density < cfg.min_edge_density {
        1.0 / cfg.threshold_step
    } else {
        return first;
    };

    let (low, high) = (cfg.canny_low * factor, cfg.canny_high * factor);
    tracing::debug!(density, low, high, "edge density outside band, retrying");
    EdgeMask::from_binary(canny(&smoothed, low, high))
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/preprocess.rs"]
mod tests;
