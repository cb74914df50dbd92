use std::str::FromStr;

use crate::foundation::error::{DrawStepsError, DrawStepsResult};

pub use kurbo::{BezPath, Point, Rect};

/// Smallest accepted grid density (cells per axis).
pub const MIN_GRID_DENSITY: u32 = 4;
/// Largest accepted grid density (cells per axis).
pub const MAX_GRID_DENSITY: u32 = 16;

/// Paper format the steps are drawn on.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    A4,
    A3,
    Square,
}

impl PaperSize {
    pub const ALL: [PaperSize; 3] = [PaperSize::A4, PaperSize::A3, PaperSize::Square];

    /// Canvas size in pixels at 150 DPI (portrait).
    pub fn pixel_size(self) -> (u32, u32) {
        match self {
            PaperSize::A4 => (1240, 1754),
            PaperSize::A3 => (1754, 2480),
            PaperSize::Square => (1500, 1500),
        }
    }

    /// Width / height.
    pub fn aspect(self) -> f64 {
        let (w, h) = self.pixel_size();
        f64::from(w) / f64::from(h)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PaperSize::A4 => "a4",
            PaperSize::A3 => "a3",
            PaperSize::Square => "square",
        }
    }
}

impl FromStr for PaperSize {
    type Err = DrawStepsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PaperSize::A4),
            "a3" => Ok(PaperSize::A3),
            "square" => Ok(PaperSize::Square),
            other => Err(DrawStepsError::invalid_config(format!(
                "unknown paper size '{other}' (expected a4, a3 or square)"
            ))),
        }
    }
}

impl std::fmt::Display for PaperSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grid overlay handed to renderers: cells per axis plus the paper format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridSpec {
    pub density: u32,
    pub paper_size: PaperSize,
}

impl GridSpec {
    pub fn new(density: u32, paper_size: PaperSize) -> DrawStepsResult<Self> {
        if !(MIN_GRID_DENSITY..=MAX_GRID_DENSITY).contains(&density) {
            return Err(DrawStepsError::invalid_config(format!(
                "grid density {density} is outside [{MIN_GRID_DENSITY}, {MAX_GRID_DENSITY}]"
            )));
        }
        Ok(Self {
            density,
            paper_size,
        })
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

/// Placement of the working image inside the paper's drawing area.
///
/// The drawing area is the paper minus a uniform margin; the image is scaled to fit it while
/// preserving aspect and centred on the free axis. Geometry is stored normalised to the image
/// (`[0, 1]` on both axes), so `to_paper` is all a renderer needs to place it.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CanvasFit {
    /// Drawing area (grid bounds) in paper pixels.
    pub draw_area: Rect,
    /// Where the image lands inside `draw_area`, in paper pixels.
    pub image_rect: Rect,
}

impl CanvasFit {
    pub const MARGIN_FRACTION: f64 = 0.05;

    pub fn new(image_width: u32, image_height: u32, paper: PaperSize) -> Self {
        let (pw, ph) = paper.pixel_size();
        let (pw, ph) = (f64::from(pw), f64::from(ph));
        let mx = (pw * Self::MARGIN_FRACTION).floor();
        let my = (ph * Self::MARGIN_FRACTION).floor();
        let draw_area = Rect::new(mx, my, pw - mx, ph - my);

        let image_aspect = f64::from(image_width.max(1)) / f64::from(image_height.max(1));
        let area_aspect = draw_area.width() / draw_area.height();
        let (render_w, render_h) = if image_aspect > area_aspect {
            (draw_area.width(), draw_area.width() / image_aspect)
        } else {
            (draw_area.height() * image_aspect, draw_area.height())
        };
        let x0 = draw_area.x0 + (draw_area.width() - render_w) / 2.0;
        let y0 = draw_area.y0 + (draw_area.height() - render_h) / 2.0;

        Self {
            draw_area,
            image_rect: Rect::new(x0, y0, x0 + render_w, y0 + render_h),
        }
    }

    /// Map an image-normalised point into paper pixels.
    pub fn to_paper(&self, p: Point) -> Point {
        Point::new(
            self.image_rect.x0 + p.x * self.image_rect.width(),
            self.image_rect.y0 + p.y * self.image_rect.height(),
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
