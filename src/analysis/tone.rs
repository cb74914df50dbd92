use std::collections::HashMap;

use image::{GrayImage, Luma};
use imageproc::{
    contours::{BorderType, find_contours},
    distance_transform::Norm,
    filter::gaussian_blur_f32,
    geometry::{arc_length, contour_area},
    morphology::open,
    region_labelling::{Connectivity, connected_components},
};
use kurbo::{Point, Rect};

use crate::{
    analysis::contour::simplify_ring,
    config::{ExtractConfig, ToneConfig, ToneThresholds},
};

/// Luminance band, ordered dark first.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ToneBand {
    Dark,
    Mid,
    Light,
}

impl ToneBand {
    pub const ALL: [ToneBand; 3] = [ToneBand::Dark, ToneBand::Mid, ToneBand::Light];

    pub fn as_str(self) -> &'static str {
        match self {
            ToneBand::Dark => "dark",
            ToneBand::Mid => "mid",
            ToneBand::Light => "light",
        }
    }

    /// Grey level used when posterising an image into bands.
    pub fn preview_level(self) -> u8 {
        match self {
            ToneBand::Dark => 0,
            ToneBand::Mid => 128,
            ToneBand::Light => 255,
        }
    }

    fn from_level(level: u8) -> Self {
        match level {
            0 => ToneBand::Dark,
            128 => ToneBand::Mid,
            _ => ToneBand::Light,
        }
    }
}

impl std::fmt::Display for ToneBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ZoneId(pub u32);

impl ZoneId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "z{}", self.0)
    }
}

/// Connected region of one luminance band.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToneZone {
    pub id: ZoneId,
    pub band: ToneBand,
    pub outer: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
    pub pixel_count: u64,
    /// Pixel-space bounds, inclusive of the last row/column.
    pub bounding_box: Rect,
}

/// Share of the working image in each band, in percent.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToneSummary {
    pub dark_percent: f64,
    pub mid_percent: f64,
    pub light_percent: f64,
}

impl ToneSummary {
    pub fn percent(&self, band: ToneBand) -> f64 {
        match band {
            ToneBand::Dark => self.dark_percent,
            ToneBand::Mid => self.mid_percent,
            ToneBand::Light => self.light_percent,
        }
    }
}

/// Tone zones of one image, dark band first.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToneMap {
    width: u32,
    height: u32,
    zones: Vec<ToneZone>,
    summary: ToneSummary,
}

impl ToneMap {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn zones(&self) -> &[ToneZone] {
        &self.zones
    }

    #[cfg(test)]
    pub(crate) fn zones_mut(&mut self) -> &mut [ToneZone] {
        &mut self.zones
    }

    pub fn get(&self, id: ZoneId) -> Option<&ToneZone> {
        self.zones.get(id.index())
    }

    pub fn summary(&self) -> ToneSummary {
        self.summary
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Bands that carry at least one zone, in dark-to-light order.
    pub fn bands(&self) -> Vec<ToneBand> {
        ToneBand::ALL
            .into_iter()
            .filter(|b| self.zones.iter().any(|z| z.band == *b))
            .collect()
    }

    pub fn zones_in(&self, band: ToneBand) -> impl Iterator<Item = &ToneZone> {
        self.zones.iter().filter(move |z| z.band == band)
    }

    pub fn normalize(&self, p: Point) -> Point {
        Point::new(
            p.x / f64::from(self.width.max(1)),
            p.y / f64::from(self.height.max(1)),
        )
    }
}

/// Cut points `(dark_max, mid_max)`: `<= dark_max` is dark, `<= mid_max` is mid.
fn resolve_thresholds(smoothed: &GrayImage, thresholds: ToneThresholds) -> (u8, u8) {
    match thresholds {
        ToneThresholds::Absolute { dark_max, mid_max } => (dark_max, mid_max),
        ToneThresholds::Quantile { dark, light } => {
            let mut hist = [0u64; 256];
            for p in smoothed.pixels() {
                hist[usize::from(p.0[0])] += 1;
            }
            let total = smoothed.pixels().len() as f64;
            let quantile = |q: f64| -> u8 {
                let target = q * total;
                let mut acc = 0u64;
                for (level, &n) in hist.iter().enumerate() {
                    acc += n;
                    if acc as f64 >= target {
                        return level as u8;
                    }
                }
                u8::MAX
            };
            (quantile(dark), quantile(light))
        }
    }
}

/// Posterise to three grey levels (see [`ToneBand::preview_level`]) after smoothing.
pub fn classify_tones(gray: &GrayImage, cfg: &ToneConfig) -> GrayImage {
    let smoothed = gaussian_blur_f32(gray, cfg.blur_sigma);
    let (dark_max, mid_max) = resolve_thresholds(&smoothed, cfg.thresholds);
    GrayImage::from_fn(smoothed.width(), smoothed.height(), |x, y| {
        let v = smoothed.get_pixel(x, y).0[0];
        let band = if v <= dark_max {
            ToneBand::Dark
        } else if v <= mid_max {
            ToneBand::Mid
        } else {
            ToneBand::Light
        };
        Luma([band.preview_level()])
    })
}

struct Component {
    band: ToneBand,
    pixel_count: u64,
    first_pixel: u64,
    min: (u32, u32),
    max: (u32, u32),
}

/// Segment the working image into dark, mid and light zones.
///
/// Band regions narrower than `2 * open_radius + 1` pixels are opened away, and components
/// smaller than the contour noise floor are dropped. Unless the surviving zones other than the
/// background span at least two bands, the subject has no tone variation and the map has no
/// zones. The summary is reported either way.
#[tracing::instrument(skip_all, fields(w = gray.width(), h = gray.height()))]
pub fn map_tones(gray: &GrayImage, cfg: &ToneConfig, extract: &ExtractConfig) -> ToneMap {
    let (width, height) = gray.dimensions();
    let total = u64::from(width) * u64::from(height);
    if total == 0 {
        return ToneMap::default();
    }

    let classes = classify_tones(gray, cfg);
    let mut counts = [0u64; 3];
    for p in classes.pixels() {
        counts[ToneBand::from_level(p.0[0]) as usize] += 1;
    }
    let pct = |n: u64| n as f64 * 100.0 / total as f64;
    let summary = ToneSummary {
        dark_percent: pct(counts[0]),
        mid_percent: pct(counts[1]),
        light_percent: pct(counts[2]),
    };

    let min_pixels = (extract.min_area_fraction * total as f64).ceil().max(1.0) as u64;
    let mut zones = Vec::new();
    for band in ToneBand::ALL {
        zones.extend(band_zones(&classes, band, min_pixels, cfg.open_radius, extract));
    }

    let bands_present = subject_bands(&zones, width, height);
    if bands_present < 2 {
        tracing::debug!(bands_present, "no tone variation, skipping zones");
        zones.clear();
    }
    for (i, z) in zones.iter_mut().enumerate() {
        z.id = ZoneId(i as u32);
    }

    tracing::debug!(zones = zones.len(), ?summary, "mapped tones");
    ToneMap {
        width,
        height,
        zones,
        summary,
    }
}

/// Bands spanned by the zones other than the background, which is the largest zone touching
/// the image border.
fn subject_bands(zones: &[ToneZone], width: u32, height: u32) -> usize {
    let (right, bottom) = (f64::from(width) - 1.0, f64::from(height) - 1.0);
    let touches_border = |z: &ToneZone| {
        let r = z.bounding_box;
        r.x0 <= 0.0 || r.y0 <= 0.0 || r.x1 >= right || r.y1 >= bottom
    };
    let background = zones
        .iter()
        .enumerate()
        .filter(|(_, z)| touches_border(z))
        .max_by(|(i, a), (j, b)| a.pixel_count.cmp(&b.pixel_count).then(j.cmp(i)))
        .map(|(i, _)| i);
    ToneBand::ALL
        .iter()
        .filter(|band| {
            zones
                .iter()
                .enumerate()
                .any(|(i, z)| Some(i) != background && z.band == **band)
        })
        .count()
}

fn band_zones(
    classes: &GrayImage,
    band: ToneBand,
    min_pixels: u64,
    open_radius: u8,
    extract: &ExtractConfig,
) -> Vec<ToneZone> {
    let level = band.preview_level();
    let width = classes.width();
    let raw = GrayImage::from_fn(width, classes.height(), |x, y| {
        Luma([if classes.get_pixel(x, y).0[0] == level { 255 } else { 0 }])
    });
    // Drawn lines and blur fringes are narrower than the opening and carry no shading.
    let mask = open(&raw, Norm::LInf, open_radius);

    let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));
    let mut components: HashMap<u32, Component> = HashMap::new();
    for (x, y, l) in labels.enumerate_pixels() {
        let label = l.0[0];
        if label == 0 {
            continue;
        }
        let c = components.entry(label).or_insert(Component {
            band,
            pixel_count: 0,
            first_pixel: u64::from(y) * u64::from(width) + u64::from(x),
            min: (x, y),
            max: (x, y),
        });
        c.pixel_count += 1;
        c.min = (c.min.0.min(x), c.min.1.min(y));
        c.max = (c.max.0.max(x), c.max.1.max(y));
    }
    components.retain(|_, c| c.pixel_count >= min_pixels);
    if components.is_empty() {
        return Vec::new();
    }

    // Each component has exactly one outer border; its holes point back at it.
    let borders = find_contours::<i32>(&mask);
    let mut outer_of: HashMap<u32, usize> = HashMap::new();
    let mut holes_of: HashMap<usize, Vec<usize>> = HashMap::new();
    for (i, b) in borders.iter().enumerate() {
        match b.border_type {
            BorderType::Outer => {
                if let Some(p) = b.points.first() {
                    let label = labels.get_pixel(p.x as u32, p.y as u32).0[0];
                    outer_of.insert(label, i);
                }
            }
            BorderType::Hole => {
                if let Some(parent) = b.parent {
                    holes_of.entry(parent).or_default().push(i);
                }
            }
        }
    }

    let mut ordered: Vec<(u32, Component)> = components.into_iter().collect();
    ordered.sort_by(|(_, a), (_, b)| {
        b.pixel_count
            .cmp(&a.pixel_count)
            .then(a.first_pixel.cmp(&b.first_pixel))
    });

    let tolerance = extract.simplify_tolerance;
    let min_hole_area = min_pixels as f64;
    ordered
        .into_iter()
        .filter_map(|(label, c)| {
            let outer_idx = *outer_of.get(&label)?;
            let outer = &borders[outer_idx];
            let holes = holes_of
                .get(&outer_idx)
                .into_iter()
                .flatten()
                .map(|&h| &borders[h])
                .filter(|h| h.points.len() >= 3 && contour_area(&h.points).abs() >= min_hole_area)
                .map(|h| simplify_ring(&h.points, arc_length(&h.points, true), tolerance))
                .collect();
            Some(ToneZone {
                id: ZoneId(0),
                band: c.band,
                outer: simplify_ring(&outer.points, arc_length(&outer.points, true), tolerance),
                holes,
                pixel_count: c.pixel_count,
                bounding_box: Rect::new(
                    f64::from(c.min.0),
                    f64::from(c.min.1),
                    f64::from(c.max.0),
                    f64::from(c.max.1),
                ),
            })
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/tone.rs"]
mod tests;
