use std::path::Path;

use anyhow::Context;

use crate::{
    foundation::core::{GridSpec, PaperSize},
    foundation::error::{DrawStepsError, DrawStepsResult},
    plan::phase::Phase,
};

/// Everything a plan generation depends on.
///
/// `paper_size` and `grid_density` are the per-request knobs; the remaining sections are tuning
/// parameters with defaults that work for photographs and line art at up to 1024 px.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanConfig {
    pub paper_size: PaperSize,
    /// Grid cells per axis, `[4, 16]`.
    pub grid_density: u32,
    /// Append shading steps when the image has tone variation.
    pub include_shading: bool,
    pub preprocess: PreprocessConfig,
    pub extract: ExtractConfig,
    pub scoring: ScoringWeights,
    pub phases: PhaseThresholds,
    pub batching: BatchConfig,
    pub tone: ToneConfig,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            paper_size: PaperSize::A4,
            grid_density: 8,
            include_shading: true,
            preprocess: PreprocessConfig::default(),
            extract: ExtractConfig::default(),
            scoring: ScoringWeights::default(),
            phases: PhaseThresholds::default(),
            batching: BatchConfig::default(),
            tone: ToneConfig::default(),
        }
    }
}

impl PlanConfig {
    pub fn new(paper_size: PaperSize, grid_density: u32) -> DrawStepsResult<Self> {
        let cfg = Self {
            paper_size,
            grid_density,
            ..Self::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_str(s: &str) -> DrawStepsResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| DrawStepsError::invalid_config(format!("parse config json: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> DrawStepsResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config from '{}'", path.display()))?;
        Self::from_json_str(&s)
    }

    pub fn grid(&self) -> DrawStepsResult<GridSpec> {
        GridSpec::new(self.grid_density, self.paper_size)
    }

    pub fn validate(&self) -> DrawStepsResult<()> {
        self.grid()?;
        self.preprocess.validate()?;
        self.extract.validate()?;
        self.scoring.validate()?;
        self.phases.validate()?;
        self.batching.validate()?;
        self.tone.validate()?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessConfig {
    /// Longest side of the working image. Larger inputs are downscaled, smaller ones kept.
    pub working_max_side: u32,
    /// Minimum luminance spread (max - min) for an image to be considered non-empty.
    pub min_luminance_range: u8,
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Target band for edge pixels / total pixels.
    pub min_edge_density: f64,
    pub max_edge_density: f64,
    /// Factor applied to both Canny thresholds on the single retry.
    pub threshold_step: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            working_max_side: 1024,
            min_luminance_range: 8,
            blur_sigma: 1.0,
            canny_low: 40.0,
            canny_high: 120.0,
            min_edge_density: 0.001,
            max_edge_density: 0.12,
            threshold_step: 2.0,
        }
    }
}

impl PreprocessConfig {
    fn validate(&self) -> DrawStepsResult<()> {
        if self.working_max_side < 16 {
            return Err(DrawStepsError::invalid_config(
                "preprocess.working_max_side must be >= 16",
            ));
        }
        if !(self.blur_sigma.is_finite() && self.blur_sigma > 0.0) {
            return Err(DrawStepsError::invalid_config(
                "preprocess.blur_sigma must be > 0",
            ));
        }
        if !(self.canny_low.is_finite() && self.canny_low > 0.0 && self.canny_high >= self.canny_low)
        {
            return Err(DrawStepsError::invalid_config(
                "preprocess canny thresholds must satisfy 0 < low <= high",
            ));
        }
        if !(0.0..1.0).contains(&self.min_edge_density)
            || !(self.min_edge_density < self.max_edge_density && self.max_edge_density <= 1.0)
        {
            return Err(DrawStepsError::invalid_config(
                "preprocess edge density band must satisfy 0 <= min < max <= 1",
            ));
        }
        if !(self.threshold_step.is_finite() && self.threshold_step > 1.0) {
            return Err(DrawStepsError::invalid_config(
                "preprocess.threshold_step must be > 1",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractConfig {
    /// Dilation radius (L-infinity) applied to the edge mask before border following.
    pub dilate_radius: u8,
    /// Closing radius (L-infinity) applied after dilation. Bridges the two parallel Canny
    /// edges of one drawn line so the line traces as a single band.
    pub close_radius: u8,
    /// Noise floor as a fraction of the image area. Shared with tone zones.
    pub min_area_fraction: f64,
    /// Perimeter floor as a fraction of the longest image side.
    pub min_perimeter_fraction: f64,
    /// Widest edge band, in pixels, that still counts as one stroke. Holes whose gap to the
    /// parent border, or whose own width, is at most this fold into the parent.
    pub max_stroke_width: f64,
    /// Douglas-Peucker tolerance as a fraction of each contour's arc length.
    pub simplify_tolerance: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        let (dilate_radius, close_radius) = (1, 2);
        Self {
            dilate_radius,
            close_radius,
            min_area_fraction: 0.0005,
            min_perimeter_fraction: 0.02,
            max_stroke_width: Self::stroke_band_width(dilate_radius, close_radius),
            simplify_tolerance: 0.002,
        }
    }
}

impl ExtractConfig {
    /// Widest band one drawn line leaves in the edge mask: the two Canny edges, each dilated
    /// on both sides, the gap the closing bridges between them, and a pixel of tracing slack.
    pub fn stroke_band_width(dilate_radius: u8, close_radius: u8) -> f64 {
        let (d, c) = (f64::from(dilate_radius), f64::from(close_radius));
        2.0 * (2.0 * d + 1.0) + 2.0 * c + 1.0
    }

    fn validate(&self) -> DrawStepsResult<()> {
        if !(0.0..1.0).contains(&self.min_area_fraction) {
            return Err(DrawStepsError::invalid_config(
                "extract.min_area_fraction must be in [0, 1)",
            ));
        }
        if !(0.0..1.0).contains(&self.min_perimeter_fraction) {
            return Err(DrawStepsError::invalid_config(
                "extract.min_perimeter_fraction must be in [0, 1)",
            ));
        }
        if !(self.max_stroke_width.is_finite() && self.max_stroke_width >= 0.0) {
            return Err(DrawStepsError::invalid_config(
                "extract.max_stroke_width must be >= 0",
            ));
        }
        if !(self.simplify_tolerance.is_finite() && (0.0..0.5).contains(&self.simplify_tolerance))
        {
            return Err(DrawStepsError::invalid_config(
                "extract.simplify_tolerance must be in [0, 0.5)",
            ));
        }
        Ok(())
    }
}

/// Weights of the composite importance score.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringWeights {
    pub area: f64,
    pub depth: f64,
    pub centrality: f64,
    /// Penalty weight for arc-length-heavy shapes.
    pub complexity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            area: 0.35,
            depth: 0.35,
            centrality: 0.10,
            complexity: 0.20,
        }
    }
}

impl ScoringWeights {
    pub fn total(&self) -> f64 {
        self.area + self.depth + self.centrality + self.complexity
    }

    fn validate(&self) -> DrawStepsResult<()> {
        for (name, w) in [
            ("area", self.area),
            ("depth", self.depth),
            ("centrality", self.centrality),
            ("complexity", self.complexity),
        ] {
            if !(w.is_finite() && w >= 0.0) {
                return Err(DrawStepsError::invalid_config(format!(
                    "scoring.{name} must be finite and >= 0"
                )));
            }
        }
        if self.total() <= 0.0 {
            return Err(DrawStepsError::invalid_config(
                "scoring weights must not all be zero",
            ));
        }
        Ok(())
    }
}

/// Boundaries of the phase decision cascade. Area values are relative to the largest contour.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PhaseThresholds {
    pub primary_area: f64,
    pub secondary_area: f64,
    pub secondary_max_depth: u32,
    pub internal_score: f64,
    pub texture_complexity: f64,
    pub texture_area: f64,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            primary_area: 0.25,
            secondary_area: 0.05,
            secondary_max_depth: 1,
            internal_score: 0.45,
            texture_complexity: 0.6,
            texture_area: 0.02,
        }
    }
}

impl PhaseThresholds {
    fn validate(&self) -> DrawStepsResult<()> {
        for (name, v) in [
            ("primary_area", self.primary_area),
            ("secondary_area", self.secondary_area),
            ("internal_score", self.internal_score),
            ("texture_complexity", self.texture_complexity),
            ("texture_area", self.texture_area),
        ] {
            if !(v.is_finite() && (0.0..=1.0).contains(&v)) {
                return Err(DrawStepsError::invalid_config(format!(
                    "phases.{name} must be in [0, 1]"
                )));
            }
        }
        if self.secondary_area > self.primary_area {
            return Err(DrawStepsError::invalid_config(
                "phases.secondary_area must be <= phases.primary_area",
            ));
        }
        Ok(())
    }
}

/// One value per scoring-driven phase.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerPhase<T> {
    pub primary_outline: T,
    pub secondary_shapes: T,
    pub internal_details: T,
    pub fine_details: T,
    pub texture: T,
}

impl<T: Copy> PerPhase<T> {
    /// `None` for the orchestrator-owned phases (Preparation, Shading).
    pub fn get(&self, phase: Phase) -> Option<T> {
        match phase {
            Phase::Preparation | Phase::Shading => None,
            Phase::PrimaryOutline => Some(self.primary_outline),
            Phase::SecondaryShapes => Some(self.secondary_shapes),
            Phase::InternalDetails => Some(self.internal_details),
            Phase::FineDetails => Some(self.fine_details),
            Phase::Texture => Some(self.texture),
        }
    }

    fn values(&self) -> [T; 5] {
        [
            self.primary_outline,
            self.secondary_shapes,
            self.internal_details,
            self.fine_details,
            self.texture,
        ]
    }
}

/// How grid density turns into batches.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    /// Density at which `base_batch_size` and `steps_factor` apply unscaled.
    pub reference_density: u32,
    pub max_steps_per_phase: usize,
    /// Contours per batch at the reference density.
    pub base_batch_size: PerPhase<usize>,
    /// Target steps per phase at the reference density.
    pub steps_factor: PerPhase<f64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            reference_density: 8,
            max_steps_per_phase: 6,
            base_batch_size: PerPhase {
                primary_outline: 3,
                secondary_shapes: 5,
                internal_details: 8,
                fine_details: 12,
                texture: 24,
            },
            steps_factor: PerPhase {
                primary_outline: 0.5,
                secondary_shapes: 1.0,
                internal_details: 1.0,
                fine_details: 1.0,
                texture: 0.5,
            },
        }
    }
}

impl BatchConfig {
    fn validate(&self) -> DrawStepsResult<()> {
        if self.reference_density == 0 {
            return Err(DrawStepsError::invalid_config(
                "batching.reference_density must be > 0",
            ));
        }
        if self.max_steps_per_phase == 0 {
            return Err(DrawStepsError::invalid_config(
                "batching.max_steps_per_phase must be > 0",
            ));
        }
        if self.base_batch_size.values().contains(&0) {
            return Err(DrawStepsError::invalid_config(
                "batching.base_batch_size entries must be > 0",
            ));
        }
        if self
            .steps_factor
            .values()
            .iter()
            .any(|f| !(f.is_finite() && *f > 0.0))
        {
            return Err(DrawStepsError::invalid_config(
                "batching.steps_factor entries must be > 0",
            ));
        }
        Ok(())
    }
}

/// How the two tone thresholds are chosen.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ToneThresholds {
    /// Fixed luminance cut points: `<= dark_max` is dark, `<= mid_max` is mid, rest light.
    Absolute { dark_max: u8, mid_max: u8 },
    /// Cut points at luminance quantiles of the smoothed image.
    Quantile { dark: f64, light: f64 },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToneConfig {
    pub blur_sigma: f32,
    pub thresholds: ToneThresholds,
    /// Opening radius (L-infinity) applied to each band mask before zones are traced.
    pub open_radius: u8,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 2.0,
            thresholds: ToneThresholds::Absolute {
                dark_max: 80,
                mid_max: 180,
            },
            open_radius: 3,
        }
    }
}

impl ToneConfig {
    fn validate(&self) -> DrawStepsResult<()> {
        if !(self.blur_sigma.is_finite() && self.blur_sigma > 0.0) {
            return Err(DrawStepsError::invalid_config("tone.blur_sigma must be > 0"));
        }
        match self.thresholds {
            ToneThresholds::Absolute { dark_max, mid_max } => {
                if dark_max >= mid_max || mid_max == u8::MAX {
                    return Err(DrawStepsError::invalid_config(
                        "tone thresholds must satisfy dark_max < mid_max < 255",
                    ));
                }
            }
            ToneThresholds::Quantile { dark, light } => {
                if !(dark.is_finite() && light.is_finite() && 0.0 < dark && dark < light && light < 1.0)
                {
                    return Err(DrawStepsError::invalid_config(
                        "tone quantiles must satisfy 0 < dark < light < 1",
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
