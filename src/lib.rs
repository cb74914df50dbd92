//! drawsteps turns one reference image into an ordered, step-by-step drawing lesson.
//!
//! # Pipeline overview
//!
//! 1. **Preprocess**: `bytes -> PreparedImage` (decode, downscale, luminance, Canny edge mask)
//! 2. **Extract**: `EdgeMask -> ContourTree` (border following, noise floor, nesting depth)
//! 3. **Tone map**: `GrayImage -> ToneMap` (dark / mid / light zones for shading steps)
//! 4. **Plan**: score, phase and batch contours into a `StepPlan` sized by grid density
//! 5. **Render** (delegated): `render_plan` hands each step to a caller-supplied [`StepRenderer`]
//!
//! Steps 1-3 depend only on the image and the analysis settings, so their output can be shared
//! across requests through a [`ContourTreeCache`]. Planning is cheap and re-runs for every paper
//! size and density.
//!
//! Everything is deterministic: the same image bytes and [`PlanConfig`] always produce the same
//! [`StepPlan::dump`] and [`StepPlan::fingerprint`].
#![forbid(unsafe_code)]

mod analysis;
mod config;
mod foundation;
mod plan;
mod render;


pub use analysis::cache::AnalysisKey;
pub use analysis::{
    CacheStats, Contour, ContourId, ContourTree, ContourTreeCache, EdgeMask, ImageAnalysis,
    PreparedImage, ToneBand, ToneMap, ToneSummary, ToneZone, ZoneId, analyze_bytes,
    analyze_prepared, classify_tones, decode_image, extract_contours, map_tones,
    preprocess_bytes, preprocess_image,
};
pub use config::{
    BatchConfig, ExtractConfig, PerPhase, PhaseThresholds, PlanConfig, PreprocessConfig,
    ScoringWeights, ToneConfig, ToneThresholds,
};
pub use foundation::core::{
    BezPath, CanvasFit, GridSpec, MAX_GRID_DENSITY, MIN_GRID_DENSITY, PaperSize, Point, Rect,
    Rgba8Premul,
};
pub use foundation::error::{DrawStepsError, DrawStepsResult};
pub use plan::{
    GeometryRef, Phase, PhaseBudget, PhasePlanner, ScoreComponents, ScoredContour, ShapeScore,
    StepPlan, StepPlanGenerator, StepSpec, batch_count, batch_phase, composite, generate_plan,
    rank_contours,
};
pub use render::{
    CUMULATIVE_COLOR, GRID_COLOR, INCREMENTAL_COLOR, MARKER_COLOR, Raster, RenderRequest,
    RenderShape, StepRenderer, render_plan, shading_color,
};
