//! Image analysis: everything computed once per source image.
//!
//! The products here depend only on the image and the analysis sections of [`PlanConfig`]
//! (`preprocess`, `extract`, `tone`), never on paper size or grid density, which is what lets
//! [`ContourTreeCache`] share them across plan requests.

pub mod cache;
pub mod contour;
pub mod preprocess;
pub mod tone;

use std::sync::Arc;

pub use cache::{CacheStats, ContourTreeCache};
pub use contour::{Contour, ContourId, ContourTree, extract_contours};
pub use preprocess::{EdgeMask, PreparedImage, decode_image, preprocess_bytes, preprocess_image};
pub use tone::{ToneBand, ToneMap, ToneSummary, ToneZone, ZoneId, classify_tones, map_tones};

use crate::{config::PlanConfig, foundation::error::DrawStepsResult};

/// Shared, immutable analysis products of one image.
#[derive(Clone, Debug)]
pub struct ImageAnalysis {
    pub contours: Arc<ContourTree>,
    pub tones: Arc<ToneMap>,
    pub source_width: u32,
    pub source_height: u32,
}

impl ImageAnalysis {
    /// Working-resolution dimensions shared by the contour tree and tone map.
    pub fn working_size(&self) -> (u32, u32) {
        (self.contours.width(), self.contours.height())
    }
}

/// Decode `bytes` and run preprocessing, contour extraction and tone mapping.
pub fn analyze_bytes(bytes: &[u8], cfg: &PlanConfig) -> DrawStepsResult<ImageAnalysis> {
    let prepared = preprocess_bytes(bytes, &cfg.preprocess)?;
    analyze_prepared(&prepared, cfg)
}

#[tracing::instrument(skip_all, fields(w = prepared.width(), h = prepared.height()))]
pub fn analyze_prepared(prepared: &PreparedImage, cfg: &PlanConfig) -> DrawStepsResult<ImageAnalysis> {
    let contours = extract_contours(&prepared.edges, &cfg.extract)?;
    let tones = if cfg.include_shading {
        map_tones(&prepared.gray, &cfg.tone, &cfg.extract)
    } else {
        ToneMap::default()
    };
    Ok(ImageAnalysis {
        contours: Arc::new(contours),
        tones: Arc::new(tones),
        source_width: prepared.source_width,
        source_height: prepared.source_height,
    })
}
