use crate::{
    config::{BatchConfig, PhaseThresholds},
    plan::score::ShapeScore,
};

/// Stage of the drawing sequence. Declaration order is plan order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Preparation,
    PrimaryOutline,
    SecondaryShapes,
    InternalDetails,
    FineDetails,
    Texture,
    Shading,
}

impl Phase {
    pub const ALL: [Phase; 7] = [
        Phase::Preparation,
        Phase::PrimaryOutline,
        Phase::SecondaryShapes,
        Phase::InternalDetails,
        Phase::FineDetails,
        Phase::Texture,
        Phase::Shading,
    ];

    /// Phases filled from scored contours, in plan order.
    pub const CONTOUR_PHASES: [Phase; 5] = [
        Phase::PrimaryOutline,
        Phase::SecondaryShapes,
        Phase::InternalDetails,
        Phase::FineDetails,
        Phase::Texture,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Phase::Preparation => "Preparation",
            Phase::PrimaryOutline => "Primary Outline",
            Phase::SecondaryShapes => "Secondary Shapes",
            Phase::InternalDetails => "Internal Details",
            Phase::FineDetails => "Fine Details",
            Phase::Texture => "Texture & Finishing",
            Phase::Shading => "Shading",
        }
    }

    pub fn instruction(self) -> &'static str {
        match self {
            Phase::Preparation => "Your blank grid: start drawing at the marked point",
            Phase::PrimaryOutline => "Draw the main outer shape: the overall silhouette",
            Phase::SecondaryShapes => "Add large internal structures and secondary outlines",
            Phase::InternalDetails => "Draw inner features and medium-sized details",
            Phase::FineDetails => "Add fine lines and smaller shapes",
            Phase::Texture => "Add textures, tiny details and finishing touches",
            Phase::Shading => "Add shading: fill in shadow and mid-tone regions",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Preparation => "preparation",
            Phase::PrimaryOutline => "primary_outline",
            Phase::SecondaryShapes => "secondary_shapes",
            Phase::InternalDetails => "internal_details",
            Phase::FineDetails => "fine_details",
            Phase::Texture => "texture",
            Phase::Shading => "shading",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked contour with its phase.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoredContour {
    pub score: ShapeScore,
    pub phase: Phase,
}

/// How many contours one step of a phase may hold, and how many steps the phase aims for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PhaseBudget {
    pub max_per_batch: usize,
    pub target_steps: usize,
}

impl PhaseBudget {
    /// Budget for `phase` at `density`; `None` for Preparation and Shading.
    pub fn for_density(phase: Phase, density: u32, cfg: &BatchConfig) -> Option<Self> {
        let base = cfg.base_batch_size.get(phase)?;
        let factor = cfg.steps_factor.get(phase)?;
        let (d, r) = (f64::from(density.max(1)), f64::from(cfg.reference_density));
        let max_per_batch = ((base as f64 * r / d).ceil() as usize).max(1);
        let target_steps = (d * factor / r).ceil() as usize;
        Some(Self {
            max_per_batch,
            target_steps,
        })
    }
}

/// Assigns each ranked contour exactly one contour phase.
#[derive(Clone, Debug)]
pub struct PhasePlanner<'a> {
    thresholds: &'a PhaseThresholds,
}

impl<'a> PhasePlanner<'a> {
    pub fn new(thresholds: &'a PhaseThresholds) -> Self {
        Self { thresholds }
    }

    /// First matching rule wins; every boundary value lands in the coarser phase.
    pub fn classify(&self, s: &ShapeScore) -> Phase {
        let t = self.thresholds;
        let c = &s.components;
        if s.depth == 0 && c.area >= t.primary_area {
            Phase::PrimaryOutline
        } else if s.depth <= t.secondary_max_depth && c.area >= t.secondary_area {
            Phase::SecondaryShapes
        } else if s.composite >= t.internal_score {
            Phase::InternalDetails
        } else if c.complexity > t.texture_complexity && c.area < t.texture_area {
            Phase::Texture
        } else {
            Phase::FineDetails
        }
    }

    /// Classify ranked scores, keeping rank order.
    pub fn assign(&self, ranked: Vec<ShapeScore>) -> Vec<ScoredContour> {
        ranked
            .into_iter()
            .map(|score| ScoredContour {
                phase: self.classify(&score),
                score,
            })
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/phase.rs"]
mod tests;
