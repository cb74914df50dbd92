//! Turning an analysed image into an ordered, density-aware step sequence.

pub mod batch;
pub mod generator;
pub mod phase;
pub mod score;
pub mod step_plan;

pub use batch::{batch_count, batch_phase};
pub use generator::{StepPlanGenerator, generate_plan};
pub use phase::{Phase, PhaseBudget, PhasePlanner, ScoredContour};
pub use score::{ScoreComponents, ShapeScore, composite, rank_contours};
pub use step_plan::{GeometryRef, StepPlan, StepSpec};
