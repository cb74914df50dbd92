use std::sync::Arc;

use kurbo::Point;

use crate::{
    analysis::{ContourTreeCache, ImageAnalysis, ToneBand, analyze_bytes},
    config::PlanConfig,
    foundation::core::CanvasFit,
    foundation::error::{DrawStepsError, DrawStepsResult},
    plan::{
        batch::batch_phase,
        phase::{Phase, PhaseBudget, PhasePlanner, ScoredContour},
        score::rank_contours,
        step_plan::{GeometryRef, StepPlan, StepSpec},
    },
};

/// Decode `image_bytes` and build a plan for `config`.
pub fn generate_plan(image_bytes: &[u8], config: &PlanConfig) -> DrawStepsResult<StepPlan> {
    StepPlanGenerator::new(config.clone())?.generate(image_bytes)
}

/// Builds step plans for one validated configuration.
#[derive(Clone, Debug)]
pub struct StepPlanGenerator {
    config: PlanConfig,
}

impl StepPlanGenerator {
    pub fn new(config: PlanConfig) -> DrawStepsResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn generate(&self, image_bytes: &[u8]) -> DrawStepsResult<StepPlan> {
        let analysis = analyze_bytes(image_bytes, &self.config)?;
        self.generate_from_analysis(&analysis)
    }

    /// Like [`generate`](Self::generate), reusing a cached analysis of the same image.
    pub fn generate_with_cache(
        &self,
        image_bytes: &[u8],
        cache: &ContourTreeCache,
    ) -> DrawStepsResult<StepPlan> {
        let analysis = cache.get_or_analyze(image_bytes, &self.config)?;
        self.generate_from_analysis(&analysis)
    }

    /// Score, phase and batch an existing analysis.
    #[tracing::instrument(skip_all, fields(
        density = self.config.grid_density,
        paper = %self.config.paper_size,
        contours = analysis.contours.len(),
    ))]
    pub fn generate_from_analysis(&self, analysis: &ImageAnalysis) -> DrawStepsResult<StepPlan> {
        let cfg = &self.config;
        let tree = Arc::clone(&analysis.contours);
        let tones = if cfg.include_shading {
            Arc::clone(&analysis.tones)
        } else {
            Arc::default()
        };

        let ranked = rank_contours(&tree, &cfg.scoring);
        let scored = PhasePlanner::new(&cfg.phases).assign(ranked);

        let marker_anchor = scored
            .first()
            .and_then(|s| tree.get(s.score.id))
            .map(|c| tree.normalize(c.centroid))
            .unwrap_or(Point::new(0.5, 0.5));

        let mut steps = vec![StepSpec {
            step_index: 0,
            phase: Phase::Preparation,
            title: Phase::Preparation.title().to_string(),
            instruction: Phase::Preparation.instruction().to_string(),
            cumulative: Vec::new(),
            incremental: Vec::new(),
            marker: true,
            tone_band: None,
        }];

        for phase in Phase::CONTOUR_PHASES {
            let members: Vec<GeometryRef> = phase_members(&scored, phase)
                .map(|s| GeometryRef::Contour(s.score.id))
                .collect();
            let budget = PhaseBudget::for_density(phase, cfg.grid_density, &cfg.batching)
                .ok_or_else(|| {
                    DrawStepsError::plan_integrity(format!("phase {phase} has no batch budget"))
                })?;
            let batches = batch_phase(&members, budget, cfg.batching.max_steps_per_phase);
            let total = batches.len();
            for (k, batch) in batches.into_iter().enumerate() {
                steps.push(contour_step(phase, k, total, batch));
            }
        }

        for band in tones.bands() {
            let zones: Vec<GeometryRef> = tones
                .zones_in(band)
                .map(|z| GeometryRef::Zone(z.id))
                .collect();
            steps.push(StepSpec {
                step_index: 0,
                phase: Phase::Shading,
                title: format!("{}: {band} tones", Phase::Shading.title()),
                instruction: shading_instruction(band).to_string(),
                cumulative: Vec::new(),
                incremental: zones,
                marker: false,
                tone_band: Some(band),
            });
        }

        let mut introduced: Vec<GeometryRef> = Vec::new();
        for (i, step) in steps.iter_mut().enumerate() {
            step.step_index = i;
            step.cumulative = introduced.clone();
            introduced.extend_from_slice(&step.incremental);
        }

        let (w, h) = analysis.working_size();
        let plan = StepPlan {
            steps,
            contours: tree,
            tones,
            scored,
            config: cfg.clone(),
            canvas_fit: CanvasFit::new(w, h, cfg.paper_size),
            marker_anchor,
        };
        plan.validate()?;

        tracing::debug!(
            steps = plan.len(),
            per_phase = ?phase_counts(&plan),
            "generated plan"
        );
        Ok(plan)
    }
}

fn contour_step(phase: Phase, k: usize, total: usize, batch: Vec<GeometryRef>) -> StepSpec {
    let title = if total > 1 {
        format!("{} ({} of {total})", phase.title(), k + 1)
    } else {
        phase.title().to_string()
    };
    StepSpec {
        step_index: 0,
        phase,
        title,
        instruction: phase.instruction().to_string(),
        cumulative: Vec::new(),
        incremental: batch,
        marker: false,
        tone_band: None,
    }
}

fn shading_instruction(band: ToneBand) -> &'static str {
    match band {
        ToneBand::Dark => "Fill in the deepest shadows first",
        ToneBand::Mid => "Lay in the mid-tones between shadow and light",
        ToneBand::Light => "Add the lightest tones and leave highlights as paper",
    }
}

fn phase_counts(plan: &StepPlan) -> Vec<(Phase, usize)> {
    Phase::ALL
        .into_iter()
        .map(|p| (p, plan.steps_in(p).count()))
        .filter(|(_, n)| *n > 0)
        .collect()
}

fn phase_members(scored: &[ScoredContour], phase: Phase) -> impl Iterator<Item = &ScoredContour> {
    scored.iter().filter(move |s| s.phase == phase)
}

#[cfg(test)]
#[path = "../../tests/unit/plan/generator.rs"]
mod tests;
