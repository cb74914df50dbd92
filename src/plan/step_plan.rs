use std::{collections::HashSet, fmt::Write as _, sync::Arc};

use kurbo::Point;

use crate::{
    analysis::{
        contour::{ContourId, ContourTree},
        tone::{ToneBand, ToneMap, ToneSummary, ZoneId},
    },
    config::PlanConfig,
    foundation::core::{CanvasFit, GridSpec},
    foundation::error::{DrawStepsError, DrawStepsResult},
    foundation::math::FnvPair,
    plan::phase::{Phase, ScoredContour},
};

/// Geometry owned by a plan: a contour or a tone zone.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum GeometryRef {
    Contour(ContourId),
    Zone(ZoneId),
}

impl std::fmt::Display for GeometryRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryRef::Contour(id) => write!(f, "{id}"),
            GeometryRef::Zone(id) => write!(f, "{id}"),
        }
    }
}

/// One teaching step.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StepSpec {
    pub step_index: usize,
    pub phase: Phase,
    pub title: String,
    pub instruction: String,
    /// Everything introduced by earlier steps, in plan order.
    pub cumulative: Vec<GeometryRef>,
    /// What this step introduces.
    pub incremental: Vec<GeometryRef>,
    /// Show the "Start Here" marker (Preparation only).
    pub marker: bool,
    /// Band shaded by this step, for Shading steps.
    pub tone_band: Option<ToneBand>,
}

/// Ordered step sequence plus the analysis it was built from.
#[derive(Clone, Debug)]
pub struct StepPlan {
    pub(crate) steps: Vec<StepSpec>,
    pub(crate) contours: Arc<ContourTree>,
    pub(crate) tones: Arc<ToneMap>,
    pub(crate) scored: Vec<ScoredContour>,
    pub(crate) config: PlanConfig,
    pub(crate) canvas_fit: CanvasFit,
    pub(crate) marker_anchor: Point,
}

impl StepPlan {
    pub fn steps(&self) -> &[StepSpec] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> Option<&StepSpec> {
        self.steps.get(index)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contours(&self) -> &ContourTree {
        &self.contours
    }

    pub fn tones(&self) -> &ToneMap {
        &self.tones
    }

    /// Ranked contours with their phases.
    pub fn scored(&self) -> &[ScoredContour] {
        &self.scored
    }

    pub fn config(&self) -> &PlanConfig {
        &self.config
    }

    pub fn grid(&self) -> GridSpec {
        GridSpec {
            density: self.config.grid_density,
            paper_size: self.config.paper_size,
        }
    }

    pub fn canvas_fit(&self) -> CanvasFit {
        self.canvas_fit
    }

    /// Where the "Start Here" marker goes, in image-normalised coordinates.
    pub fn marker_anchor(&self) -> Point {
        self.marker_anchor
    }

    pub fn tone_summary(&self) -> ToneSummary {
        self.tones.summary()
    }

    pub fn steps_in(&self, phase: Phase) -> impl Iterator<Item = &StepSpec> {
        self.steps.iter().filter(move |s| s.phase == phase)
    }

    /// Check ordering, cumulation and exactly-once coverage of all contours and zones.
    pub fn validate(&self) -> DrawStepsResult<()> {
        let Some(first) = self.steps.first() else {
            return Err(DrawStepsError::plan_integrity("plan has no steps"));
        };
        if first.phase != Phase::Preparation || !first.marker || !first.incremental.is_empty() {
            return Err(DrawStepsError::plan_integrity(
                "step 0 must be an empty Preparation step with the marker",
            ));
        }

        let mut seen: HashSet<GeometryRef> = HashSet::new();
        let mut introduced: Vec<GeometryRef> = Vec::new();
        let mut prev_phase = Phase::Preparation;
        for (i, step) in self.steps.iter().enumerate() {
            if step.step_index != i {
                return Err(DrawStepsError::plan_integrity(format!(
                    "step at position {i} has index {}",
                    step.step_index
                )));
            }
            if step.phase < prev_phase {
                return Err(DrawStepsError::plan_integrity(format!(
                    "step {i} phase {} precedes {prev_phase}",
                    step.phase
                )));
            }
            if i > 0 && (step.marker || step.phase == Phase::Preparation) {
                return Err(DrawStepsError::plan_integrity(format!(
                    "step {i} repeats the Preparation marker"
                )));
            }
            if i > 0 && step.incremental.is_empty() {
                return Err(DrawStepsError::plan_integrity(format!(
                    "step {i} introduces no geometry"
                )));
            }
            if step.cumulative != introduced {
                return Err(DrawStepsError::plan_integrity(format!(
                    "step {i} cumulative geometry does not match earlier steps"
                )));
            }
            for g in &step.incremental {
                if !seen.insert(*g) {
                    return Err(DrawStepsError::plan_integrity(format!(
                        "{g} introduced twice (again at step {i})"
                    )));
                }
                match g {
                    GeometryRef::Contour(id) if self.contours.get(*id).is_none() => {
                        return Err(DrawStepsError::plan_integrity(format!(
                            "step {i} references unknown contour {id}"
                        )));
                    }
                    GeometryRef::Zone(id) if self.tones.get(*id).is_none() => {
                        return Err(DrawStepsError::plan_integrity(format!(
                            "step {i} references unknown zone {id}"
                        )));
                    }
                    _ => {}
                }
            }
            introduced.extend_from_slice(&step.incremental);
            prev_phase = step.phase;
        }

        let expected = self.contours.len() + self.tones.zones().len();
        if seen.len() != expected {
            return Err(DrawStepsError::plan_integrity(format!(
                "{} of {expected} contours and zones are covered",
                seen.len()
            )));
        }
        Ok(())
    }

    /// Deterministic, line-oriented text rendering of the plan.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let grid = self.grid();
        let _ = writeln!(
            out,
            "plan paper={} density={} steps={} contours={} zones={}",
            grid.paper_size,
            grid.density,
            self.steps.len(),
            self.contours.len(),
            self.tones.zones().len()
        );
        let _ = writeln!(
            out,
            "marker_anchor=({:.4},{:.4})",
            self.marker_anchor.x, self.marker_anchor.y
        );
        for s in &self.steps {
            let _ = write!(
                out,
                "step {} phase={} cumulative={} new=[",
                s.step_index,
                s.phase,
                s.cumulative.len()
            );
            for (i, g) in s.incremental.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{g}");
            }
            out.push(']');
            if s.marker {
                out.push_str(" marker");
            }
            if let Some(band) = s.tone_band {
                let _ = write!(out, " band={band}");
            }
            let _ = writeln!(out, " title=\"{}\"", s.title);
        }
        out
    }

    /// 128-bit fingerprint of the step structure and the geometry it references.
    pub fn fingerprint(&self) -> (u64, u64) {
        let mut h = FnvPair::new();
        h.write_str(self.config.paper_size.as_str());
        h.write_u64(u64::from(self.config.grid_density));
        h.write_f64(self.marker_anchor.x);
        h.write_f64(self.marker_anchor.y);
        for s in &self.steps {
            h.write_u64(s.step_index as u64);
            h.write_u8(s.phase as u8);
            h.write_u8(u8::from(s.marker));
            h.write_u8(s.tone_band.map_or(u8::MAX, |b| b as u8));
            h.write_str(&s.title);
            h.write_u64(s.incremental.len() as u64);
            for g in &s.incremental {
                match g {
                    GeometryRef::Contour(id) => {
                        h.write_u8(b'C');
                        h.write_u64(u64::from(id.0));
                        if let Some(c) = self.contours.get(*id) {
                            h.write_points(&c.points);
                        }
                    }
                    GeometryRef::Zone(id) => {
                        h.write_u8(b'Z');
                        h.write_u64(u64::from(id.0));
                        if let Some(z) = self.tones.get(*id) {
                            h.write_u64(z.pixel_count);
                            h.write_points(&z.outer);
                            h.write_u64(z.holes.len() as u64);
                            for hole in &z.holes {
                                h.write_points(hole);
                            }
                        }
                    }
                }
            }
        }
        h.finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/plan/step_plan.rs"]
mod tests;
