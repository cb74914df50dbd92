//! Handing plan steps to an external rasteriser.
//!
//! The planner never draws. Each step is resolved into a [`RenderRequest`] of image-normalised
//! polylines plus the grid and canvas placement, and a [`StepRenderer`] turns it into a
//! [`Raster`]. Cumulative geometry is stroked in [`CUMULATIVE_COLOR`], the step's new geometry
//! in [`INCREMENTAL_COLOR`].

use kurbo::{BezPath, Point};

use crate::{
    analysis::tone::ToneBand,
    foundation::core::{CanvasFit, GridSpec, Rgba8Premul},
    foundation::error::{DrawStepsError, DrawStepsResult},
    plan::{
        phase::Phase,
        step_plan::{GeometryRef, StepPlan, StepSpec},
    },
};

/// Geometry drawn in earlier steps (dark grey).
pub const CUMULATIVE_COLOR: Rgba8Premul = Rgba8Premul::opaque(80, 80, 80);
/// Geometry introduced by the current step (red).
pub const INCREMENTAL_COLOR: Rgba8Premul = Rgba8Premul::opaque(200, 30, 30);
pub const GRID_COLOR: Rgba8Premul = Rgba8Premul::opaque(220, 220, 220);
pub const MARKER_COLOR: Rgba8Premul = Rgba8Premul::opaque(255, 140, 0);

/// Fill used for a shaded zone of `band`.
pub fn shading_color(band: ToneBand) -> Rgba8Premul {
    match band {
        ToneBand::Dark => Rgba8Premul::opaque(180, 180, 180),
        ToneBand::Mid => Rgba8Premul::opaque(220, 220, 220),
        ToneBand::Light => Rgba8Premul::opaque(245, 245, 245),
    }
}

/// A contour or zone resolved to image-normalised polylines.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderShape {
    pub geometry: GeometryRef,
    pub outer: Vec<Point>,
    pub holes: Vec<Vec<Point>>,
    /// Set for tone zones.
    pub band: Option<ToneBand>,
}

impl RenderShape {
    /// Closed path of the outer ring and holes, mapped into paper pixels.
    pub fn to_paper_path(&self, fit: &CanvasFit) -> BezPath {
        let mut path = BezPath::new();
        for ring in std::iter::once(&self.outer).chain(&self.holes) {
            let mut it = ring.iter();
            if let Some(&first) = it.next() {
                path.move_to(fit.to_paper(first));
                for &p in it {
                    path.line_to(fit.to_paper(p));
                }
                path.close_path();
            }
        }
        path
    }
}

/// Everything a renderer needs for one step.
#[derive(Clone, Debug)]
pub struct RenderRequest<'a> {
    pub step: &'a StepSpec,
    /// Geometry from earlier steps, in plan order.
    pub cumulative: Vec<RenderShape>,
    /// Geometry new in this step, in plan order.
    pub incremental: Vec<RenderShape>,
    pub grid: GridSpec,
    pub canvas_fit: CanvasFit,
    pub marker: bool,
    /// Image-normalised "Start Here" position.
    pub marker_anchor: Point,
}

impl RenderRequest<'_> {
    pub fn phase(&self) -> Phase {
        self.step.phase
    }

    /// Output raster size for this request's paper.
    pub fn canvas_size(&self) -> (u32, u32) {
        self.grid.paper_size.pixel_size()
    }
}

/// RGBA8 step image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

/// Rasterisation capability supplied by the caller.
pub trait StepRenderer {
    fn render(&mut self, request: &RenderRequest<'_>) -> DrawStepsResult<Raster>;
}

impl StepPlan {
    /// Resolve one geometry reference into normalised polylines.
    pub fn resolve(&self, geometry: GeometryRef) -> DrawStepsResult<RenderShape> {
        match geometry {
            GeometryRef::Contour(id) => {
                let points = self.contours().normalized_points(id).ok_or_else(|| {
                    DrawStepsError::plan_integrity(format!("unknown contour {id}"))
                })?;
                Ok(RenderShape {
                    geometry,
                    outer: points,
                    holes: Vec::new(),
                    band: None,
                })
            }
            GeometryRef::Zone(id) => {
                let tones = self.tones();
                let zone = tones
                    .get(id)
                    .ok_or_else(|| DrawStepsError::plan_integrity(format!("unknown zone {id}")))?;
                let norm = |ring: &Vec<Point>| -> Vec<Point> {
                    ring.iter().map(|&p| tones.normalize(p)).collect()
                };
                Ok(RenderShape {
                    geometry,
                    outer: norm(&zone.outer),
                    holes: zone.holes.iter().map(norm).collect(),
                    band: Some(zone.band),
                })
            }
        }
    }

    pub fn render_request(&self, index: usize) -> DrawStepsResult<RenderRequest<'_>> {
        let step = self
            .step(index)
            .ok_or_else(|| DrawStepsError::plan_integrity(format!("no step {index}")))?;
        let resolve_all = |refs: &[GeometryRef]| -> DrawStepsResult<Vec<RenderShape>> {
            refs.iter().map(|g| self.resolve(*g)).collect()
        };
        Ok(RenderRequest {
            step,
            cumulative: resolve_all(&step.cumulative)?,
            incremental: resolve_all(&step.incremental)?,
            grid: self.grid(),
            canvas_fit: self.canvas_fit(),
            marker: step.marker,
            marker_anchor: self.marker_anchor(),
        })
    }
}

/// Render every step in order, handing each raster to `sink`. The first error aborts.
#[tracing::instrument(skip_all, fields(steps = plan.len()))]
pub fn render_plan<R, F>(plan: &StepPlan, renderer: &mut R, mut sink: F) -> DrawStepsResult<()>
where
    R: StepRenderer + ?Sized,
    F: FnMut(&StepSpec, Raster) -> DrawStepsResult<()>,
{
    for index in 0..plan.len() {
        let request = plan.render_request(index)?;
        let raster = renderer.render(&request)?;
        let (w, h) = request.canvas_size();
        if raster.width != w || raster.height != h {
            tracing::warn!(
                step = index,
                width = raster.width,
                height = raster.height,
                "raster size differs from the paper size"
            );
        }
        sink(request.step, raster)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/render.rs"]
mod tests;
