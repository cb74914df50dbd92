use std::f64::consts::PI;

use kurbo::Point;

use crate::{
    analysis::contour::{Contour, ContourId, ContourTree},
    config::ScoringWeights,
};

/// Normalised score inputs, each in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ScoreComponents {
    /// Enclosed area relative to the largest contour.
    pub area: f64,
    /// `1 / (1 + depth)`.
    pub inverse_depth: f64,
    /// 1 at the image centre, 0 at a corner.
    pub centrality: f64,
    /// 0 for a circle, approaching 1 for thin or jagged outlines.
    pub complexity: f64,
}

impl ScoreComponents {
    pub fn of(contour: &Contour, tree: &ContourTree, max_area: f64) -> Self {
        let (w, h) = (f64::from(tree.width()), f64::from(tree.height()));
        let center = Point::new(w / 2.0, h / 2.0);
        let half_diagonal = 0.5 * (w * w + h * h).sqrt();

        let area = if max_area > 0.0 {
            (contour.enclosed_area / max_area).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let centrality = if half_diagonal > 0.0 {
            1.0 - (contour.bounding_box.center().distance(center) / half_diagonal).clamp(0.0, 1.0)
        } else {
            1.0
        };
        let arc = contour.arc_length;
        let complexity = if arc > 0.0 {
            (1.0 - 4.0 * PI * contour.enclosed_area / (arc * arc)).clamp(0.0, 1.0)
        } else {
            1.0
        };

        Self {
            area,
            inverse_depth: 1.0 / (1.0 + f64::from(contour.depth)),
            centrality,
            complexity,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShapeScore {
    pub id: ContourId,
    pub depth: u32,
    pub components: ScoreComponents,
    /// Weighted combination, normalised into `[0, 1]`.
    pub composite: f64,
}

/// Weighted sum with the complexity penalty shifted so the result stays in `[0, 1]`.
pub fn composite(c: &ScoreComponents, w: &ScoringWeights) -> f64 {
    let total = w.total();
    if total <= 0.0 {
        return 0.0;
    }
    let raw = w.area * c.area + w.depth * c.inverse_depth + w.centrality * c.centrality
        - w.complexity * c.complexity;
    ((raw + w.complexity) / total).clamp(0.0, 1.0)
}

/// Score every contour and return them in rank order.
///
/// Rank: composite descending, then shallower, then larger, then lower id.
pub fn rank_contours(tree: &ContourTree, weights: &ScoringWeights) -> Vec<ShapeScore> {
    let max_area = tree.max_area();
    let mut scores: Vec<ShapeScore> = tree
        .iter()
        .map(|c| {
            let components = ScoreComponents::of(c, tree, max_area);
            ShapeScore {
                id: c.id,
                depth: c.depth,
                components,
                composite: composite(&components, weights),
            }
        })
        .collect();

    scores.sort_by(|a, b| {
        b.composite
            .total_cmp(&a.composite)
            .then(a.depth.cmp(&b.depth))
            .then(b.components.area.total_cmp(&a.components.area))
            .then(a.id.cmp(&b.id))
    });
    scores
}

#[cfg(test)]
#[path = "../../tests/unit/plan/score.rs"]
mod tests;
