use imageproc::{
    contours::{BorderType, find_contours},
    distance_transform::Norm,
    geometry::{approximate_polygon_dp, arc_length, contour_area},
    morphology::{close, dilate},
    point::Point as PixelPoint,
};
use kurbo::{BezPath, Point, Rect};

use crate::{
    analysis::preprocess::EdgeMask,
    config::ExtractConfig,
    foundation::error::{DrawStepsError, DrawStepsResult},
    foundation::math::{closed_perimeter, polygon_area, polygon_centroid},
};

/// Index of a contour inside its [`ContourTree`].
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ContourId(pub u32);

impl ContourId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for ContourId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// One closed boundary, in working-resolution pixel coordinates.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Contour {
    pub id: ContourId,
    pub parent: Option<ContourId>,
    /// Number of ancestors; 0 for outermost shapes.
    pub depth: u32,
    pub points: Vec<Point>,
    pub arc_length: f64,
    pub enclosed_area: f64,
    pub bounding_box: Rect,
    pub centroid: Point,
}

impl Contour {
    fn from_points(id: ContourId, parent: Option<ContourId>, depth: u32, points: Vec<Point>) -> Self {
        let bounding_box = bounds(&points);
        Self {
            id,
            parent,
            depth,
            arc_length: closed_perimeter(&points),
            enclosed_area: polygon_area(&points),
            centroid: polygon_centroid(&points),
            bounding_box,
            points,
        }
    }

    /// Closed path through the contour's points.
    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut it = self.points.iter();
        if let Some(&first) = it.next() {
            path.move_to(first);
            for &p in it {
                path.line_to(p);
            }
            path.close_path();
        }
        path
    }
}

fn bounds(points: &[Point]) -> Rect {
    let mut it = points.iter();
    let Some(&first) = it.next() else {
        return Rect::ZERO;
    };
    it.fold(Rect::from_points(first, first), |r, &p| r.union_pt(p))
}

/// Arena of nested contours extracted from one edge mask.
///
/// Ids are dense and assigned parent-before-child, so `contours[i].id == ContourId(i)` and every
/// parent id is lower than its children's.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ContourTree {
    width: u32,
    height: u32,
    contours: Vec<Contour>,
}

impl ContourTree {
    /// Build a tree from contours already in arena order. Fails if the arena is inconsistent.
    pub fn from_contours(width: u32, height: u32, contours: Vec<Contour>) -> DrawStepsResult<Self> {
        let tree = Self {
            width,
            height,
            contours,
        };
        tree.validate()?;
        Ok(tree)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.contours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contours.is_empty()
    }

    pub fn get(&self, id: ContourId) -> Option<&Contour> {
        self.contours.get(id.index())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contour> {
        self.contours.iter()
    }

    pub fn roots(&self) -> impl Iterator<Item = &Contour> {
        self.contours.iter().filter(|c| c.parent.is_none())
    }

    pub fn children(&self, id: ContourId) -> impl Iterator<Item = &Contour> {
        self.contours.iter().filter(move |c| c.parent == Some(id))
    }

    /// Largest enclosed area in the tree (0 when empty).
    pub fn max_area(&self) -> f64 {
        self.contours
            .iter()
            .map(|c| c.enclosed_area)
            .fold(0.0, f64::max)
    }

    /// Map a pixel-space point into `[0, 1]` image coordinates.
    pub fn normalize(&self, p: Point) -> Point {
        Point::new(
            p.x / f64::from(self.width.max(1)),
            p.y / f64::from(self.height.max(1)),
        )
    }

    pub fn normalized_points(&self, id: ContourId) -> Option<Vec<Point>> {
        self.get(id)
            .map(|c| c.points.iter().map(|&p| self.normalize(p)).collect())
    }

    pub fn validate(&self) -> DrawStepsResult<()> {
        for (i, c) in self.contours.iter().enumerate() {
            if c.id.index() != i {
                return Err(DrawStepsError::plan_integrity(format!(
                    "contour at slot {i} carries id {}",
                    c.id
                )));
            }
            match c.parent {
                None if c.depth != 0 => {
                    return Err(DrawStepsError::plan_integrity(format!(
                        "root contour {} has depth {}",
                        c.id, c.depth
                    )));
                }
                None => {}
                Some(p) => {
                    if p >= c.id {
                        return Err(DrawStepsError::plan_integrity(format!(
                            "contour {} has parent {p} that does not precede it",
                            c.id
                        )));
                    }
                    let parent_depth = self.contours[p.index()].depth;
                    if c.depth != parent_depth + 1 {
                        return Err(DrawStepsError::plan_integrity(format!(
                            "contour {} depth {} does not follow parent depth {parent_depth}",
                            c.id, c.depth
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

struct RawBorder {
    points: Vec<PixelPoint<i32>>,
    parent: Option<usize>,
    area: f64,
    arc: f64,
    kind: BorderType,
}

/// Trace the edge mask into a filtered, simplified contour hierarchy.
#[tracing::instrument(skip(mask, cfg), fields(w = mask.width(), h = mask.height()))]
pub fn extract_contours(mask: &EdgeMask, cfg: &ExtractConfig) -> DrawStepsResult<ContourTree> {
    let (width, height) = (mask.width(), mask.height());
    let widened = dilate(mask.as_image(), Norm::LInf, cfg.dilate_radius);
    let closed = close(&widened, Norm::LInf, cfg.close_radius);

    let raw: Vec<RawBorder> = find_contours::<i32>(&closed)
        .into_iter()
        .map(|c| RawBorder {
            area: contour_area(&c.points).abs(),
            arc: arc_length(&c.points, true),
            points: c.points,
            parent: c.parent,
            kind: c.border_type,
        })
        .collect();

    let min_area = cfg.min_area_fraction * f64::from(width) * f64::from(height);
    let min_arc = cfg.min_perimeter_fraction * f64::from(width.max(height));

    let keep: Vec<bool> = raw
        .iter()
        .map(|b| {
            b.points.len() >= 3
                && b.area >= min_area
                && b.arc >= min_arc
                && !is_stroke_inner_side(b, &raw, cfg.max_stroke_width)
        })
        .collect();

    // Nearest kept ancestor; parents always precede children in border-following order.
    let mut kept_parent: Vec<Option<usize>> = vec![None; raw.len()];
    for i in 0..raw.len() {
        let mut cur = raw[i].parent;
        while let Some(p) = cur {
            if keep[p] {
                break;
            }
            cur = raw[p].parent;
        }
        kept_parent[i] = cur;
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); raw.len()];
    let mut roots = Vec::new();
    for i in (0..raw.len()).filter(|&i| keep[i]) {
        match kept_parent[i] {
            Some(p) => children[p].push(i),
            None => roots.push(i),
        }
    }

    // Depth-first pre-order gives dense, parent-before-child ids.
    let mut contours = Vec::with_capacity(roots.len());
    let mut stack: Vec<(usize, Option<ContourId>, u32)> =
        roots.iter().rev().map(|&r| (r, None, 0)).collect();
    while let Some((raw_idx, parent, depth)) = stack.pop() {
        let id = ContourId(contours.len() as u32);
        let border = &raw[raw_idx];
        let points = simplify_ring(&border.points, border.arc, cfg.simplify_tolerance);
        contours.push(Contour::from_points(id, parent, depth, points));
        for &child in children[raw_idx].iter().rev() {
            stack.push((child, Some(id), depth + 1));
        }
    }

    tracing::debug!(
        raw = raw.len(),
        kept = contours.len(),
        roots = roots.len(),
        "extracted contours"
    );

    if contours.is_empty() {
        return Err(DrawStepsError::no_contours(format!(
            "{} borders traced, none above area {min_area:.1} px and perimeter {min_arc:.1} px",
            raw.len()
        )));
    }

    ContourTree::from_contours(width, height, contours)
}

/// A hole is the inside edge of a drawn line, not a shape of its own, when it is itself no wider
/// than one stroke (`2A / P`) or when its mean distance to its outer parent is within one
/// stroke width.
fn is_stroke_inner_side(border: &RawBorder, raw: &[RawBorder], max_stroke_width: f64) -> bool {
    if border.kind != BorderType::Hole {
        return false;
    }
    if border.arc <= 0.0 || 2.0 * border.area / border.arc <= max_stroke_width {
        return true;
    }
    let Some(parent) = border.parent.map(|p| &raw[p]) else {
        return false;
    };
    if parent.kind != BorderType::Outer {
        return false;
    }
    let mean_perimeter = (parent.arc + border.arc) / 2.0;
    (parent.area - border.area) / mean_perimeter <= max_stroke_width
}

/// Douglas-Peucker on a closed pixel ring at `tolerance × arc` (never below half a pixel).
///
/// The ring is cut at the vertex farthest from its start and each half is simplified as an open
/// chain, so neither baseline is degenerate. Rings that would collapse below three vertices keep
/// their traced points.
pub(crate) fn simplify_ring(points: &[PixelPoint<i32>], arc: f64, tolerance: f64) -> Vec<Point> {
    let to_kurbo = |p: &PixelPoint<i32>| Point::new(f64::from(p.x), f64::from(p.y));
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    let epsilon = (tolerance * arc).max(0.5);

    let dist2 = |p: &PixelPoint<i32>| {
        let (dx, dy) = (i64::from(p.x - first.x), i64::from(p.y - first.y));
        dx * dx + dy * dy
    };
    let far = points
        .iter()
        .enumerate()
        .max_by(|(i, a), (j, b)| dist2(a).cmp(&dist2(b)).then(j.cmp(i)))
        .map_or(0, |(i, _)| i);
    if far == 0 {
        return points.iter().map(to_kurbo).collect();
    }

    let mut head = approximate_polygon_dp(&points[..=far], epsilon, false);
    let mut tail_chain = points[far..].to_vec();
    tail_chain.push(first);
    let tail = approximate_polygon_dp(&tail_chain, epsilon, false);

    // Both chains carry the cut vertex, and the tail ends back on `first`.
    head.pop();
    head.extend(tail);
    head.pop();
    if head.len() < 3 {
        return points.iter().map(to_kurbo).collect();
    }
    head.iter().map(to_kurbo).collect()
}

#[cfg(test)]
#[path = "../../tests/unit/analysis/contour.rs"]
mod tests;
