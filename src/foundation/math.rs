#[derive(Clone, Copy, Debug)]
pub(crate) struct Fnv1a64(u64);

impl Fnv1a64 {
    pub(crate) const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01B3;

    pub(crate) fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.write_bytes(&[v]);
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    pub(crate) fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        let mut h = self.0;
        for &b in bytes {
            h ^= u64::from(b);
            h = h.wrapping_mul(Self::PRIME);
        }
        self.0 = h;
    }

    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

/// Two independently seeded FNV streams fed the same input, for 128-bit fingerprints.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FnvPair {
    a: Fnv1a64,
    b: Fnv1a64,
}

impl FnvPair {
    pub(crate) fn new() -> Self {
        Self {
            a: Fnv1a64::new(Fnv1a64::OFFSET_BASIS),
            b: Fnv1a64::new(0x9ae1_6a3b_2f90_404f),
        }
    }

    pub(crate) fn write_u8(&mut self, v: u8) {
        self.a.write_u8(v);
        self.b.write_u8(v);
    }

    pub(crate) fn write_u64(&mut self, v: u64) {
        self.a.write_u64(v);
        self.b.write_u64(v);
    }

    pub(crate) fn write_f64(&mut self, v: f64) {
        self.a.write_f64(v);
        self.b.write_f64(v);
    }

    /// Length-prefixed, so adjacent fields cannot alias.
    pub(crate) fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_u64(bytes.len() as u64);
        self.a.write_bytes(bytes);
        self.b.write_bytes(bytes);
    }

    pub(crate) fn write_str(&mut self, s: &str) {
        self.write_bytes(s.as_bytes());
    }

    /// Length-prefixed sequence of coordinates.
    pub(crate) fn write_points(&mut self, points: &[kurbo::Point]) {
        self.write_u64(points.len() as u64);
        for p in points {
            self.write_f64(p.x);
            self.write_f64(p.y);
        }
    }

    pub(crate) fn finish(self) -> (u64, u64) {
        (self.a.finish(), self.b.finish())
    }
}

/// Shoelace area of a closed polygon; always non-negative.
pub(crate) fn polygon_area(points: &[kurbo::Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut prev = points[points.len() - 1];
    let mut acc = 0.0;
    for &p in points {
        acc += prev.x * p.y - prev.y * p.x;
        prev = p;
    }
    (acc * 0.5).abs()
}

/// Length of a closed polyline, including the closing segment.
pub(crate) fn closed_perimeter(points: &[kurbo::Point]) -> f64 {
    match points {
        [] | [_] => 0.0,
        [first, .., last] => {
            let open: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
            open + last.distance(*first)
        }
    }
}

/// Area centroid of a closed polygon, falling back to the vertex mean for degenerate input.
pub(crate) fn polygon_centroid(points: &[kurbo::Point]) -> kurbo::Point {
    if points.is_empty() {
        return kurbo::Point::ZERO;
    }
    let mut prev = points[points.len() - 1];
    let (mut a, mut cx, mut cy) = (0.0, 0.0, 0.0);
    for &p in points {
        let cross = prev.x * p.y - p.x * prev.y;
        a += cross;
        cx += (prev.x + p.x) * cross;
        cy += (prev.y + p.y) * cross;
        prev = p;
    }
    if a.abs() < 1e-9 {
        let n = points.len() as f64;
        let (sx, sy) = points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return kurbo::Point::new(sx / n, sy / n);
    }
    kurbo::Point::new(cx / (3.0 * a), cy / (3.0 * a))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
