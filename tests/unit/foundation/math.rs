use kurbo::Point;

use super::*;

#[test]
fn fnv_is_insensitive_to_chunking() {
    let mut a = Fnv1a64::new(Fnv1a64::OFFSET_BASIS);
    a.write_bytes(b"drawsteps");
    let mut b = Fnv1a64::new(Fnv1a64::OFFSET_BASIS);
    b.write_u8(b'd');
    b.write_bytes(b"rawsteps");
    assert_eq!(a.finish(), b.finish());
}

#[test]
fn fnv_pair_streams_differ_but_are_deterministic() {
    let mut x = FnvPair::new();
    x.write_str("contour");
    x.write_f64(0.25);
    let mut y = FnvPair::new();
    y.write_str("contour");
    y.write_f64(0.25);
    let (hi, lo) = x.finish();
    assert_eq!((hi, lo), y.finish());
    assert_ne!(hi, lo);
}

#[test]
fn square_area_and_centroid() {
    let sq = [
        Point::new(0.0, 0.0),
        Point::new(4.0, 0.0),
        Point::new(4.0, 4.0),
        Point::new(0.0, 4.0),
    ];
    assert_eq!(polygon_area(&sq), 16.0);
    let mut rev = sq;
    rev.reverse();
    assert_eq!(polygon_area(&rev), 16.0);
    let c = polygon_centroid(&sq);
    assert!((c.x - 2.0).abs() < 1e-12 && (c.y - 2.0).abs() < 1e-12);
}

#[test]
fn degenerate_polygon_uses_vertex_mean() {
    let line = [Point::new(0.0, 0.0), Point::new(2.0, 0.0)];
    assert_eq!(polygon_area(&line), 0.0);
    assert_eq!(polygon_centroid(&line), Point::new(1.0, 0.0));
}

#[test]
fn perimeter_closes_the_loop() {
    let tri = [
        Point::new(0.0, 0.0),
        Point::new(3.0, 0.0),
        Point::new(3.0, 4.0),
    ];
    assert!((closed_perimeter(&tri) - 12.0).abs() < 1e-12);
    assert_eq!(closed_perimeter(&tri[..1]), 0.0);
}
