use image::GrayImage;

use super::*;
use crate::test_utils;

fn extract(img: GrayImage) -> DrawStepsResult<ContourTree> {
    extract_contours(&EdgeMask::from_binary(img), &ExtractConfig::default())
}

#[test]
fn single_ring_is_one_root_contour() {
    let tree = extract(test_utils::ring_mask(128, 128, &[((64, 64), 30)])).unwrap();
    assert_eq!(tree.len(), 1);
    let c = tree.get(ContourId(0)).unwrap();
    assert_eq!(c.parent, None);
    assert_eq!(c.depth, 0);
    let expected = std::f64::consts::PI * 31.0 * 31.0;
    assert!(
        (c.enclosed_area - expected).abs() / expected < 0.15,
        "{}",
        c.enclosed_area
    );
    assert!((c.centroid.x - 64.0).abs() < 1.5 && (c.centroid.y - 64.0).abs() < 1.5);
}

#[test]
fn nested_rings_form_parent_child_chain() {
    let tree = extract(test_utils::ring_mask(
        128,
        128,
        &[((64, 64), 50), ((64, 64), 28), ((64, 64), 10)],
    ))
    .unwrap();
    assert_eq!(tree.len(), 3);
    let depths: Vec<u32> = tree.iter().map(|c| c.depth).collect();
    assert_eq!(depths, vec![0, 1, 2]);
    assert_eq!(tree.get(ContourId(1)).unwrap().parent, Some(ContourId(0)));
    assert_eq!(tree.get(ContourId(2)).unwrap().parent, Some(ContourId(1)));
    assert_eq!(tree.children(ContourId(0)).count(), 1);
    tree.validate().unwrap();
}

#[test]
fn siblings_are_numbered_in_scan_order() {
    let tree = extract(test_utils::ring_mask(
        128,
        128,
        &[((64, 96), 16), ((64, 30), 16)],
    ))
    .unwrap();
    assert_eq!(tree.roots().count(), 2);
    let first = tree.get(ContourId(0)).unwrap();
    let second = tree.get(ContourId(1)).unwrap();
    assert!(first.centroid.y < second.centroid.y);
}

#[test]
fn rectangle_outline_simplifies_to_corners() {
    let mut img = GrayImage::new(100, 80);
    test_utils::outline_rect(&mut img, 10, 10, 70, 50);
    let tree = extract(img).unwrap();
    assert_eq!(tree.len(), 1);
    let c = tree.get(ContourId(0)).unwrap();
    assert!(c.points.len() <= 8, "{} points", c.points.len());
    assert!(c.bounding_box.width() > 65.0 && c.bounding_box.height() > 45.0);
}

#[test]
fn specks_below_noise_floor_yield_no_contours() {
    let mut img = GrayImage::new(200, 200);
    img.put_pixel(50, 50, image::Luma([255]));
    img.put_pixel(150, 20, image::Luma([255]));
    let err = extract(img).unwrap_err();
    assert!(matches!(err, DrawStepsError::NoContoursFound(_)));
}

#[test]
fn identical_masks_produce_identical_trees() {
    let mask = test_utils::ring_mask(96, 96, &[((30, 30), 12), ((60, 60), 20)]);
    assert_eq!(extract(mask.clone()).unwrap(), extract(mask).unwrap());
}

#[test]
fn normalized_points_stay_in_unit_square() {
    let tree = extract(test_utils::ring_mask(120, 60, &[((60, 30), 20)])).unwrap();
    let pts = tree.normalized_points(ContourId(0)).unwrap();
    assert!(!pts.is_empty());
    assert!(pts
        .iter()
        .all(|p| (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y)));
    assert!(tree.normalized_points(ContourId(9)).is_none());
}

#[test]
fn path_is_closed() {
    let tree = extract(test_utils::ring_mask(64, 64, &[((32, 32), 14)])).unwrap();
    let path = tree.get(ContourId(0)).unwrap().to_path();
    assert!(matches!(
        path.elements().last(),
        Some(kurbo::PathEl::ClosePath)
    ));
}

#[test]
fn validate_rejects_forward_parent_reference() {
    let square = vec![
        Point::new(0.0, 0.0),
        Point::new(4.0, 0.0),
        Point::new(4.0, 4.0),
    ];
    let a = Contour::from_points(ContourId(0), Some(ContourId(1)), 1, square.clone());
    let b = Contour::from_points(ContourId(1), None, 0, square);
    let err = ContourTree::from_contours(10, 10, vec![a, b]).unwrap_err();
    assert!(matches!(err, DrawStepsError::PlanIntegrity(_)));
}

#[test]
fn slit_holes_inside_a_band_fold_into_it() {
    // Annulus 20 px wide with a 30x7 slit cut into its top.
    let mut img = GrayImage::new(128, 128);
    test_utils::disc(&mut img, (64, 64), 50, 255);
    test_utils::disc(&mut img, (64, 64), 30, 0);
    test_utils::rect(&mut img, 49, 20, 30, 7, 0);
    let tree = extract(img).unwrap();

    let depths: Vec<u32> = tree.iter().map(|c| c.depth).collect();
    assert_eq!(depths, vec![0, 1]);
    let hole = tree.get(ContourId(1)).unwrap();
    assert!(hole.enclosed_area > 2000.0, "{}", hole.enclosed_area);
}

#[test]
fn default_stroke_width_covers_a_bridged_double_edge() {
    let cfg = ExtractConfig::default();
    assert_eq!(
        cfg.max_stroke_width,
        ExtractConfig::stroke_band_width(cfg.dilate_radius, cfg.close_radius)
    );
    assert!(cfg.max_stroke_width >= f64::from(2 * cfg.close_radius + 2));
}

#[test]
fn drawn_circle_outlines_trace_as_one_contour() {
    for thickness in [1, 2, 3, 5] {
        let img = image::DynamicImage::ImageLuma8(test_utils::outline_circle(240, 70, thickness));
        let prepared = crate::analysis::preprocess::preprocess_image(
            &img,
            &crate::config::PreprocessConfig::default(),
        )
        .unwrap();
        let tree = extract_contours(&prepared.edges, &ExtractConfig::default()).unwrap();
        let areas: Vec<f64> = tree.iter().map(|c| c.enclosed_area).collect();
        assert_eq!(tree.len(), 1, "thickness {thickness}: {areas:?}");
    }
}
