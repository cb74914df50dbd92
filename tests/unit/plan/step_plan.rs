use super::*;
use crate::{plan::generator::generate_plan, test_utils};

fn scene_plan(density: u32) -> StepPlan {
    let bytes = test_utils::png_bytes(&test_utils::layered_scene(12));
    let cfg = PlanConfig::new(crate::foundation::core::PaperSize::A4, density).unwrap();
    generate_plan(&bytes, &cfg).unwrap()
}

#[test]
fn generated_plan_validates() {
    let plan = scene_plan(8);
    plan.validate().unwrap();
    assert_eq!(plan.steps()[0].phase, Phase::Preparation);
    assert!(plan.steps()[0].marker);
    assert!(plan.steps().iter().skip(1).all(|s| !s.marker));
}

#[test]
fn duplicated_geometry_is_an_integrity_error() {
    let mut plan = scene_plan(8);
    let dup = plan.steps[1].incremental[0];
    let last = plan.steps.len() - 1;
    plan.steps[last].incremental.push(dup);
    assert!(matches!(
        plan.validate(),
        Err(DrawStepsError::PlanIntegrity(_))
    ));
}

#[test]
fn missing_geometry_is_an_integrity_error() {
    let mut plan = scene_plan(8);
    let last = plan.steps.len() - 1;
    plan.steps[last].incremental.pop();
    if plan.steps[last].incremental.is_empty() {
        plan.steps.pop();
    }
    assert!(matches!(
        plan.validate(),
        Err(DrawStepsError::PlanIntegrity(_))
    ));
}

#[test]
fn out_of_order_phases_are_rejected() {
    let mut plan = scene_plan(8);
    let n = plan.steps.len();
    plan.steps[n - 1].phase = Phase::PrimaryOutline;
    if n > 2 {
        plan.steps[1].phase = Phase::Texture;
    }
    assert!(plan.validate().is_err());
}

#[test]
fn stale_cumulative_list_is_rejected() {
    let mut plan = scene_plan(8);
    plan.steps[1].cumulative.push(GeometryRef::Contour(ContourId(0)));
    assert!(plan.validate().is_err());
}

#[test]
fn dump_and_fingerprint_are_stable() {
    let a = scene_plan(8);
    let b = scene_plan(8);
    assert_eq!(a.dump(), b.dump());
    assert_eq!(a.fingerprint(), b.fingerprint());

    let dump = a.dump();
    assert!(dump.starts_with("plan paper=a4 density=8"));
    assert!(dump.lines().nth(2).unwrap().contains("marker"));

    let c = scene_plan(16);
    assert_ne!(a.fingerprint(), c.fingerprint());
}

#[test]
fn fingerprint_follows_zone_outlines_and_holes() {
    let base = scene_plan(8);
    assert!(!base.tones().is_empty());

    let mut moved = base.clone();
    Arc::make_mut(&mut moved.tones).zones_mut()[0].outer[0].x += 1.0;
    assert_eq!(moved.tones().zones()[0].outer.len(), base.tones().zones()[0].outer.len());
    assert_ne!(moved.fingerprint(), base.fingerprint());

    let mut holed = base.clone();
    let zone = &mut Arc::make_mut(&mut holed.tones).zones_mut()[0];
    let (x, y) = (zone.bounding_box.center().x, zone.bounding_box.center().y);
    zone.holes.push(vec![
        Point::new(x, y),
        Point::new(x + 2.0, y),
        Point::new(x + 2.0, y + 2.0),
    ]);
    assert_ne!(holed.fingerprint(), base.fingerprint());
}

#[test]
fn geometry_refs_display_with_prefix() {
    assert_eq!(GeometryRef::Contour(ContourId(3)).to_string(), "c3");
    assert_eq!(GeometryRef::Zone(ZoneId(7)).to_string(), "z7");
}
