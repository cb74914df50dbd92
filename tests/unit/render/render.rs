use super::*;
use crate::{
    config::PlanConfig, foundation::core::PaperSize, plan::generator::generate_plan, test_utils,
};

#[derive(Default)]
struct MockRenderer {
    calls: Vec<(usize, usize, usize, bool)>,
    fail_at: Option<usize>,
}

impl StepRenderer for MockRenderer {
    fn render(&mut self, request: &RenderRequest<'_>) -> DrawStepsResult<Raster> {
        let index = request.step.step_index;
        if self.fail_at == Some(index) {
            return Err(DrawStepsError::Other(anyhow::anyhow!("renderer failed")));
        }
        self.calls.push((
            index,
            request.cumulative.len(),
            request.incremental.len(),
            request.marker,
        ));
        let (width, height) = request.canvas_size();
        Ok(Raster {
            width,
            height,
            data: vec![255; (width * height * 4) as usize],
            premultiplied: true,
        })
    }
}

fn plan() -> StepPlan {
    let bytes = test_utils::png_bytes(&test_utils::layered_scene(6));
    generate_plan(&bytes, &PlanConfig::new(PaperSize::Square, 8).unwrap()).unwrap()
}

#[test]
fn render_plan_visits_every_step_in_order() {
    let plan = plan();
    let mut renderer = MockRenderer::default();
    let mut sunk = Vec::new();
    render_plan(&plan, &mut renderer, |step, raster| {
        assert_eq!(raster.width, 1500);
        sunk.push(step.step_index);
        Ok(())
    })
    .unwrap();

    let expected: Vec<usize> = (0..plan.len()).collect();
    assert_eq!(sunk, expected);
    assert_eq!(renderer.calls.len(), plan.len());
    assert_eq!(renderer.calls[0], (0, 0, 0, true));
    for (i, &(_, cumulative, incremental, marker)) in renderer.calls.iter().enumerate() {
        assert_eq!(cumulative, plan.steps()[i].cumulative.len());
        assert_eq!(incremental, plan.steps()[i].incremental.len());
        assert_eq!(marker, i == 0);
    }
}

#[test]
fn first_renderer_error_aborts() {
    let plan = plan();
    let mut renderer = MockRenderer {
        fail_at: Some(2),
        ..MockRenderer::default()
    };
    let mut sunk = 0;
    let err = render_plan(&plan, &mut renderer, |_, _| {
        sunk += 1;
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err, DrawStepsError::Other(_)));
    assert_eq!(sunk, 2);
}

#[test]
fn sink_error_aborts() {
    let plan = plan();
    let mut renderer = MockRenderer::default();
    let err = render_plan(&plan, &mut renderer, |_, _| {
        Err(DrawStepsError::Other(anyhow::anyhow!("disk full")))
    })
    .unwrap_err();
    assert!(err.to_string().contains("disk full"));
    assert_eq!(renderer.calls.len(), 1);
}

#[test]
fn resolved_geometry_is_normalised_and_mapped_inside_the_fit() {
    let plan = plan();
    let last = plan.len() - 1;
    let request = plan.render_request(last).unwrap();
    let fit = request.canvas_fit;
    for shape in request.cumulative.iter().chain(&request.incremental) {
        assert!(
            shape
                .outer
                .iter()
                .all(|p| (0.0..=1.0).contains(&p.x) && (0.0..=1.0).contains(&p.y))
        );
        let bounds = kurbo::Shape::bounding_box(&shape.to_paper_path(&fit));
        assert!(bounds.x0 >= fit.image_rect.x0 - 1e-6);
        assert!(bounds.y1 <= fit.image_rect.y1 + 1e-6);
    }
    assert!(request.incremental.iter().all(|s| s.band.is_some()));
    assert!(plan.render_request(plan.len()).is_err());
}

#[test]
fn colour_contract() {
    assert_eq!(CUMULATIVE_COLOR, Rgba8Premul::opaque(80, 80, 80));
    assert_ne!(CUMULATIVE_COLOR, INCREMENTAL_COLOR);
    assert!(INCREMENTAL_COLOR.r > INCREMENTAL_COLOR.g);
    assert!(shading_color(ToneBand::Dark).r < shading_color(ToneBand::Light).r);
}
