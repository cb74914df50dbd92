use super::*;

#[test]
fn default_config_is_valid() {
    PlanConfig::default().validate().unwrap();
}

#[test]
fn density_out_of_range_is_rejected() {
    for d in [0, 3, 17, 64] {
        let err = PlanConfig::new(PaperSize::A4, d).unwrap_err();
        assert!(matches!(err, DrawStepsError::InvalidConfig(_)), "{d}");
    }
}

#[test]
fn json_overrides_merge_with_defaults() {
    let cfg = PlanConfig::from_json_str(
        r#"{
            "paper_size": "square",
            "grid_density": 12,
            "tone": { "thresholds": { "mode": "quantile", "dark": 0.2, "light": 0.8 } }
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.paper_size, PaperSize::Square);
    assert_eq!(cfg.grid_density, 12);
    assert_eq!(
        cfg.tone.thresholds,
        ToneThresholds::Quantile {
            dark: 0.2,
            light: 0.8
        }
    );
    assert_eq!(cfg.scoring, ScoringWeights::default());
}

#[test]
fn unknown_paper_size_in_json_is_invalid_config() {
    let err = PlanConfig::from_json_str(r#"{ "paper_size": "letter" }"#).unwrap_err();
    assert!(matches!(err, DrawStepsError::InvalidConfig(_)));
}

#[test]
fn unknown_fields_are_rejected() {
    let err = PlanConfig::from_json_str(r#"{ "grid_densty": 8 }"#).unwrap_err();
    assert!(matches!(err, DrawStepsError::InvalidConfig(_)));
}

#[test]
fn all_zero_weights_are_rejected() {
    let mut cfg = PlanConfig::default();
    cfg.scoring = ScoringWeights {
        area: 0.0,
        depth: 0.0,
        centrality: 0.0,
        complexity: 0.0,
    };
    assert!(matches!(
        cfg.validate(),
        Err(DrawStepsError::InvalidConfig(_))
    ));
}

#[test]
fn inverted_tone_thresholds_are_rejected() {
    let mut cfg = PlanConfig::default();
    cfg.tone.thresholds = ToneThresholds::Absolute {
        dark_max: 200,
        mid_max: 100,
    };
    assert!(cfg.validate().is_err());

    cfg.tone.thresholds = ToneThresholds::Quantile {
        dark: 0.7,
        light: 0.3,
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn per_phase_lookup_skips_orchestrator_phases() {
    let b = BatchConfig::default();
    assert_eq!(b.base_batch_size.get(Phase::Preparation), None);
    assert_eq!(b.base_batch_size.get(Phase::Shading), None);
    assert_eq!(b.base_batch_size.get(Phase::PrimaryOutline), Some(3));
    assert_eq!(b.base_batch_size.get(Phase::Texture), Some(24));
}
