use super::*;

#[test]
fn default_matrix_follows_reference_sweep() {
    let cfg = BenchConfig::default();
    cfg.validate().unwrap();
    let all = cfg.configurations();
    assert_eq!(all.len(), cfg.backends.len() * 3 * 2 * 3);
    assert_eq!(
        all[0],
        BenchConfiguration {
            backend: BackendKind::Cpu,
            filter: FilterKind::None,
            transform: false,
            resolution: Resolution::new(640, 480),
        }
    );
    assert_eq!(all[1].resolution, Resolution::new(1280, 720));
    assert!(all[3].transform);
    assert_eq!(all[6].filter, FilterKind::Pixelate);
    assert_eq!(cfg.warmup(), Duration::from_secs(1));
    assert_eq!(cfg.sample(), Duration::from_secs(5));
}

#[test]
fn backend_is_the_outermost_loop() {
    let cfg = BenchConfig {
        backends: vec![BackendKind::Cpu, BackendKind::Gpu],
        filters: vec![FilterKind::None],
        transforms: vec![false],
        resolutions: vec![Resolution::new(8, 8), Resolution::new(16, 16)],
        ..BenchConfig::default()
    };
    let kinds: Vec<_> = cfg.configurations().iter().map(|c| c.backend).collect();
    assert_eq!(
        kinds,
        vec![BackendKind::Cpu, BackendKind::Cpu, BackendKind::Gpu, BackendKind::Gpu]
    );
}

#[test]
fn partial_json_keeps_defaults() {
    let cfg = BenchConfig::from_json_str(
        r#"{ "resolutions": ["320x240"], "filters": ["keep_color"], "sample_secs": 0.5 }"#,
    )
    .unwrap();
    assert_eq!(cfg.resolutions, vec![Resolution::new(320, 240)]);
    assert_eq!(cfg.filters, vec![FilterKind::KeepColor]);
    assert_eq!(cfg.sample_secs, 0.5);
    assert_eq!(cfg.warmup_secs, 1.0);
    assert_eq!(cfg.filter_params, FilterParams::default());
}

#[test]
fn unknown_fields_are_rejected() {
    let err = BenchConfig::from_json_str(r#"{ "fps": 60 }"#).unwrap_err().to_string();
    assert!(err.starts_with("validation error:"), "{err}");
}

#[test]
fn validate_rejects_empty_axes_and_bad_durations() {
    let cfg = BenchConfig {
        filters: vec![],
        ..BenchConfig::default()
    };
    assert!(cfg.validate().unwrap_err().to_string().contains("filters"));

    let cfg = BenchConfig {
        warmup_secs: -1.0,
        ..BenchConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = BenchConfig {
        sample_secs: 0.0,
        ..BenchConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn settings_for_carries_filter_and_transform_flag() {
    let cfg = BenchConfig::default();
    let c = BenchConfiguration {
        backend: BackendKind::Cpu,
        filter: FilterKind::KeepColor,
        transform: true,
        resolution: Resolution::new(640, 480),
    };
    let s = cfg.settings_for(&c);
    assert_eq!(s.filter, FilterKind::KeepColor);
    assert!(s.transform_enabled);
    assert_eq!(s.affine_params.scale, 1.15);
}

#[test]
fn configuration_display_is_readable() {
    let c = BenchConfiguration {
        backend: BackendKind::Gpu,
        filter: FilterKind::Pixelate,
        transform: false,
        resolution: Resolution::new(1280, 720),
    };
    assert_eq!(c.to_string(), "GPU | Pixelate | Off | 1280x720");
}
