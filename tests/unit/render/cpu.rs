use super::*;

fn gradient(w: u32, h: u32) -> Frame {
    let mut f = Frame::filled(w, h, Bgr8::BLACK);
    for y in 0..h {
        for x in 0..w {
            f.set_pixel(x, y, Bgr8::new((x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8));
        }
    }
    f
}

#[test]
fn identity_affine_leaves_frame_untouched() {
    let mut f = gradient(33, 17);
    let before = f.clone();
    apply_affine(&mut f, &AffineParams::IDENTITY);
    assert_eq!(f, before);
}

#[test]
fn integer_translation_shifts_pixels_and_fills_black() {
    let mut f = gradient(16, 8);
    let src = f.clone();
    apply_affine(
        &mut f,
        &AffineParams {
            translate_x: 3.0,
            translate_y: 2.0,
            ..AffineParams::IDENTITY
        },
    );
    assert_eq!(f.pixel(0, 0), Bgr8::BLACK);
    assert_eq!(f.pixel(2, 5), Bgr8::BLACK);
    assert_eq!(f.pixel(3, 2), src.pixel(0, 0));
    assert_eq!(f.pixel(15, 7), src.pixel(12, 5));
}

#[test]
fn affine_preserves_dimensions() {
    let mut f = gradient(40, 30);
    apply_affine(
        &mut f,
        &AffineParams {
            translate_x: 60.0,
            translate_y: 40.0,
            scale: 1.15,
            rotation_deg: 8.0,
        },
    );
    assert_eq!((f.width, f.height), (40, 30));
    assert!(f.is_well_formed());
}

#[test]
fn far_off_frame_translation_yields_black() {
    for (tx, ty) in [(-1e300, 0.0), (1e300, 0.0), (0.0, -1e300), (f64::MAX, f64::MAX)] {
        let mut f = Frame::filled(4, 4, Bgr8::new(9, 9, 9));
        apply_affine(
            &mut f,
            &AffineParams {
                translate_x: tx,
                translate_y: ty,
                ..AffineParams::IDENTITY
            },
        );
        assert_eq!((f.width, f.height), (4, 4));
        assert_eq!(f, Frame::filled(4, 4, Bgr8::BLACK), "tx={tx} ty={ty}");
    }
}

#[test]
fn half_pixel_translation_blends_with_black_at_the_edge() {
    let mut f = Frame::filled(4, 4, Bgr8::new(100, 100, 100));
    apply_affine(
        &mut f,
        &AffineParams {
            translate_x: 0.5,
            ..AffineParams::IDENTITY
        },
    );
    assert_eq!(f.pixel(0, 1), Bgr8::new(50, 50, 50));
    assert_eq!(f.pixel(1, 1), Bgr8::new(100, 100, 100));
}

#[test]
fn empty_frame_is_a_no_op() {
    let mut f = Frame::empty();
    apply_affine(
        &mut f,
        &AffineParams {
            rotation_deg: 45.0,
            ..AffineParams::IDENTITY
        },
    );
    apply_filter(&mut f, FilterKind::Pixelate, &FilterParams::default());
    apply_filter(&mut f, FilterKind::KeepColor, &FilterParams::default());
    assert_eq!(f, Frame::empty());
}

#[test]
fn cell_spans_cover_exact_blocks_for_multiples() {
    assert_eq!(cell_spans(16, 8), vec![(0, 8), (8, 16)]);
    assert_eq!(cell_spans(5, 8), vec![(0, 5)]);
    let spans = cell_spans(21, 8);
    assert_eq!(spans.first().map(|s| s.0), Some(0));
    assert_eq!(spans.last().map(|s| s.1), Some(21));
    for pair in spans.windows(2) {
        assert_eq!(pair[0].1, pair[1].0);
    }
}

#[test]
fn cell_spans_agree_with_pixel_to_cell_rule() {
    for (len, block) in [(21u32, 8u32), (100, 7), (640, 8), (13, 2)] {
        let spans = cell_spans(len, block);
        let cells = spans.len() as u64;
        for (cell, &(a, b)) in spans.iter().enumerate() {
            for x in a..b {
                assert_eq!(x as u64 * cells / u64::from(len), cell as u64);
            }
        }
    }
}

#[test]
fn pixelate_averages_each_block() {
    let mut f = Frame::filled(4, 2, Bgr8::BLACK);
    f.set_pixel(0, 0, Bgr8::new(100, 0, 0));
    f.set_pixel(1, 1, Bgr8::new(1, 0, 0));
    let params = FilterParams {
        block_size: 2,
        ..FilterParams::default()
    };
    apply_filter(&mut f, FilterKind::Pixelate, &params);
    // (100 + 1) / 4 = 25.25
    for (x, y) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
        assert_eq!(f.pixel(x, y), Bgr8::new(25, 0, 0));
    }
    assert_eq!(f.pixel(3, 1), Bgr8::BLACK);
}

#[test]
fn pixelate_is_idempotent() {
    let params = FilterParams::default();
    let mut once = gradient(37, 29);
    apply_filter(&mut once, FilterKind::Pixelate, &params);
    let mut twice = once.clone();
    apply_filter(&mut twice, FilterKind::Pixelate, &params);
    assert_eq!(once, twice);

    let mut uniform = Frame::filled(37, 29, Bgr8::new(9, 99, 199));
    let before = uniform.clone();
    apply_filter(&mut uniform, FilterKind::Pixelate, &params);
    assert_eq!(uniform, before);
}

#[test]
fn pixelate_with_block_one_or_less_is_a_no_op() {
    for block_size in [1, 0, -5] {
        let mut f = gradient(9, 9);
        let before = f.clone();
        apply_filter(
            &mut f,
            FilterKind::Pixelate,
            &FilterParams {
                block_size,
                ..FilterParams::default()
            },
        );
        assert_eq!(f, before);
    }
}

#[test]
fn pixelate_640x480_block_8_is_constant_per_block() {
    let mut f = gradient(640, 480);
    apply_filter(&mut f, FilterKind::Pixelate, &FilterParams::default());
    for by in (0..480).step_by(8) {
        for bx in (0..640).step_by(8) {
            let c = f.pixel(bx, by);
            for y in by..by + 8 {
                for x in bx..bx + 8 {
                    assert_eq!(f.pixel(x, y), c, "block at {bx},{by}");
                }
            }
        }
    }
}

#[test]
fn keep_color_keeps_near_pixels_and_grays_the_rest() {
    let mut f = Frame::filled(3, 1, Bgr8::BLACK);
    f.set_pixel(0, 0, Bgr8::new(20, 20, 200));
    f.set_pixel(1, 0, Bgr8::new(255, 0, 0));
    f.set_pixel(2, 0, Bgr8::new(30, 25, 170));
    apply_filter(&mut f, FilterKind::KeepColor, &FilterParams::default());
    assert_eq!(f.pixel(0, 0), Bgr8::new(20, 20, 200));
    // 0.114 * 255 = 29.07
    assert_eq!(f.pixel(1, 0), Bgr8::new(29, 29, 29));
    assert_eq!(f.pixel(2, 0), Bgr8::new(30, 25, 170));
}

#[test]
fn keep_color_grays_pure_red_just_outside_the_threshold() {
    // (0,0,255) is sqrt(3825) ~ 61.8 away from (20,20,200).
    let mut f = Frame::filled(2, 1, Bgr8::new(0, 0, 255));
    f.set_pixel(1, 0, Bgr8::new(0, 10, 245));
    apply_filter(&mut f, FilterKind::KeepColor, &FilterParams::default());
    let y = luma(0, 0, 255);
    assert_eq!(y, 76);
    assert_eq!(f.pixel(0, 0), Bgr8::new(y, y, y));
    // sqrt(2525) ~ 50.2, off-axis and inside the threshold.
    assert_eq!(f.pixel(1, 0), Bgr8::new(0, 10, 245));
}

#[test]
fn keep_color_threshold_is_inclusive() {
    // Distance exactly 60 along the red axis.
    let mut f = Frame::filled(2, 1, Bgr8::new(20, 20, 140));
    f.set_pixel(1, 0, Bgr8::new(20, 20, 139));
    apply_filter(&mut f, FilterKind::KeepColor, &FilterParams::default());
    assert_eq!(f.pixel(0, 0), Bgr8::new(20, 20, 140));
    let y = luma(20, 20, 139);
    assert_eq!(f.pixel(1, 0), Bgr8::new(y, y, y));
}

#[test]
fn backend_renders_transform_then_filter() {
    let mut backend = CpuBackend::new();
    backend.resize(Resolution::new(16, 16)).unwrap();
    let frame = gradient(16, 16);
    let settings = FrameSettings {
        filter: FilterKind::Pixelate,
        filter_params: FilterParams::default(),
        affine_params: AffineParams {
            translate_x: 8.0,
            ..AffineParams::IDENTITY
        },
        transform_enabled: true,
    };
    backend.render(&frame, &settings).unwrap();
    let out = backend.readback().unwrap();

    let mut expected = frame.clone();
    apply_affine(&mut expected, &settings.affine_params);
    apply_filter(&mut expected, FilterKind::Pixelate, &settings.filter_params);
    assert_eq!(out, expected);
    // Left half was shifted in from outside the source.
    assert_eq!(out.pixel(0, 0), Bgr8::BLACK);
}

#[test]
fn backend_ignores_affine_when_transform_is_off() {
    let mut backend = CpuBackend::new();
    let frame = gradient(8, 8);
    let settings = FrameSettings {
        affine_params: AffineParams {
            rotation_deg: 30.0,
            ..AffineParams::IDENTITY
        },
        ..FrameSettings::default()
    };
    backend.render(&frame, &settings).unwrap();
    assert_eq!(backend.readback().unwrap(), frame);
}

#[test]
fn backend_rejects_empty_frames() {
    let mut backend = CpuBackend::new();
    let err = backend
        .render(&Frame::empty(), &FrameSettings::default())
        .unwrap_err()
        .to_string();
    assert!(err.starts_with("frame error:"), "{err}");
}
