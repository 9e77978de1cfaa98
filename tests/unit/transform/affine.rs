use super::*;

fn close(a: (f64, f64), b: (f64, f64)) -> bool {
    (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9
}

#[test]
fn identity_params_give_identity_matrix_for_any_size() {
    for (w, h) in [(1, 1), (2, 3), (640, 480), (1920, 1080), (4097, 17)] {
        let m = affine_matrix(&AffineParams::IDENTITY, w, h);
        assert!(m.is_identity(1e-12), "{w}x{h}: {m:?}");
    }
}

#[test]
fn rotation_and_scale_keep_the_center_fixed() {
    let p = AffineParams {
        scale: 1.7,
        rotation_deg: 33.0,
        ..AffineParams::IDENTITY
    };
    let m = affine_matrix(&p, 640, 480);
    assert!(close(m.transform_point(320.0, 240.0), (320.0, 240.0)));
}

#[test]
fn translation_shifts_every_point() {
    let p = AffineParams {
        translate_x: 60.0,
        translate_y: -40.0,
        ..AffineParams::IDENTITY
    };
    let m = affine_matrix(&p, 100, 50);
    assert!(close(m.transform_point(0.0, 0.0), (60.0, -40.0)));
    assert!(close(m.transform_point(10.0, 5.0), (70.0, -35.0)));
}

#[test]
fn positive_rotation_turns_counter_clockwise_on_screen() {
    let p = AffineParams {
        rotation_deg: 90.0,
        ..AffineParams::IDENTITY
    };
    let m = affine_matrix(&p, 100, 100);
    // A point right of the centre moves above it (smaller y).
    assert!(close(m.transform_point(60.0, 50.0), (50.0, 40.0)));
}

#[test]
fn matches_closed_form_coefficients() {
    let p = AffineParams {
        translate_x: 60.0,
        translate_y: 40.0,
        scale: 1.15,
        rotation_deg: 8.0,
    };
    let (w, h) = (1280u32, 720u32);
    let m = affine_matrix(&p, w, h);
    let (cx, cy) = (640.0, 360.0);
    let t = 8.0f64.to_radians();
    let a = 1.15 * t.cos();
    let b = 1.15 * t.sin();
    let expected = [
        [a, b, (1.0 - a) * cx - b * cy + 60.0],
        [-b, a, b * cx + (1.0 - a) * cy + 40.0],
        [0.0, 0.0, 1.0],
    ];
    for (row, exp) in m.rows.iter().zip(expected.iter()) {
        for (v, e) in row.iter().zip(exp.iter()) {
            assert!((v - e).abs() < 1e-9, "{:?} vs {:?}", m.rows, expected);
        }
    }
}

#[test]
fn inverse_undoes_the_transform() {
    let p = AffineParams {
        translate_x: 12.5,
        translate_y: -3.0,
        scale: 0.8,
        rotation_deg: -21.0,
    };
    let m = affine_matrix(&p, 320, 200);
    let inv = m.inverse().unwrap();
    let (x, y) = m.transform_point(17.0, 91.0);
    assert!(close(inv.transform_point(x, y), (17.0, 91.0)));
}

#[test]
fn non_positive_scale_is_clamped_not_singular() {
    let p = AffineParams {
        scale: 0.0,
        ..AffineParams::IDENTITY
    };
    let m = affine_matrix(&p, 64, 64);
    assert!((m.determinant() - MIN_SCALE_SQ).abs() < 1e-12);
    assert!(m.inverse().is_some());
}

const MIN_SCALE_SQ: f64 = crate::foundation::core::MIN_SCALE * crate::foundation::core::MIN_SCALE;

#[test]
fn gpu_columns_are_column_major_and_padded() {
    let m = AffineMatrix {
        rows: [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [0.0, 0.0, 1.0]],
    };
    let cols = m.to_gpu_columns();
    assert_eq!(cols[0], [1.0, 4.0, 0.0, 0.0]);
    assert_eq!(cols[1], [2.0, 5.0, 0.0, 0.0]);
    assert_eq!(cols[2], [3.0, 6.0, 1.0, 0.0]);
}

#[test]
fn kurbo_round_trip_preserves_coefficients() {
    let m = AffineMatrix {
        rows: [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [0.0, 0.0, 1.0]],
    };
    assert_eq!(AffineMatrix::from_affine(m.to_affine()), m);
}
