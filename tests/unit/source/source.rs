use super::*;

#[test]
fn synthetic_frames_have_requested_size() {
    let mut src = SyntheticSource::default();
    let f = src.next_frame(Resolution::new(64, 48)).unwrap();
    assert_eq!(f.resolution(), Resolution::new(64, 48));
    assert!(f.is_well_formed());
    assert_eq!(src.tick(), 1);
}

#[test]
fn synthetic_frames_are_deterministic_per_tick() {
    let a = SyntheticSource::new(9);
    let b = SyntheticSource::new(9);
    let res = Resolution::new(32, 32);
    assert_eq!(a.frame_at(res, 5), b.frame_at(res, 5));
    assert_ne!(a.frame_at(res, 5), a.frame_at(res, 6));
}

#[test]
fn synthetic_frame_draws_disc_at_moving_center() {
    let src = SyntheticSource::new(1);
    let res = Resolution::new(200, 120);
    let tick = 3;
    let f = src.frame_at(res, tick);
    // Centre (111, 39), radius max(8, 120 / 12) = 10.
    assert_eq!(f.pixel(111, 39), SyntheticSource::DISC_COLOR);
    assert_eq!(f.pixel(121, 39), SyntheticSource::DISC_COLOR);
    assert_eq!(f.pixel(111, 29), SyntheticSource::DISC_COLOR);
}

#[test]
fn disc_is_clipped_at_frame_edges() {
    let src = SyntheticSource::new(1);
    let f = src.frame_at(Resolution::new(16, 16), 0);
    assert_eq!(f.pixel(0, 0), SyntheticSource::DISC_COLOR);
    assert!(f.is_well_formed());
}

#[test]
fn image_source_resizes_and_caches() {
    let img = image::RgbImage::from_pixel(10, 6, image::Rgb([200, 100, 50]));
    let mut src = ImageSource::from_image(img);
    assert_eq!(src.native_resolution(), Resolution::new(10, 6));

    let native = src.next_frame(Resolution::new(10, 6)).unwrap();
    assert_eq!(native.pixel(3, 3), Bgr8::new(50, 100, 200));

    let scaled = src.next_frame(Resolution::new(20, 12)).unwrap();
    assert_eq!(scaled.resolution(), Resolution::new(20, 12));
    assert_eq!(scaled.pixel(19, 11), Bgr8::new(50, 100, 200));
}

#[test]
fn image_source_open_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = ImageSource::open(&dir.path().join("missing.png"))
        .err()
        .unwrap()
        .to_string();
    assert!(err.starts_with("validation error:"), "{err}");
}

#[test]
fn image_source_open_reads_png() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("still.png");
    image::RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]))
        .save(&path)
        .unwrap();
    let mut src = ImageSource::open(&path).unwrap();
    let f = src.next_frame(Resolution::new(4, 4)).unwrap();
    assert_eq!(f.pixel(0, 0), Bgr8::new(3, 2, 1));
}
