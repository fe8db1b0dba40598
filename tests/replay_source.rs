use std::io::Write;

use face_fx::detection::{normalize, LandmarkSource, NormalizeOptions, ReplaySource};
use face_fx::frame::Handedness;
use image::DynamicImage;

fn feed(lines: &[&str]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
    file
}

#[test]
fn replays_batches_in_order_and_loops() {
    let file = feed(&[
        r#"{"faces":[{"keypoints":[{"x":1,"y":1}]}]}"#,
        "",
        r#"{"hands":[{"landmarks":[[0.5,0.5]],"handedness":"Left"}],"normalized":true}"#,
    ]);
    let mut source = ReplaySource::new(file.path());
    source.probe().unwrap();

    let frame = DynamicImage::new_rgba8(640, 480);
    let options = NormalizeOptions::new(640.0, 480.0);

    let first = normalize(&source.detect(&frame).unwrap(), &options, 1);
    assert_eq!(first.faces.len(), 1);
    assert!(first.hands.is_empty());

    let second = normalize(&source.detect(&frame).unwrap(), &options, 2);
    assert!(second.faces.is_empty());
    assert_eq!(second.hands[0].handedness, Handedness::Left);
    assert_eq!(second.hands[0].landmarks[0].x, 320.0);
    assert_eq!(second.hands[0].landmarks[0].y, 240.0);

    let third = normalize(&source.detect(&frame).unwrap(), &options, 3);
    assert_eq!(third.faces, first.faces);
}

#[test]
fn bad_line_fails_the_probe_with_its_line_number() {
    let file = feed(&[r#"{"faces":[]}"#, "{oops"]);
    let mut source = ReplaySource::new(file.path());
    let err = source.probe().unwrap_err();
    assert!(err.to_string().contains("line 2"), "{err}");
}

#[test]
fn empty_feed_fails_the_probe() {
    let file = feed(&["", "   "]);
    assert!(ReplaySource::new(file.path()).probe().is_err());
}
