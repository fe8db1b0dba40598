// src/detection/adapter.rs - Converts whatever a landmark detector emits into FrameState
//
// Detectors disagree on field names and point encodings. All of that is absorbed
// here, once; nothing downstream ever looks at a raw detection.

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::frame::{FaceResult, FrameState, HandResult, Handedness};
use crate::geometry::Point;

/// Faces tracked at once.
pub const MAX_FACES: usize = 1;
/// Hands tracked at once.
pub const MAX_HANDS: usize = 2;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawPoint {
    Object {
        x: f32,
        y: f32,
        #[serde(default)]
        z: f32,
    },
    Array(Vec<f32>),
}

impl RawPoint {
    pub fn xy(x: f32, y: f32) -> Self {
        RawPoint::Object { x, y, z: 0.0 }
    }

    fn to_point(&self) -> Option<Point> {
        let (x, y, z) = match self {
            RawPoint::Object { x, y, z } => (*x, *y, *z),
            RawPoint::Array(values) => match values.as_slice() {
                [x, y] => (*x, *y, 0.0),
                [x, y, z, ..] => (*x, *y, *z),
                _ => return None,
            },
        };
        (x.is_finite() && y.is_finite()).then(|| Point::with_z(x, y, if z.is_finite() { z } else { 0.0 }))
    }
}

/// A classifier category. MediaPipe sends both `categoryName` and `displayName`,
/// so each spelling gets its own slot.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCategory {
    #[serde(default, rename = "categoryName", alias = "category_name")]
    pub category_name: Option<String>,
    #[serde(default, rename = "displayName", alias = "display_name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl RawCategory {
    fn name(&self) -> Option<&str> {
        [&self.category_name, &self.display_name, &self.label]
            .into_iter()
            .filter_map(|name| name.as_deref())
            .find(|name| !name.trim().is_empty())
    }

    fn resolve(&self) -> Handedness {
        self.name().map_or(Handedness::Unknown, Handedness::from_label)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawHandedness {
    Label(String),
    Category(RawCategory),
    Categories(Vec<RawCategory>),
}

impl RawHandedness {
    fn resolve(&self) -> Handedness {
        match self {
            RawHandedness::Label(label) => Handedness::from_label(label),
            RawHandedness::Category(category) => category.resolve(),
            RawHandedness::Categories(categories) => categories
                .first()
                .map_or(Handedness::Unknown, RawCategory::resolve),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawResult {
    Keyed {
        #[serde(alias = "landmarks", alias = "points")]
        keypoints: Vec<RawPoint>,
        #[serde(default, alias = "label")]
        handedness: Option<RawHandedness>,
    },
    Bare(Vec<RawPoint>),
}

impl RawResult {
    pub fn points(points: Vec<RawPoint>) -> Self {
        RawResult::Keyed {
            keypoints: points,
            handedness: None,
        }
    }

    pub fn hand(points: Vec<RawPoint>, label: &str) -> Self {
        RawResult::Keyed {
            keypoints: points,
            handedness: Some(RawHandedness::Label(label.to_string())),
        }
    }

    fn keypoints(&self) -> &[RawPoint] {
        match self {
            RawResult::Keyed { keypoints, .. } => keypoints,
            RawResult::Bare(points) => points,
        }
    }

    fn handedness(&self) -> Option<&RawHandedness> {
        match self {
            RawResult::Keyed { handedness, .. } => handedness.as_ref(),
            RawResult::Bare(_) => None,
        }
    }
}

/// One detection batch as a detector produced it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawDetection {
    #[serde(
        default,
        alias = "faceLandmarks",
        alias = "multiFaceLandmarks",
        alias = "face_landmarks"
    )]
    pub faces: Vec<RawResult>,
    #[serde(
        default,
        alias = "handLandmarks",
        alias = "multiHandLandmarks",
        alias = "hand_landmarks"
    )]
    pub hands: Vec<RawResult>,
    /// Per-hand labels some detectors report in a parallel array
    #[serde(default, alias = "handednesses", alias = "multiHandedness")]
    pub handedness: Vec<RawHandedness>,
    /// Coordinates are in [0, 1] and need scaling to the frame size
    #[serde(default)]
    pub normalized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizeOptions {
    pub frame_width: f32,
    pub frame_height: f32,
    /// Flip x for detectors that ran on the unmirrored image
    pub mirror: bool,
}

impl NormalizeOptions {
    pub fn new(frame_width: f32, frame_height: f32) -> Self {
        Self {
            frame_width,
            frame_height,
            mirror: false,
        }
    }
}

// A malformed point ends the sequence, so later indices never shift onto the
// wrong landmark; the shortened array then reads as "feature unavailable".
fn convert_points(raw: &[RawPoint], normalized: bool, opts: &NormalizeOptions) -> Vec<Point> {
    raw.iter()
        .map_while(RawPoint::to_point)
        .map(|mut p| {
            if normalized {
                p.x *= opts.frame_width;
                p.y *= opts.frame_height;
            }
            if opts.mirror {
                p.x = opts.frame_width - p.x;
            }
            p
        })
        .collect()
}

pub fn normalize(raw: &RawDetection, opts: &NormalizeOptions, batch: u64) -> FrameState {
    let faces = raw
        .faces
        .iter()
        .take(MAX_FACES)
        .map(|face| FaceResult::new(convert_points(face.keypoints(), raw.normalized, opts)))
        .collect();

    let hands = raw
        .hands
        .iter()
        .take(MAX_HANDS)
        .enumerate()
        .map(|(i, hand)| {
            let handedness = hand
                .handedness()
                .or_else(|| raw.handedness.get(i))
                .map_or(Handedness::Unknown, RawHandedness::resolve);
            HandResult::new(convert_points(hand.keypoints(), raw.normalized, opts), handedness)
        })
        .collect();

    FrameState {
        faces,
        hands,
        batch,
    }
}

/// Parses one line of a JSON-lines landmark feed. `line` is 1-based, for messages.
pub fn parse_feed_line(text: &str, line: usize) -> Result<RawDetection> {
    serde_json::from_str(text).map_err(|e| Error::Feed {
        line,
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> NormalizeOptions {
        NormalizeOptions::new(640.0, 480.0)
    }

    #[test]
    fn accepts_object_points_under_keypoints() {
        let raw = parse_feed_line(
            r#"{"faces":[{"keypoints":[{"x":1,"y":2},{"x":3,"y":4,"z":-1}]}]}"#,
            1,
        )
        .unwrap();
        let frame = normalize(&raw, &opts(), 1);
        assert_eq!(
            frame.faces[0].landmarks,
            vec![Point::new(1.0, 2.0), Point::with_z(3.0, 4.0, -1.0)]
        );
    }

    #[test]
    fn accepts_alternate_names_and_bare_arrays() {
        let raw = parse_feed_line(
            r#"{"multiFaceLandmarks":[[[10,20,0.5],[30,40]]],
                "multiHandLandmarks":[{"landmarks":[[5,6]]}],
                "multiHandedness":[{"categoryName":"Left"}]}"#,
            1,
        )
        .unwrap();
        let frame = normalize(&raw, &opts(), 2);
        assert_eq!(frame.faces[0].landmarks.len(), 2);
        assert_eq!(frame.faces[0].landmarks[0], Point::with_z(10.0, 20.0, 0.5));
        assert_eq!(frame.hands[0].handedness, Handedness::Left);
        assert_eq!(frame.batch, 2);
    }

    #[test]
    fn handedness_from_category_list() {
        let raw = parse_feed_line(
            r#"{"hands":[{"keypoints":[[1,1]],"handedness":[{"categoryName":"Right","score":0.9}]}]}"#,
            1,
        )
        .unwrap();
        assert_eq!(normalize(&raw, &opts(), 1).hands[0].handedness, Handedness::Right);
    }

    #[test]
    fn mediapipe_tasks_categories_with_both_names() {
        let raw = parse_feed_line(
            r#"{"handLandmarks":[[[1,1]],[[2,2]]],
                "handedness":[
                    [{"score":0.9,"index":0,"categoryName":"Left","displayName":"Left"}],
                    [{"score":0.8,"index":1,"categoryName":"Right","displayName":"Right"}]
                ]}"#,
            1,
        )
        .unwrap();
        let frame = normalize(&raw, &opts(), 1);
        assert_eq!(frame.hands[0].handedness, Handedness::Left);
        assert_eq!(frame.hands[1].handedness, Handedness::Right);
    }

    #[test]
    fn category_falls_back_to_display_name() {
        let raw = parse_feed_line(
            r#"{"hands":[{"keypoints":[[1,1]],"handedness":{"categoryName":"","displayName":"Right"}}]}"#,
            1,
        )
        .unwrap();
        assert_eq!(normalize(&raw, &opts(), 1).hands[0].handedness, Handedness::Right);
    }

    #[test]
    fn truncates_to_one_face_and_two_hands() {
        let face = RawResult::points(vec![RawPoint::xy(1.0, 1.0)]);
        let hand = RawResult::hand(vec![RawPoint::xy(2.0, 2.0)], "Right");
        let raw = RawDetection {
            faces: vec![face.clone(), face],
            hands: vec![hand.clone(), hand.clone(), hand],
            ..RawDetection::default()
        };
        let frame = normalize(&raw, &opts(), 1);
        assert_eq!(frame.faces.len(), 1);
        assert_eq!(frame.hands.len(), 2);
    }

    #[test]
    fn scales_normalized_and_mirrors() {
        let raw = RawDetection {
            faces: vec![RawResult::points(vec![RawPoint::xy(0.25, 0.5)])],
            normalized: true,
            ..RawDetection::default()
        };
        let mut options = opts();
        options.mirror = true;
        let frame = normalize(&raw, &options, 1);
        assert_eq!(frame.faces[0].landmarks[0], Point::new(480.0, 240.0));
    }

    #[test]
    fn malformed_point_ends_the_sequence() {
        let raw = RawDetection {
            faces: vec![RawResult::points(vec![
                RawPoint::xy(1.0, 1.0),
                RawPoint::Array(vec![3.0]),
                RawPoint::xy(2.0, 2.0),
            ])],
            ..RawDetection::default()
        };
        assert_eq!(normalize(&raw, &opts(), 1).faces[0].landmarks.len(), 1);
    }

    #[test]
    fn empty_object_is_an_empty_frame() {
        let frame = normalize(&parse_feed_line("{}", 1).unwrap(), &opts(), 9);
        assert!(frame.faces.is_empty());
        assert!(frame.hands.is_empty());
    }

    #[test]
    fn bad_json_reports_line() {
        match parse_feed_line("{not json", 7) {
            Err(Error::Feed { line, .. }) => assert_eq!(line, 7),
            other => panic!("unexpected {other:?}"),
        }
    }
}
