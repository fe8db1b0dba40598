// src/features.rs - Landmark feature engine: yes/no and positional questions about one frame
//
// Every function here is total. Missing or short landmark arrays answer with the
// neutral value for that feature instead of failing.

use serde::{Deserialize, Serialize};

use crate::frame::{FaceResult, FrameState, HandResult};
use crate::geometry::{distance, Point};
use crate::landmarks::{FaceLandmark, HandLandmark, FACE_TOPOLOGY_SIZE};

/// Pixel thresholds tuned for a 640x480 mirrored webcam feed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureThresholds {
    /// Inner-lip gap above which the mouth counts as open
    pub mouth_open_px: f32,
    /// Eyelid gap above which an eye counts as open
    pub eye_open_px: f32,
    /// Fingertips closer than this to the wrist count as curled
    pub fist_radius_px: f32,
    /// Curled fingertips needed to call the hand a fist
    pub fist_min_curled: usize,
    /// Nose lookup needs at least this many face points
    pub nose_min_points: usize,
}

impl Default for FeatureThresholds {
    fn default() -> Self {
        Self {
            mouth_open_px: 15.0,
            eye_open_px: 8.0,
            fist_radius_px: 100.0,
            fist_min_curled: 3,
            nose_min_points: 3,
        }
    }
}

fn full_face(frame: &FrameState) -> Option<&FaceResult> {
    frame.face().filter(|face| face.len() >= FACE_TOPOLOGY_SIZE)
}

fn gap(face: &FaceResult, a: FaceLandmark, b: FaceLandmark) -> f32 {
    distance(face.point(a), face.point(b))
}

pub fn is_mouth_open(frame: &FrameState, thresholds: &FeatureThresholds) -> bool {
    full_face(frame).map_or(false, |face| {
        gap(face, FaceLandmark::UpperLipInner, FaceLandmark::LowerLipInner)
            > thresholds.mouth_open_px
    })
}

// Eyes default to open when there is nothing to measure, unlike the mouth.
pub fn is_left_eye_open(frame: &FrameState, thresholds: &FeatureThresholds) -> bool {
    full_face(frame).map_or(true, |face| {
        gap(face, FaceLandmark::LeftEyeUpper, FaceLandmark::LeftEyeLower) > thresholds.eye_open_px
    })
}

pub fn is_right_eye_open(frame: &FrameState, thresholds: &FeatureThresholds) -> bool {
    full_face(frame).map_or(true, |face| {
        gap(face, FaceLandmark::RightEyeUpper, FaceLandmark::RightEyeLower)
            > thresholds.eye_open_px
    })
}

pub fn nose_center(frame: &FrameState, thresholds: &FeatureThresholds) -> Option<Point> {
    frame
        .face()
        .filter(|face| face.len() >= thresholds.nose_min_points)
        .and_then(|face| face.point(FaceLandmark::NoseTip))
        .copied()
}

/// Anchor for fire breath and the mouth text: the inner lower lip.
pub fn mouth_base(frame: &FrameState) -> Option<Point> {
    full_face(frame)
        .and_then(|face| face.point(FaceLandmark::LowerLipInner))
        .copied()
}

pub fn wrist_positions(frame: &FrameState) -> Vec<Option<Point>> {
    frame
        .hands
        .iter()
        .map(|hand| hand.point(HandLandmark::Wrist).copied())
        .collect()
}

pub fn is_hand_fist(hand: &HandResult, thresholds: &FeatureThresholds) -> bool {
    let Some(wrist) = hand.point(HandLandmark::Wrist) else {
        return false;
    };

    // A missing fingertip is not evidence of a curled finger.
    let curled = HandLandmark::FINGERTIPS
        .iter()
        .filter_map(|tip| hand.point(*tip))
        .filter(|tip| distance(Some(*tip), Some(wrist)) < thresholds.fist_radius_px)
        .count();

    curled >= thresholds.fist_min_curled
}

pub fn hands_open_status(frame: &FrameState, thresholds: &FeatureThresholds) -> Vec<bool> {
    frame
        .hands
        .iter()
        .map(|hand| !is_hand_fist(hand, thresholds))
        .collect()
}

pub fn fingertip_positions(hand: &HandResult) -> [Option<Point>; 5] {
    HandLandmark::FINGERTIPS.map(|tip| hand.point(tip).copied())
}

pub fn all_fingertip_positions(frame: &FrameState) -> Vec<[Option<Point>; 5]> {
    frame.hands.iter().map(fingertip_positions).collect()
}

/// Readout categories the user can switch on independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DataOption {
    Mouth,
    Eyes,
    Nose,
    Wrists,
    Fingertips,
    HandsOpen,
}

impl DataOption {
    pub const ALL: [DataOption; 6] = [
        DataOption::Mouth,
        DataOption::Eyes,
        DataOption::Nose,
        DataOption::Wrists,
        DataOption::Fingertips,
        DataOption::HandsOpen,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DataOption::Mouth => "Mouth",
            DataOption::Eyes => "Eyes",
            DataOption::Nose => "Nose",
            DataOption::Wrists => "Wrists",
            DataOption::Fingertips => "Fingertips",
            DataOption::HandsOpen => "Hands open",
        }
    }
}

/// Every feature of one frame, computed once.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureReadout {
    pub mouth_open: bool,
    pub left_eye_open: bool,
    pub right_eye_open: bool,
    pub nose: Option<Point>,
    pub wrists: Vec<Option<Point>>,
    pub fingertips: Vec<[Option<Point>; 5]>,
    pub hands_open: Vec<bool>,
}

fn format_point(point: Option<Point>) -> String {
    match point {
        Some(p) => format!("({:.1}, {:.1})", p.x, p.y),
        None => "none".to_string(),
    }
}

impl FeatureReadout {
    pub fn from_frame(frame: &FrameState, thresholds: &FeatureThresholds) -> Self {
        Self {
            mouth_open: is_mouth_open(frame, thresholds),
            left_eye_open: is_left_eye_open(frame, thresholds),
            right_eye_open: is_right_eye_open(frame, thresholds),
            nose: nose_center(frame, thresholds),
            wrists: wrist_positions(frame),
            fingertips: all_fingertip_positions(frame),
            hands_open: hands_open_status(frame, thresholds),
        }
    }

    /// `"<label>: <value>"` lines for the enabled options, in `DataOption::ALL` order.
    pub fn lines(&self, enabled: impl Fn(DataOption) -> bool) -> Vec<String> {
        let mut lines = Vec::new();

        for option in DataOption::ALL.into_iter().filter(|o| enabled(*o)) {
            match option {
                DataOption::Mouth => lines.push(format!("Mouth open: {}", self.mouth_open)),
                DataOption::Eyes => {
                    lines.push(format!("Left eye open: {}", self.left_eye_open));
                    lines.push(format!("Right eye open: {}", self.right_eye_open));
                }
                DataOption::Nose => lines.push(format!("Nose: {}", format_point(self.nose))),
                DataOption::Wrists => {
                    if self.wrists.is_empty() {
                        lines.push("Wrists: none".to_string());
                    }
                    for (i, wrist) in self.wrists.iter().enumerate() {
                        lines.push(format!("Wrist {}: {}", i + 1, format_point(*wrist)));
                    }
                }
                DataOption::Fingertips => {
                    if self.fingertips.is_empty() {
                        lines.push("Fingertips: none".to_string());
                    }
                    for (i, tips) in self.fingertips.iter().enumerate() {
                        let joined = tips
                            .iter()
                            .map(|tip| format_point(*tip))
                            .collect::<Vec<_>>()
                            .join(" ");
                        lines.push(format!("Hand {} fingertips: {}", i + 1, joined));
                    }
                }
                DataOption::HandsOpen => {
                    if self.hands_open.is_empty() {
                        lines.push("Hands open: none".to_string());
                    }
                    for (i, open) in self.hands_open.iter().enumerate() {
                        lines.push(format!("Hand {} open: {}", i + 1, open));
                    }
                }
            }
        }

        lines
    }
}
