// src/landmarks.rs - Named landmark tables for the face mesh and hand topologies
use crate::error::{Error, Result};

/// Points in a full face mesh result.
pub const FACE_TOPOLOGY_SIZE: usize = 478;
/// Points in a hand result.
pub const HAND_TOPOLOGY_SIZE: usize = 21;

/// Face mesh landmarks the feature engine and effects address by name.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceLandmark {
    NoseTip = 1,
    Forehead = 10,
    UpperLipInner = 13,
    LowerLipInner = 14,
    LeftEyeOuter = 33,
    MouthLeft = 61,
    LeftForehead = 103,
    LeftEyeLower = 145,
    Chin = 152,
    LeftEyeUpper = 159,
    LeftCheek = 234,
    RightEyeOuter = 263,
    MouthRight = 291,
    RightForehead = 332,
    RightEyeLower = 374,
    RightEyeUpper = 386,
    RightCheek = 454,
}

impl FaceLandmark {
    pub const ALL: [FaceLandmark; 17] = [
        FaceLandmark::NoseTip,
        FaceLandmark::Forehead,
        FaceLandmark::UpperLipInner,
        FaceLandmark::LowerLipInner,
        FaceLandmark::LeftEyeOuter,
        FaceLandmark::MouthLeft,
        FaceLandmark::LeftForehead,
        FaceLandmark::LeftEyeLower,
        FaceLandmark::Chin,
        FaceLandmark::LeftEyeUpper,
        FaceLandmark::LeftCheek,
        FaceLandmark::RightEyeOuter,
        FaceLandmark::MouthRight,
        FaceLandmark::RightForehead,
        FaceLandmark::RightEyeLower,
        FaceLandmark::RightEyeUpper,
        FaceLandmark::RightCheek,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            FaceLandmark::NoseTip => "nose_tip",
            FaceLandmark::Forehead => "forehead",
            FaceLandmark::UpperLipInner => "upper_lip_inner",
            FaceLandmark::LowerLipInner => "lower_lip_inner",
            FaceLandmark::LeftEyeOuter => "left_eye_outer",
            FaceLandmark::MouthLeft => "mouth_left",
            FaceLandmark::LeftForehead => "left_forehead",
            FaceLandmark::LeftEyeLower => "left_eye_lower",
            FaceLandmark::Chin => "chin",
            FaceLandmark::LeftEyeUpper => "left_eye_upper",
            FaceLandmark::LeftCheek => "left_cheek",
            FaceLandmark::RightEyeOuter => "right_eye_outer",
            FaceLandmark::MouthRight => "mouth_right",
            FaceLandmark::RightForehead => "right_forehead",
            FaceLandmark::RightEyeLower => "right_eye_lower",
            FaceLandmark::RightEyeUpper => "right_eye_upper",
            FaceLandmark::RightCheek => "right_cheek",
        }
    }
}

/// Hand landmarks, numbered the way hand pose models emit them.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist = 0,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl HandLandmark {
    /// Thumb to pinky.
    pub const FINGERTIPS: [HandLandmark; 5] = [
        HandLandmark::ThumbTip,
        HandLandmark::IndexTip,
        HandLandmark::MiddleTip,
        HandLandmark::RingTip,
        HandLandmark::PinkyTip,
    ];

    pub const BONES: [(HandLandmark, HandLandmark); 21] = [
        (HandLandmark::Wrist, HandLandmark::ThumbCmc),
        (HandLandmark::ThumbCmc, HandLandmark::ThumbMcp),
        (HandLandmark::ThumbMcp, HandLandmark::ThumbIp),
        (HandLandmark::ThumbIp, HandLandmark::ThumbTip),
        (HandLandmark::Wrist, HandLandmark::IndexMcp),
        (HandLandmark::IndexMcp, HandLandmark::IndexPip),
        (HandLandmark::IndexPip, HandLandmark::IndexDip),
        (HandLandmark::IndexDip, HandLandmark::IndexTip),
        (HandLandmark::IndexMcp, HandLandmark::MiddleMcp),
        (HandLandmark::MiddleMcp, HandLandmark::MiddlePip),
        (HandLandmark::MiddlePip, HandLandmark::MiddleDip),
        (HandLandmark::MiddleDip, HandLandmark::MiddleTip),
        (HandLandmark::MiddleMcp, HandLandmark::RingMcp),
        (HandLandmark::RingMcp, HandLandmark::RingPip),
        (HandLandmark::RingPip, HandLandmark::RingDip),
        (HandLandmark::RingDip, HandLandmark::RingTip),
        (HandLandmark::RingMcp, HandLandmark::PinkyMcp),
        (HandLandmark::PinkyMcp, HandLandmark::PinkyPip),
        (HandLandmark::PinkyPip, HandLandmark::PinkyDip),
        (HandLandmark::PinkyDip, HandLandmark::PinkyTip),
        (HandLandmark::Wrist, HandLandmark::PinkyMcp),
    ];

    pub const fn index(self) -> usize {
        self as usize
    }
}

fn check_table(
    topology: &'static str,
    size: usize,
    entries: impl IntoIterator<Item = (&'static str, usize)>,
) -> Result<()> {
    for (name, index) in entries {
        if index >= size {
            return Err(Error::Topology {
                topology,
                name,
                index,
                size,
            });
        }
    }
    Ok(())
}

/// Checks every named landmark against its topology size. Run once at start-up so a
/// bad index shows up as a configuration error instead of a wrong landmark.
pub fn validate_topology() -> Result<()> {
    check_table(
        "face",
        FACE_TOPOLOGY_SIZE,
        FaceLandmark::ALL.iter().map(|lm| (lm.name(), lm.index())),
    )?;
    check_table(
        "hand",
        HAND_TOPOLOGY_SIZE,
        HandLandmark::BONES
            .iter()
            .flat_map(|(a, b)| [*a, *b])
            .map(|lm| ("hand_joint", lm.index())),
    )
}
