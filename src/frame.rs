// src/frame.rs - Per-frame detection snapshot and the slot it is published through
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::landmarks::{FaceLandmark, HandLandmark};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceResult {
    pub landmarks: Vec<Point>,
}

impl FaceResult {
    pub fn new(landmarks: Vec<Point>) -> Self {
        Self { landmarks }
    }

    pub fn len(&self) -> usize {
        self.landmarks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn point(&self, landmark: FaceLandmark) -> Option<&Point> {
        self.landmarks.get(landmark.index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
    #[default]
    Unknown,
}

impl Handedness {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "left" => Handedness::Left,
            "right" => Handedness::Right,
            _ => Handedness::Unknown,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandResult {
    pub landmarks: Vec<Point>,
    /// Advisory only; models frequently swap it for mirrored input.
    pub handedness: Handedness,
}

impl HandResult {
    pub fn new(landmarks: Vec<Point>, handedness: Handedness) -> Self {
        Self {
            landmarks,
            handedness,
        }
    }

    pub fn point(&self, landmark: HandLandmark) -> Option<&Point> {
        self.landmarks.get(landmark.index())
    }
}

/// The latest detection batch. Never mutated after publication.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameState {
    pub faces: Vec<FaceResult>,
    pub hands: Vec<HandResult>,
    /// Sequence number of the detection batch, 0 for the initial empty state.
    pub batch: u64,
}

impl FrameState {
    pub fn face(&self) -> Option<&FaceResult> {
        self.faces.first()
    }

    pub fn has_face(&self) -> bool {
        self.face().map_or(false, |f| !f.is_empty())
    }
}

/// Single mutable slot holding the current `FrameState`.
///
/// Publishing swaps the whole `Arc`; readers clone it and keep a consistent snapshot
/// for the rest of their render tick.
#[derive(Clone, Default)]
pub struct FrameSlot {
    current: Arc<Mutex<Arc<FrameState>>>,
}

impl FrameSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, state: FrameState) {
        let next = Arc::new(state);
        match self.current.lock() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    pub fn snapshot(&self) -> Arc<FrameState> {
        match self.current.lock() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}
