// src/geometry.rs - Landmark points and the distance helper every feature test uses
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// A single landmark in pixel space of the current (already mirrored) frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub fn with_z(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn xy(&self) -> Vector2<f32> {
        Vector2::new(self.x, self.y)
    }
}

/// Euclidean distance in the image plane. Absent points measure as 0.
pub fn distance(p1: Option<&Point>, p2: Option<&Point>) -> f32 {
    match (p1, p2) {
        (Some(a), Some(b)) => (a.xy() - b.xy()).norm(),
        _ => 0.0,
    }
}
