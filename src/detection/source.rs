// src/detection/source.rs - Landmark sources: the seam to the external detection models
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::DynamicImage;
use tracing::info;

use super::adapter::{parse_feed_line, RawDetection, RawPoint, RawResult};
use crate::landmarks::{FaceLandmark, HandLandmark, FACE_TOPOLOGY_SIZE, HAND_TOPOLOGY_SIZE};

/// Something that turns camera frames into raw landmark detections.
///
/// Calls are blocking; the detection worker runs them off the render thread.
pub trait LandmarkSource: Send {
    fn name(&self) -> &str;

    /// Readiness check, retried by the worker until it succeeds or gives up.
    fn probe(&mut self) -> Result<()>;

    fn detect(&mut self, frame: &DynamicImage) -> Result<RawDetection>;
}

/// Synthetic face and hand that move, blink, talk and clench over time.
pub struct SimulatedSource {
    sim_time: f32,
}

impl SimulatedSource {
    pub fn new() -> Self {
        Self { sim_time: 0.0 }
    }

    fn face(&self, w: f32, h: f32) -> Vec<RawPoint> {
        let t = self.sim_time;
        let cx = w * 0.5 + w * 0.04 * (t * 0.3).sin();
        let cy = h * 0.45;
        let rx = w * 0.16;
        let ry = h * 0.3;

        let mut points: Vec<(f32, f32)> = (0..FACE_TOPOLOGY_SIZE)
            .map(|i| {
                let a = i as f32 / FACE_TOPOLOGY_SIZE as f32 * std::f32::consts::TAU;
                (cx + rx * a.cos(), cy + ry * a.sin())
            })
            .collect();

        let mouth_gap = (t * 0.7).sin().max(0.0) * 40.0;
        // Left eye blinks for a moment every ~6 seconds.
        let left_lid = if (t % 6.0) < 0.4 { 3.0 } else { 12.0 };
        let right_lid = 12.0;
        let lip_y = cy + ry * 0.45;

        let mut set = |lm: FaceLandmark, x: f32, y: f32| points[lm.index()] = (x, y);
        set(FaceLandmark::Forehead, cx, cy - ry);
        set(FaceLandmark::Chin, cx, cy + ry);
        set(FaceLandmark::NoseTip, cx, cy + ry * 0.1);
        set(FaceLandmark::LeftForehead, cx - rx * 0.6, cy - ry * 0.8);
        set(FaceLandmark::RightForehead, cx + rx * 0.6, cy - ry * 0.8);
        set(FaceLandmark::LeftCheek, cx - rx, cy + ry * 0.1);
        set(FaceLandmark::RightCheek, cx + rx, cy + ry * 0.1);
        set(FaceLandmark::LeftEyeOuter, cx - rx * 0.6, cy - ry * 0.2);
        set(FaceLandmark::RightEyeOuter, cx + rx * 0.6, cy - ry * 0.2);
        set(FaceLandmark::LeftEyeUpper, cx - rx * 0.4, cy - ry * 0.25);
        set(FaceLandmark::LeftEyeLower, cx - rx * 0.4, cy - ry * 0.25 + left_lid);
        set(FaceLandmark::RightEyeUpper, cx + rx * 0.4, cy - ry * 0.25);
        set(FaceLandmark::RightEyeLower, cx + rx * 0.4, cy - ry * 0.25 + right_lid);
        set(FaceLandmark::MouthLeft, cx - rx * 0.35, lip_y + mouth_gap * 0.5);
        set(FaceLandmark::MouthRight, cx + rx * 0.35, lip_y + mouth_gap * 0.5);
        set(FaceLandmark::UpperLipInner, cx, lip_y);
        set(FaceLandmark::LowerLipInner, cx, lip_y + 4.0 + mouth_gap);

        points.into_iter().map(|(x, y)| RawPoint::xy(x, y)).collect()
    }

    fn hand(&self, w: f32, h: f32) -> Vec<RawPoint> {
        let t = self.sim_time;
        let wrist = (w * 0.78 + w * 0.05 * (t * 0.5).sin(), h * 0.8);
        // 1.0 open, 0.3 clenched
        let extension = 0.65 + 0.35 * (t * 0.4).cos();
        let segment = 35.0;

        let mut points = vec![wrist; HAND_TOPOLOGY_SIZE];
        for finger in 0..5 {
            let angle = (-150.0 + finger as f32 * 30.0).to_radians();
            let (dx, dy) = (angle.cos(), angle.sin());
            for joint in 1..=4 {
                let reach = joint as f32 * segment * extension;
                let index = HandLandmark::ThumbCmc.index() + finger * 4 + (joint - 1);
                points[index] = (wrist.0 + dx * reach, wrist.1 + dy * reach);
            }
        }

        points.into_iter().map(|(x, y)| RawPoint::xy(x, y)).collect()
    }
}

impl Default for SimulatedSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkSource for SimulatedSource {
    fn name(&self) -> &str {
        "simulation"
    }

    fn probe(&mut self) -> Result<()> {
        Ok(())
    }

    fn detect(&mut self, frame: &DynamicImage) -> Result<RawDetection> {
        self.sim_time += 0.1;
        let (w, h) = (frame.width() as f32, frame.height() as f32);
        Ok(RawDetection {
            faces: vec![RawResult::points(self.face(w, h))],
            hands: vec![RawResult::hand(self.hand(w, h), "Right")],
            ..RawDetection::default()
        })
    }
}

/// Replays a JSON-lines landmark feed recorded from an external detector, one batch
/// per detection call, looping at the end.
pub struct ReplaySource {
    path: PathBuf,
    name: String,
    batches: Vec<RawDetection>,
    cursor: usize,
}

impl ReplaySource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = format!("replay:{}", path.display());
        Self {
            path,
            name,
            batches: Vec::new(),
            cursor: 0,
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Vec<RawDetection>> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read landmark feed {}", path.display()))?;

        let batches = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| parse_feed_line(line, i + 1))
            .collect::<crate::error::Result<Vec<_>>>()?;

        if batches.is_empty() {
            anyhow::bail!("Landmark feed {} has no detections", path.display());
        }
        Ok(batches)
    }
}

impl LandmarkSource for ReplaySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn probe(&mut self) -> Result<()> {
        self.batches = Self::load(&self.path)?;
        self.cursor = 0;
        info!("Loaded {} detection batches from {}", self.batches.len(), self.path.display());
        Ok(())
    }

    fn detect(&mut self, _frame: &DynamicImage) -> Result<RawDetection> {
        if self.batches.is_empty() {
            anyhow::bail!("Replay source used before a successful probe");
        }
        let batch = self.batches[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.batches.len();
        Ok(batch)
    }
}
