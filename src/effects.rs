// src/effects.rs - Effect settings and the per-frame effect dispatcher
use std::collections::BTreeSet;

use egui::{Align2, Color32, Vec2};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::{
    fingertip_positions, is_hand_fist, mouth_base, DataOption, FeatureReadout, FeatureThresholds,
};
use crate::fire::{FireBreath, FireConfig};
use crate::frame::{FaceResult, FrameState};
use crate::geometry::{distance, Point};
use crate::landmarks::{FaceLandmark, HandLandmark, FACE_TOPOLOGY_SIZE};
use crate::overlay::{to_pos, DrawList};

const MESH_COLOR: Color32 = Color32::from_rgba_premultiplied(0, 160, 106, 160);
const BONE_COLOR: Color32 = Color32::from_rgb(70, 130, 240);
const TIP_COLOR: Color32 = Color32::from_rgb(255, 152, 0);
const FIST_COLOR: Color32 = Color32::from_rgb(244, 67, 54);
const OPEN_COLOR: Color32 = Color32::from_rgb(76, 175, 80);
const EAR_COLOR: Color32 = Color32::from_rgb(60, 60, 60);
const INNER_EAR_COLOR: Color32 = Color32::from_rgb(255, 160, 190);
const NOSE_COLOR: Color32 = Color32::from_rgb(230, 30, 40);

/// Fallback face height when the forehead or chin is missing.
const DEFAULT_FACE_SCALE: f32 = 200.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Effect {
    FaceMesh,
    HandSkeleton,
    CatEars,
    ClownNose,
    WinkText,
    MouthText,
    FireBreath,
    FingertipDots,
    HandState,
    DataReadout,
}

impl Effect {
    /// Also the draw order.
    pub const ALL: [Effect; 10] = [
        Effect::FaceMesh,
        Effect::HandSkeleton,
        Effect::CatEars,
        Effect::ClownNose,
        Effect::WinkText,
        Effect::MouthText,
        Effect::FireBreath,
        Effect::FingertipDots,
        Effect::HandState,
        Effect::DataReadout,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Effect::FaceMesh => "Face mesh",
            Effect::HandSkeleton => "Hand skeleton",
            Effect::CatEars => "Cat ears",
            Effect::ClownNose => "Clown nose",
            Effect::WinkText => "Wink text",
            Effect::MouthText => "Mouth text",
            Effect::FireBreath => "Fire breath",
            Effect::FingertipDots => "Fingertip dots",
            Effect::HandState => "Fist / open",
            Effect::DataReadout => "Data readout",
        }
    }
}

/// Everything the dispatcher reads in a frame. Changed only through the setters
/// between frames and handed to the dispatcher by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    enabled: BTreeSet<Effect>,
    data_options: BTreeSet<DataOption>,
    quote: String,
    /// Frames the mouth must stay open per revealed word
    reveal_frames_per_word: u32,
    thresholds: FeatureThresholds,
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            enabled: [
                Effect::HandSkeleton,
                Effect::WinkText,
                Effect::MouthText,
                Effect::FireBreath,
                Effect::DataReadout,
            ]
            .into_iter()
            .collect(),
            data_options: [DataOption::Mouth, DataOption::Eyes].into_iter().collect(),
            quote: "To be, or not to be, that is the question".to_string(),
            reveal_frames_per_word: 8,
            thresholds: FeatureThresholds::default(),
        }
    }
}

impl EffectSettings {
    pub fn is_enabled(&self, effect: Effect) -> bool {
        self.enabled.contains(&effect)
    }

    /// Returns whether the value changed.
    pub fn set_enabled(&mut self, effect: Effect, enabled: bool) -> bool {
        if enabled {
            self.enabled.insert(effect)
        } else {
            self.enabled.remove(&effect)
        }
    }

    pub fn data_option(&self, option: DataOption) -> bool {
        self.data_options.contains(&option)
    }

    pub fn set_data_option(&mut self, option: DataOption, enabled: bool) -> bool {
        if enabled {
            self.data_options.insert(option)
        } else {
            self.data_options.remove(&option)
        }
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Takes effect the next time the mouth text effect is enabled.
    pub fn set_quote(&mut self, quote: impl Into<String>) {
        self.quote = quote.into();
    }

    pub fn reveal_frames_per_word(&self) -> u32 {
        self.reveal_frames_per_word
    }

    pub fn set_reveal_frames_per_word(&mut self, frames: u32) {
        self.reveal_frames_per_word = frames.max(1);
    }

    pub fn thresholds(&self) -> &FeatureThresholds {
        &self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: FeatureThresholds) {
        self.thresholds = thresholds;
    }
}

/// Reveals the quote one word at a time while the mouth stays open.
#[derive(Debug, Clone, Default)]
pub struct MouthTextReveal {
    words: Vec<String>,
    index: usize,
    frames_open: u32,
    was_open: bool,
}

impl MouthTextReveal {
    pub fn new(quote: &str) -> Self {
        let mut reveal = Self::default();
        reveal.retokenize(quote);
        reveal
    }

    pub fn retokenize(&mut self, quote: &str) {
        self.words = quote.split_whitespace().map(str::to_string).collect();
        self.index = 0;
        self.frames_open = 0;
        self.was_open = false;
    }

    /// Feeds this frame's mouth state. Returns true on the frame the index was reset,
    /// which is exactly the frame the mouth went from open to closed.
    pub fn observe(&mut self, mouth_open: bool, frames_per_word: u32) -> bool {
        let mut reset = false;

        if mouth_open {
            if self.frames_open % frames_per_word.max(1) == 0 {
                self.index = (self.index + 1).min(self.words.len());
            }
            self.frames_open = self.frames_open.saturating_add(1);
        } else if self.was_open {
            self.index = 0;
            self.frames_open = 0;
            reset = true;
        }

        self.was_open = mouth_open;
        reset
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn revealed(&self) -> String {
        self.words[..self.index].join(" ")
    }
}

fn unit_or(v: Vector2<f32>, fallback: Vector2<f32>) -> Vector2<f32> {
    let norm = v.norm();
    if norm > f32::EPSILON {
        v / norm
    } else {
        fallback
    }
}

fn pos(v: Vector2<f32>) -> egui::Pos2 {
    egui::pos2(v.x, v.y)
}

fn face_scale(face: &FaceResult) -> f32 {
    let scale = distance(face.point(FaceLandmark::Forehead), face.point(FaceLandmark::Chin));
    if scale > 1.0 {
        scale
    } else {
        DEFAULT_FACE_SCALE
    }
}

pub struct EffectDispatcher {
    fire: FireBreath,
    reveal: MouthTextReveal,
    frame_count: u64,
}

impl EffectDispatcher {
    pub fn new(fire: FireConfig, settings: &EffectSettings) -> Self {
        Self {
            fire: FireBreath::new(fire),
            reveal: MouthTextReveal::new(settings.quote()),
            frame_count: 0,
        }
    }

    pub fn fire(&self) -> &FireBreath {
        &self.fire
    }

    pub fn reveal(&self) -> &MouthTextReveal {
        &self.reveal
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Toggles an effect. Disabling fire breath drops its particles right away;
    /// enabling the mouth text re-reads the quote.
    pub fn set_effect(&mut self, settings: &mut EffectSettings, effect: Effect, enabled: bool) {
        if !settings.set_enabled(effect, enabled) {
            return;
        }
        debug!("{} {}", effect.label(), if enabled { "enabled" } else { "disabled" });

        match (effect, enabled) {
            (Effect::FireBreath, false) => self.fire.clear(),
            (Effect::MouthText, true) => self.reveal.retokenize(settings.quote()),
            _ => {}
        }
    }

    /// Runs every enabled effect against one frame snapshot.
    pub fn dispatch(&mut self, frame: &FrameState, settings: &EffectSettings) -> DrawList {
        self.frame_count += 1;
        let thresholds = settings.thresholds();
        let features = FeatureReadout::from_frame(frame, thresholds);
        let mut out = DrawList::new();

        for effect in Effect::ALL {
            if !settings.is_enabled(effect) {
                continue;
            }
            match effect {
                Effect::FaceMesh => draw_face_mesh(frame, &mut out),
                Effect::HandSkeleton => draw_hand_skeleton(frame, &mut out),
                Effect::CatEars => draw_cat_ears(frame, &mut out),
                Effect::ClownNose => draw_clown_nose(frame, &features, &mut out),
                Effect::WinkText => draw_wink(frame, &features, &mut out),
                Effect::MouthText => {
                    self.reveal
                        .observe(features.mouth_open, settings.reveal_frames_per_word());
                    draw_mouth_text(frame, &self.reveal, &mut out);
                }
                Effect::FireBreath => {
                    self.fire.step(frame, thresholds, self.frame_count);
                    self.fire.render(&mut out);
                }
                Effect::FingertipDots => draw_fingertips(frame, &mut out),
                Effect::HandState => draw_hand_state(frame, thresholds, &mut out),
                Effect::DataReadout => {
                    let lines = features.lines(|option| settings.data_option(option));
                    for (i, line) in lines.into_iter().enumerate() {
                        let at = egui::pos2(12.0, 12.0 + i as f32 * 20.0);
                        out.text(at, line, 16.0, Color32::WHITE, Align2::LEFT_TOP);
                    }
                }
            }
        }

        // Covers settings that were edited without going through set_effect.
        if !settings.is_enabled(Effect::FireBreath) && !self.fire.is_empty() {
            self.fire.clear();
        }

        out
    }
}

fn draw_face_mesh(frame: &FrameState, out: &mut DrawList) {
    if let Some(face) = frame.face() {
        for point in &face.landmarks {
            out.point(to_pos(point), 1.0, MESH_COLOR);
        }
    }
}

fn draw_hand_skeleton(frame: &FrameState, out: &mut DrawList) {
    for hand in &frame.hands {
        for (a, b) in HandLandmark::BONES {
            if let (Some(from), Some(to)) = (hand.point(a), hand.point(b)) {
                out.line(to_pos(from), to_pos(to), 2.0, BONE_COLOR);
            }
        }
        for joint in &hand.landmarks {
            out.point(to_pos(joint), 3.0, Color32::WHITE);
        }
    }
}

fn draw_cat_ears(frame: &FrameState, out: &mut DrawList) {
    let Some(face) = frame.face().filter(|f| f.len() >= FACE_TOPOLOGY_SIZE) else {
        return;
    };
    let (Some(forehead), Some(chin)) = (
        face.point(FaceLandmark::Forehead),
        face.point(FaceLandmark::Chin),
    ) else {
        return;
    };

    let scale = face_scale(face);
    let up = unit_or(forehead.xy() - chin.xy(), Vector2::new(0.0, -1.0));

    for (anchor, fallback_side) in [
        (FaceLandmark::LeftForehead, Vector2::new(-1.0, 0.0)),
        (FaceLandmark::RightForehead, Vector2::new(1.0, 0.0)),
    ] {
        let Some(base) = face.point(anchor) else {
            continue;
        };
        let across = unit_or(base.xy() - forehead.xy(), fallback_side);
        let center = base.xy() + up * 0.05 * scale;

        out.triangle(
            [
                pos(center + across * 0.12 * scale),
                pos(center - across * 0.12 * scale),
                pos(center + up * 0.35 * scale + across * 0.05 * scale),
            ],
            EAR_COLOR,
        );
        out.triangle(
            [
                pos(center + across * 0.06 * scale + up * 0.03 * scale),
                pos(center - across * 0.06 * scale + up * 0.03 * scale),
                pos(center + up * 0.25 * scale + across * 0.04 * scale),
            ],
            INNER_EAR_COLOR,
        );
    }
}

fn draw_clown_nose(frame: &FrameState, features: &FeatureReadout, out: &mut DrawList) {
    let Some(nose) = features.nose else {
        return;
    };
    let radius = frame.face().map_or(DEFAULT_FACE_SCALE, face_scale) * 0.07;
    out.ellipse(to_pos(&nose), Vec2::splat(radius), NOSE_COLOR);
}

fn draw_wink(frame: &FrameState, features: &FeatureReadout, out: &mut DrawList) {
    if features.left_eye_open == features.right_eye_open {
        return;
    }
    let Some(face) = frame.face() else {
        return;
    };

    let (eye, offset, anchor) = if !features.left_eye_open {
        (FaceLandmark::LeftEyeUpper, Vec2::new(-40.0, -20.0), Align2::RIGHT_BOTTOM)
    } else {
        (FaceLandmark::RightEyeUpper, Vec2::new(40.0, -20.0), Align2::LEFT_BOTTOM)
    };

    if let Some(point) = face.point(eye) {
        out.text(to_pos(point) + offset, "wink ;)", 28.0, Color32::YELLOW, anchor);
    }
}

fn draw_mouth_text(frame: &FrameState, reveal: &MouthTextReveal, out: &mut DrawList) {
    if reveal.index() == 0 {
        return;
    }
    let Some(anchor) = mouth_base(frame) else {
        return;
    };
    let drop = frame.face().map_or(DEFAULT_FACE_SCALE, face_scale) * 0.25;
    out.text(
        to_pos(&anchor) + Vec2::new(0.0, drop),
        reveal.revealed(),
        22.0,
        Color32::WHITE,
        Align2::CENTER_TOP,
    );
}

fn draw_fingertips(frame: &FrameState, out: &mut DrawList) {
    for hand in &frame.hands {
        for tip in fingertip_positions(hand).iter().flatten() {
            out.point(to_pos(tip), 6.0, TIP_COLOR);
        }
    }
}

fn draw_hand_state(frame: &FrameState, thresholds: &FeatureThresholds, out: &mut DrawList) {
    for hand in &frame.hands {
        let Some(wrist) = hand.point(HandLandmark::Wrist) else {
            continue;
        };
        let (label, color) = if is_hand_fist(hand, thresholds) {
            ("FIST", FIST_COLOR)
        } else {
            ("OPEN", OPEN_COLOR)
        };
        let below: Point = Point::new(wrist.x, wrist.y + 30.0);
        out.text(to_pos(&below), label, 20.0, color, Align2::CENTER_TOP);
    }
}
