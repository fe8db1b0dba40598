// src/fire.rs - Fire breath particle simulation
use egui::Vec2;
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::features::{is_mouth_open, mouth_base, FeatureThresholds};
use crate::frame::FrameState;
use crate::geometry::Point;
use crate::overlay::{hsb_color, DrawList};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireConfig {
    pub spawn_per_frame: usize,
    pub max_particles: usize,
    /// Half-width of the spawn jitter box around the mouth anchor
    pub jitter: [f32; 2],
    pub velocity_x: [f32; 2],
    pub velocity_y: [f32; 2],
    /// Downward acceleration per tick
    pub gravity: f32,
    pub life: i32,
    pub life_step: i32,
    pub size: [f32; 2],
    pub hue: [f32; 2],
    pub saturation: [f32; 2],
    pub brightness: [f32; 2],
    pub hue_drift: f32,
    /// Hue wraps back to 0 once it climbs past this
    pub hue_wrap: f32,
    pub flicker_speed: [f32; 2],
    /// Amplitude of the sinusoidal wobble added on top of the velocity
    pub drift: [f32; 2],
    pub seed: Option<u64>,
}

impl Default for FireConfig {
    fn default() -> Self {
        Self {
            spawn_per_frame: 8,
            max_particles: 150,
            jitter: [15.0, 10.0],
            velocity_x: [-1.5, 1.5],
            velocity_y: [-5.0, -2.5],
            gravity: 0.05,
            life: 255,
            life_step: 3,
            size: [8.0, 20.0],
            hue: [0.0, 30.0],
            saturation: [80.0, 100.0],
            brightness: [90.0, 100.0],
            hue_drift: 0.5,
            hue_wrap: 60.0,
            flicker_speed: [0.1, 0.3],
            drift: [0.5, 0.3],
            seed: None,
        }
    }
}

fn sample(rng: &mut StdRng, range: [f32; 2]) -> f32 {
    let [lo, hi] = range;
    if hi > lo && (hi - lo).is_finite() {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FireParticle {
    pub position: Vector2<f32>,
    pub velocity: Vector2<f32>,
    pub life: i32,
    pub max_life: i32,
    pub size: f32,
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
    pub alpha: f32,
    pub flicker_phase: f32,
    pub flicker_speed: f32,
}

impl FireParticle {
    fn spawn(anchor: Point, config: &FireConfig, rng: &mut StdRng) -> Self {
        let [jx, jy] = config.jitter;
        let position = Vector2::new(
            anchor.x + sample(rng, [-jx, jx]),
            anchor.y + sample(rng, [-jy, jy]),
        );

        Self {
            position,
            velocity: Vector2::new(sample(rng, config.velocity_x), sample(rng, config.velocity_y)),
            life: config.life,
            max_life: config.life,
            size: sample(rng, config.size),
            hue: sample(rng, config.hue),
            saturation: sample(rng, config.saturation),
            brightness: sample(rng, config.brightness),
            alpha: 255.0,
            flicker_phase: sample(rng, [0.0, std::f32::consts::TAU]),
            flicker_speed: sample(rng, config.flicker_speed),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0
    }

    pub fn update(&mut self, frame_count: u64, config: &FireConfig) {
        self.position += self.velocity;

        // Wobble depends on time and on where the particle is, so neighbours drift apart.
        let t = frame_count as f32 * 0.1;
        self.position.x += (t + self.position.y * 0.01).sin() * config.drift[0];
        self.position.y += (t + self.position.x * 0.01).cos() * config.drift[1];

        self.velocity.y += config.gravity;

        self.life -= config.life_step;
        self.alpha = if self.max_life > 0 {
            (255.0 * self.life as f32 / self.max_life as f32).max(0.0)
        } else {
            0.0
        };

        self.flicker_phase += self.flicker_speed;

        self.hue += config.hue_drift;
        if self.hue > config.hue_wrap {
            self.hue = 0.0;
        }
    }

    pub fn flicker(&self) -> f32 {
        0.8 + 0.2 * self.flicker_phase.sin()
    }

    /// Outer glow, mid glow, then the core on top.
    pub fn render(&self, out: &mut DrawList) {
        if !self.is_alive() || self.alpha <= 0.0 {
            return;
        }

        let center = egui::pos2(self.position.x, self.position.y);
        let flicker = self.flicker();
        let layers = [
            (1.8, 0.15, self.hue, self.saturation, self.brightness),
            (1.2, 0.35, self.hue + 10.0, self.saturation * 0.9, self.brightness),
            (0.6, 0.8, self.hue + 20.0, self.saturation * 0.5, 100.0),
        ];

        for (scale, opacity, hue, saturation, brightness) in layers {
            let radius = self.size * scale * flicker * 0.5;
            let color = hsb_color(hue, saturation, brightness, self.alpha * opacity * flicker);
            out.ellipse(center, Vec2::new(radius, radius * 1.2), color);
        }
    }
}

pub struct FireBreath {
    config: FireConfig,
    particles: Vec<FireParticle>,
    rng: StdRng,
}

impl FireBreath {
    pub fn new(config: FireConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            particles: Vec::new(),
            rng,
        }
    }

    pub fn config(&self) -> &FireConfig {
        &self.config
    }

    pub fn particles(&self) -> &[FireParticle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Spawns up to `spawn_per_frame` particles without crossing `max_particles`.
    /// Returns how many were created.
    pub fn spawn(&mut self, anchor: Point) -> usize {
        let room = self.config.max_particles.saturating_sub(self.particles.len());
        let count = self.config.spawn_per_frame.min(room);
        for _ in 0..count {
            let particle = FireParticle::spawn(anchor, &self.config, &mut self.rng);
            self.particles.push(particle);
        }
        count
    }

    /// Advances every particle one tick and drops the ones that burned out.
    pub fn update(&mut self, frame_count: u64) {
        let config = &self.config;
        for particle in self.particles.iter_mut() {
            particle.update(frame_count, config);
        }
        self.particles.retain(FireParticle::is_alive);
    }

    /// One frame: spawn at the mouth while it is open, then update everything.
    pub fn step(&mut self, frame: &FrameState, thresholds: &FeatureThresholds, frame_count: u64) {
        if is_mouth_open(frame, thresholds) {
            if let Some(anchor) = mouth_base(frame) {
                self.spawn(anchor);
            }
        }
        self.update(frame_count);
    }

    pub fn clear(&mut self) {
        if !self.particles.is_empty() {
            debug!("Clearing {} fire particles", self.particles.len());
        }
        self.particles.clear();
    }

    pub fn render(&self, out: &mut DrawList) {
        for particle in &self.particles {
            particle.render(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> FireBreath {
        FireBreath::new(FireConfig {
            seed: Some(7),
            ..FireConfig::default()
        })
    }

    #[test]
    fn spawn_creates_full_life_particles_near_anchor() {
        let mut fire = seeded();
        let anchor = Point::new(320.0, 300.0);
        assert_eq!(fire.spawn(anchor), 8);
        assert_eq!(fire.len(), 8);
        for p in fire.particles() {
            assert_eq!(p.life, 255);
            assert_eq!(p.max_life, 255);
            assert!((p.position.x - anchor.x).abs() <= 15.0);
            assert!((p.position.y - anchor.y).abs() <= 10.0);
            assert!(p.velocity.y < 0.0);
            assert!(p.hue >= 0.0 && p.hue <= 30.0);
        }
    }

    #[test]
    fn update_adds_drift_and_advances_flicker() {
        let config = FireConfig::default();
        let mut p = FireParticle {
            position: Vector2::new(100.0, 200.0),
            velocity: Vector2::new(1.0, -3.0),
            life: 255,
            max_life: 255,
            size: 10.0,
            hue: 10.0,
            saturation: 90.0,
            brightness: 95.0,
            alpha: 255.0,
            flicker_phase: 1.0,
            flicker_speed: 0.2,
        };
        p.update(12, &config);

        let t = 12.0_f32 * 0.1;
        let x = 101.0 + (t + 197.0 * 0.01).sin() * 0.5;
        let y = 197.0 + (t + x * 0.01).cos() * 0.3;
        assert!((p.position.x - x).abs() < 1e-4);
        assert!((p.position.y - y).abs() < 1e-4);
        assert!((p.position.x - 101.0).abs() > 1e-3);
        assert!((p.velocity.y - (-2.95)).abs() < 1e-6);
        assert!((p.flicker_phase - 1.2).abs() < 1e-6);
        assert_eq!(p.life, 252);
    }

    #[test]
    fn sampling_an_unrepresentable_range_does_not_panic() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(sample(&mut rng, [-3e38, 3e38]), -3e38);
        assert_eq!(sample(&mut rng, [f32::NEG_INFINITY, 1.0]), f32::NEG_INFINITY);
    }

    #[test]
    fn spawn_stops_at_capacity() {
        let mut fire = FireBreath::new(FireConfig {
            max_particles: 20,
            seed: Some(1),
            ..FireConfig::default()
        });
        let anchor = Point::new(0.0, 0.0);
        assert_eq!(fire.spawn(anchor), 8);
        assert_eq!(fire.spawn(anchor), 8);
        assert_eq!(fire.spawn(anchor), 4);
        assert_eq!(fire.spawn(anchor), 0);
        assert_eq!(fire.len(), 20);
    }

    #[test]
    fn life_drops_by_step_and_particle_dies_after_85_updates() {
        let config = FireConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut particle = FireParticle::spawn(Point::new(100.0, 100.0), &config, &mut rng);

        for tick in 1..=85 {
            let before = particle.life;
            particle.update(tick, &config);
            assert_eq!(particle.life, before - 3);
        }
        assert!(!particle.is_alive());
        assert_eq!(particle.alpha, 0.0);
    }

    #[test]
    fn update_removes_dead_particles() {
        let mut fire = seeded();
        fire.spawn(Point::new(50.0, 50.0));
        for tick in 0..84 {
            fire.update(tick);
        }
        assert_eq!(fire.len(), 8);
        fire.update(84);
        assert!(fire.is_empty());
    }

    #[test]
    fn alpha_tracks_remaining_life() {
        let config = FireConfig::default();
        let mut rng = StdRng::seed_from_u64(11);
        let mut particle = FireParticle::spawn(Point::default(), &config, &mut rng);
        particle.update(0, &config);
        assert!((particle.alpha - 255.0 * 252.0 / 255.0).abs() < 1e-3);
    }

    #[test]
    fn hue_wraps_past_ceiling() {
        let config = FireConfig::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut particle = FireParticle::spawn(Point::default(), &config, &mut rng);
        particle.hue = 59.8;
        particle.update(0, &config);
        assert_eq!(particle.hue, 0.0);
    }

    #[test]
    fn gravity_pulls_velocity_down() {
        let config = FireConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut particle = FireParticle::spawn(Point::default(), &config, &mut rng);
        let vy = particle.velocity.y;
        particle.update(0, &config);
        assert!((particle.velocity.y - (vy + config.gravity)).abs() < 1e-6);
    }

    #[test]
    fn clear_empties_regardless_of_life() {
        let mut fire = seeded();
        fire.spawn(Point::new(10.0, 10.0));
        fire.clear();
        assert!(fire.is_empty());
    }

    #[test]
    fn step_without_face_only_updates() {
        let mut fire = seeded();
        fire.spawn(Point::new(10.0, 10.0));
        fire.step(&FrameState::default(), &FeatureThresholds::default(), 1);
        assert_eq!(fire.len(), 8);
        assert!(fire.particles().iter().all(|p| p.life == 252));
    }

    #[test]
    fn live_particle_renders_three_layers() {
        let mut fire = seeded();
        fire.spawn(Point::new(10.0, 10.0));
        let mut list = DrawList::new();
        fire.render(&mut list);
        assert_eq!(list.len(), 8 * 3);
    }
}
