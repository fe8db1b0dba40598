// End-to-end: raw feed line -> normalized frame -> published snapshot -> effects
use face_fx::detection::{normalize, parse_feed_line, NormalizeOptions};
use face_fx::effects::{Effect, EffectDispatcher, EffectSettings};
use face_fx::features::{
    all_fingertip_positions, hands_open_status, is_hand_fist, is_left_eye_open, is_mouth_open,
    wrist_positions, FeatureThresholds,
};
use face_fx::fire::{FireBreath, FireConfig};
use face_fx::frame::{FrameSlot, FrameState, HandResult, Handedness};
use face_fx::geometry::Point;
use face_fx::landmarks::{FaceLandmark, HandLandmark, FACE_TOPOLOGY_SIZE, HAND_TOPOLOGY_SIZE};
use serde_json::json;

fn face_json(lip_gap: f32, left_lid_gap: f32) -> serde_json::Value {
    let mut points: Vec<[f32; 2]> = vec![[320.0, 240.0]; FACE_TOPOLOGY_SIZE];
    points[FaceLandmark::UpperLipInner.index()] = [320.0, 300.0];
    points[FaceLandmark::LowerLipInner.index()] = [320.0, 300.0 + lip_gap];
    points[FaceLandmark::LeftEyeUpper.index()] = [280.0, 200.0];
    points[FaceLandmark::LeftEyeLower.index()] = [280.0, 200.0 + left_lid_gap];
    points[FaceLandmark::RightEyeUpper.index()] = [360.0, 200.0];
    points[FaceLandmark::RightEyeLower.index()] = [360.0, 212.0];
    json!({ "faceLandmarks": [points] })
}

fn frame_from(value: serde_json::Value, batch: u64) -> FrameState {
    let raw = parse_feed_line(&value.to_string(), batch as usize).unwrap();
    normalize(&raw, &NormalizeOptions::new(640.0, 480.0), batch)
}

fn fire() -> FireBreath {
    FireBreath::new(FireConfig {
        seed: Some(42),
        ..FireConfig::default()
    })
}

#[test]
fn mouth_threshold_through_the_adapter() {
    let t = FeatureThresholds::default();
    assert!(is_mouth_open(&frame_from(face_json(20.0, 12.0), 1), &t));
    assert!(!is_mouth_open(&frame_from(face_json(10.0, 12.0), 2), &t));

    let short = json!({ "faces": [{ "keypoints": vec![[0.0, 0.0]; 10] }] });
    assert!(!is_mouth_open(&frame_from(short, 3), &t));
}

#[test]
fn eye_state_through_the_adapter() {
    let t = FeatureThresholds::default();
    assert!(is_left_eye_open(&frame_from(json!({ "faces": [] }), 1), &t));
    assert!(!is_left_eye_open(&frame_from(face_json(0.0, 5.0), 2), &t));
    assert!(is_left_eye_open(&frame_from(face_json(0.0, 12.0), 3), &t));
}

#[test]
fn fist_detection() {
    let t = FeatureThresholds::default();
    let wrist = Point::new(200.0, 200.0);

    let mut tight = vec![wrist; HAND_TOPOLOGY_SIZE];
    for tip in HandLandmark::FINGERTIPS {
        tight[tip.index()] = Point::new(230.0, 230.0);
    }
    assert!(is_hand_fist(&HandResult::new(tight, Handedness::Left), &t));

    let mut loose = vec![wrist; HAND_TOPOLOGY_SIZE];
    for (i, tip) in HandLandmark::FINGERTIPS.iter().enumerate() {
        let reach = if i < 2 { 50.0 } else { 150.0 };
        loose[tip.index()] = Point::new(200.0, 200.0 - reach);
    }
    assert!(!is_hand_fist(&HandResult::new(loose, Handedness::Left), &t));
}

#[test]
fn per_hand_accessors_keep_hand_order() {
    let frame = frame_from(
        json!({
            "hands": [
                { "landmarks": vec![[10.0, 20.0]; HAND_TOPOLOGY_SIZE], "handedness": "Left" },
                { "landmarks": [[30.0, 40.0], [31.0, 41.0]], "handedness": "Right" }
            ]
        }),
        1,
    );

    let wrists = wrist_positions(&frame);
    assert_eq!(wrists, vec![Some(Point::new(10.0, 20.0)), Some(Point::new(30.0, 40.0))]);

    let tips = all_fingertip_positions(&frame);
    assert_eq!(tips.len(), 2);
    assert!(tips[0].iter().all(Option::is_some));
    assert!(tips[1].iter().all(Option::is_none));

    assert_eq!(hands_open_status(&frame, &FeatureThresholds::default()).len(), 2);
}

#[test]
fn open_mouth_spawns_a_batch_of_fresh_particles() {
    let frame = frame_from(face_json(20.0, 12.0), 1);
    let mut fire = fire();
    fire.step(&frame, &FeatureThresholds::default(), 1);
    assert_eq!(fire.len(), 8);
    assert!(fire.particles().iter().all(|p| p.max_life == 255));
}

#[test]
fn particles_burn_out_after_85_updates() {
    let t = FeatureThresholds::default();
    let open = frame_from(face_json(20.0, 12.0), 1);
    let closed = frame_from(face_json(0.0, 12.0), 2);
    let mut fire = fire();

    fire.step(&open, &t, 1);
    for tick in 2..=84 {
        fire.step(&closed, &t, tick);
    }
    assert_eq!(fire.len(), 8);
    assert!(fire.particles().iter().all(|p| p.life == 3));

    fire.step(&closed, &t, 85);
    assert!(fire.is_empty());
}

#[test]
fn particle_count_is_capped_under_sustained_fire() {
    let t = FeatureThresholds::default();
    let open = frame_from(face_json(30.0, 12.0), 1);
    let mut fire = fire();
    let mut peak = 0;
    for tick in 0..400 {
        fire.step(&open, &t, tick);
        assert!(fire.len() <= 150);
        peak = peak.max(fire.len());
    }
    assert_eq!(peak, 150);
}

#[test]
fn published_snapshot_drives_the_dispatcher() {
    let slot = FrameSlot::new();
    let mut settings = EffectSettings::default();
    let mut dispatcher = EffectDispatcher::new(
        FireConfig {
            seed: Some(1),
            ..FireConfig::default()
        },
        &settings,
    );

    slot.publish(frame_from(face_json(25.0, 12.0), 7));
    let held = slot.snapshot();
    slot.publish(FrameState::default());

    // The snapshot taken earlier is unaffected by the newer publication.
    assert_eq!(held.batch, 7);
    assert_eq!(slot.snapshot().batch, 0);

    dispatcher.dispatch(&held, &settings);
    assert_eq!(dispatcher.fire().len(), 8);
    assert_eq!(dispatcher.reveal().index(), 1);

    dispatcher.set_effect(&mut settings, Effect::FireBreath, false);
    assert!(dispatcher.fire().is_empty());

    dispatcher.dispatch(&slot.snapshot(), &settings);
    assert_eq!(dispatcher.reveal().index(), 0);
    assert!(dispatcher.fire().is_empty());
}
