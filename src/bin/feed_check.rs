// src/bin/feed_check.rs - Prints the feature readout for every batch in a landmark feed
use anyhow::{bail, Context, Result};
use face_fx::detection::{normalize, parse_feed_line, NormalizeOptions};
use face_fx::effects::{EffectDispatcher, EffectSettings};
use face_fx::features::FeatureReadout;
use face_fx::fire::FireConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        bail!("usage: feed_check <feed.jsonl> [width height]");
    };
    let width: f32 = args.next().map_or(Ok(640.0), |w| w.parse()).context("Bad width")?;
    let height: f32 = args.next().map_or(Ok(480.0), |h| h.parse()).context("Bad height")?;

    let text = std::fs::read_to_string(&path).with_context(|| format!("Failed to read {path}"))?;
    let options = NormalizeOptions::new(width, height);
    let settings = EffectSettings::default();
    let mut dispatcher = EffectDispatcher::new(
        FireConfig {
            seed: Some(0),
            ..FireConfig::default()
        },
        &settings,
    );

    let mut batches = 0u64;
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let raw = parse_feed_line(line, i + 1)?;
        batches += 1;
        let frame = normalize(&raw, &options, batches);

        let readout = FeatureReadout::from_frame(&frame, settings.thresholds());
        let overlay = dispatcher.dispatch(&frame, &settings);

        println!(
            "--- batch {} (line {}): {} face(s), {} hand(s), {} draw commands",
            batches,
            i + 1,
            frame.faces.len(),
            frame.hands.len(),
            overlay.len()
        );
        for line in readout.lines(|_| true) {
            println!("{line}");
        }
    }

    if batches == 0 {
        bail!("{path} has no detections");
    }
    println!("\n{} batches, {} fire particles alive at the end", batches, dispatcher.fire().len());
    Ok(())
}
