use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use face_fx::detection::adapter::{RawPoint, RawResult};
use face_fx::detection::{
    DetectionWorker, DetectorConfig, DetectorStatus, LandmarkSource, RawDetection,
};
use face_fx::frame::FrameSlot;
use image::DynamicImage;
use tokio::runtime::Handle;
use tokio::time::{sleep, timeout};

/// Fails its first `failing_probes` probes, then detects one fixed point.
struct FlakySource {
    failing_probes: u32,
    probe_delay: Duration,
    probes: Arc<AtomicU32>,
}

impl FlakySource {
    fn new(failing_probes: u32) -> (Self, Arc<AtomicU32>) {
        let probes = Arc::new(AtomicU32::new(0));
        let source = Self {
            failing_probes,
            probe_delay: Duration::ZERO,
            probes: Arc::clone(&probes),
        };
        (source, probes)
    }
}

impl LandmarkSource for FlakySource {
    fn name(&self) -> &str {
        "flaky"
    }

    fn probe(&mut self) -> anyhow::Result<()> {
        std::thread::sleep(self.probe_delay);
        let attempt = self.probes.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.failing_probes {
            anyhow::bail!("model not loaded yet");
        }
        Ok(())
    }

    fn detect(&mut self, frame: &DynamicImage) -> anyhow::Result<RawDetection> {
        let x = frame.width() as f32 / 2.0;
        Ok(RawDetection {
            faces: vec![RawResult::points(vec![RawPoint::xy(x, 10.0)])],
            ..RawDetection::default()
        })
    }
}

fn fast_config(probe_attempts: u32) -> DetectorConfig {
    DetectorConfig {
        poll_interval_ms: 5,
        probe_attempts,
        probe_timeout_ms: 1000,
        probe_backoff_ms: 1,
        ..DetectorConfig::default()
    }
}

#[tokio::test]
async fn becomes_ready_after_retries_and_publishes_batches() {
    let (source, probes) = FlakySource::new(2);
    let slot = FrameSlot::new();
    let worker = DetectionWorker::spawn(
        &Handle::current(),
        Box::new(source),
        fast_config(5),
        slot.clone(),
    );
    assert_eq!(worker.status(), DetectorStatus::Uninitialized);

    let mut status = worker.subscribe();
    timeout(Duration::from_secs(5), status.wait_for(DetectorStatus::is_ready))
        .await
        .expect("worker never became ready")
        .expect("status channel closed");
    assert_eq!(probes.load(Ordering::SeqCst), 3);
    assert!(worker.status().describe().starts_with("Ready: flaky"));

    worker.submit_frame(Arc::new(DynamicImage::new_rgba8(64, 48)));
    timeout(Duration::from_secs(5), async {
        while slot.snapshot().batch == 0 {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("no batch was published");

    let snapshot = slot.snapshot();
    assert_eq!(snapshot.faces.len(), 1);
    assert_eq!(snapshot.faces[0].landmarks[0].x, 32.0);
}

#[tokio::test]
async fn gives_up_after_bounded_attempts() {
    let (source, probes) = FlakySource::new(u32::MAX);
    let worker = DetectionWorker::spawn(
        &Handle::current(),
        Box::new(source),
        fast_config(3),
        FrameSlot::new(),
    );

    let mut status = worker.subscribe();
    timeout(Duration::from_secs(5), status.wait_for(DetectorStatus::is_failed))
        .await
        .expect("worker never failed")
        .expect("status channel closed");

    assert_eq!(probes.load(Ordering::SeqCst), 3);
    match worker.status() {
        DetectorStatus::Failed { reason } => assert!(reason.contains("model not loaded yet")),
        other => panic!("unexpected status {other:?}"),
    }
}

#[tokio::test]
async fn slow_probe_times_out() {
    let (mut source, _probes) = FlakySource::new(0);
    source.probe_delay = Duration::from_millis(200);
    let config = DetectorConfig {
        probe_timeout_ms: 10,
        ..fast_config(1)
    };
    let worker = DetectionWorker::spawn(&Handle::current(), Box::new(source), config, FrameSlot::new());

    let mut status = worker.subscribe();
    timeout(Duration::from_secs(5), status.wait_for(DetectorStatus::is_failed))
        .await
        .expect("worker never failed")
        .expect("status channel closed");

    assert!(worker.status().describe().contains("timed out"));
}

#[tokio::test]
async fn nothing_is_published_without_frames() {
    let (source, _probes) = FlakySource::new(0);
    let slot = FrameSlot::new();
    let worker = DetectionWorker::spawn(&Handle::current(), Box::new(source), fast_config(1), slot.clone());

    let mut status = worker.subscribe();
    timeout(Duration::from_secs(5), status.wait_for(DetectorStatus::is_ready))
        .await
        .expect("worker never became ready")
        .expect("status channel closed");

    sleep(Duration::from_millis(50)).await;
    assert_eq!(slot.snapshot().batch, 0);
    assert!(slot.snapshot().faces.is_empty());
}
