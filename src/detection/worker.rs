// src/detection/worker.rs - Background detection loop on the app's tokio runtime
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Local};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::adapter::{normalize, NormalizeOptions};
use super::source::{LandmarkSource, ReplaySource, SimulatedSource};
use crate::frame::FrameSlot;

#[derive(Debug, Clone, PartialEq)]
pub enum DetectorStatus {
    Uninitialized,
    Probing { attempt: u32, max_attempts: u32 },
    Ready { source: String, since: DateTime<Local> },
    Failed { reason: String },
}

impl DetectorStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, DetectorStatus::Ready { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DetectorStatus::Failed { .. })
    }

    pub fn describe(&self) -> String {
        match self {
            DetectorStatus::Uninitialized => "Detector not started".to_string(),
            DetectorStatus::Probing {
                attempt,
                max_attempts,
            } => format!("Loading models... ({attempt}/{max_attempts})"),
            DetectorStatus::Ready { source, since } => {
                format!("Ready: {source} since {}", since.format("%H:%M:%S"))
            }
            DetectorStatus::Failed { reason } => format!("Detector unavailable: {reason}"),
        }
    }
}

impl fmt::Display for DetectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKind {
    Simulated,
    Replay { path: PathBuf },
}

impl SourceKind {
    pub fn build(&self) -> Box<dyn LandmarkSource> {
        match self {
            SourceKind::Simulated => Box::new(SimulatedSource::new()),
            SourceKind::Replay { path } => Box::new(ReplaySource::new(path)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub poll_interval_ms: u64,
    pub probe_attempts: u32,
    pub probe_timeout_ms: u64,
    pub probe_backoff_ms: u64,
    /// Flip x on incoming landmarks
    pub mirror: bool,
    pub source: SourceKind,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            probe_attempts: 5,
            probe_timeout_ms: 3000,
            probe_backoff_ms: 500,
            mirror: false,
            source: SourceKind::Simulated,
        }
    }
}

type SharedSource = Arc<Mutex<Box<dyn LandmarkSource>>>;

fn lock(source: &SharedSource) -> MutexGuard<'_, Box<dyn LandmarkSource>> {
    source.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the detection task. Dropping the worker stops it.
pub struct DetectionWorker {
    frames: watch::Sender<Option<Arc<DynamicImage>>>,
    status: watch::Receiver<DetectorStatus>,
    task: JoinHandle<()>,
}

impl DetectionWorker {
    pub fn spawn(
        handle: &Handle,
        source: Box<dyn LandmarkSource>,
        config: DetectorConfig,
        slot: FrameSlot,
    ) -> Self {
        let (frames, frames_rx) = watch::channel(None);
        let (status_tx, status) = watch::channel(DetectorStatus::Uninitialized);
        let source: SharedSource = Arc::new(Mutex::new(source));

        let task = handle.spawn(run(source, config, slot, frames_rx, status_tx));

        Self {
            frames,
            status,
            task,
        }
    }

    /// Hands the newest camera frame to the worker. Older unprocessed frames are dropped.
    pub fn submit_frame(&self, frame: Arc<DynamicImage>) {
        self.frames.send_replace(Some(frame));
    }

    pub fn status(&self) -> DetectorStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DetectorStatus> {
        self.status.clone()
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn probe(
    source: &SharedSource,
    config: &DetectorConfig,
    status: &watch::Sender<DetectorStatus>,
) -> Result<(), String> {
    let max_attempts = config.probe_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        status.send_replace(DetectorStatus::Probing {
            attempt,
            max_attempts,
        });

        let shared = Arc::clone(source);
        let attempt_task = tokio::task::spawn_blocking(move || lock(&shared).probe());

        last_error = match timeout(Duration::from_millis(config.probe_timeout_ms), attempt_task).await {
            Ok(Ok(Ok(()))) => return Ok(()),
            Ok(Ok(Err(e))) => format!("{e:#}"),
            Ok(Err(e)) => format!("probe task failed: {e}"),
            Err(_) => format!("probe timed out after {} ms", config.probe_timeout_ms),
        };
        warn!("Detector probe {}/{} failed: {}", attempt, max_attempts, last_error);

        if attempt < max_attempts {
            sleep(Duration::from_millis(config.probe_backoff_ms)).await;
        }
    }

    Err(last_error)
}

async fn run(
    source: SharedSource,
    config: DetectorConfig,
    slot: FrameSlot,
    mut frames: watch::Receiver<Option<Arc<DynamicImage>>>,
    status: watch::Sender<DetectorStatus>,
) {
    let name = lock(&source).name().to_string();
    info!("Starting detection with {}", name);

    if let Err(reason) = probe(&source, &config, &status).await {
        warn!("Giving up on detector {}: {}", name, reason);
        status.send_replace(DetectorStatus::Failed { reason });
        return;
    }

    info!("Detector {} ready", name);
    status.send_replace(DetectorStatus::Ready {
        source: name,
        since: Local::now(),
    });

    let mut ticker = interval(Duration::from_millis(config.poll_interval_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut batch = 0u64;

    loop {
        ticker.tick().await;

        let Some(frame) = frames.borrow_and_update().clone() else {
            continue;
        };

        let mut options = NormalizeOptions::new(frame.width() as f32, frame.height() as f32);
        options.mirror = config.mirror;

        let shared = Arc::clone(&source);
        match tokio::task::spawn_blocking(move || lock(&shared).detect(&frame)).await {
            Ok(Ok(raw)) => {
                batch += 1;
                let state = normalize(&raw, &options, batch);
                debug!(
                    "Batch {}: {} face(s), {} hand(s)",
                    batch,
                    state.faces.len(),
                    state.hands.len()
                );
                slot.publish(state);
            }
            // Keep showing the last good batch.
            Ok(Err(e)) => warn!("Detection failed: {:#}", e),
            Err(e) => warn!("Detection task failed: {}", e),
        }
    }
}
