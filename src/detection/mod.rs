// src/detection/mod.rs - Landmark detection: sources, normalization and the polling worker
pub mod adapter;
pub mod source;
pub mod worker;

pub use adapter::{normalize, parse_feed_line, NormalizeOptions, RawDetection};
pub use source::{LandmarkSource, ReplaySource, SimulatedSource};
pub use worker::{DetectionWorker, DetectorConfig, DetectorStatus, SourceKind};
