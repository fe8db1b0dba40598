// src/lib.rs - Webcam landmark effects: feature engine, fire breath and effect dispatch
pub mod config;
pub mod detection;
pub mod effects;
pub mod error;
pub mod features;
pub mod fire;
pub mod frame;
pub mod geometry;
pub mod landmarks;
pub mod overlay;
pub mod ui;
pub mod video;

pub use error::{Error, Result};
