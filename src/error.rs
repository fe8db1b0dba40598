// src/error.rs - Error types for the outer layers (config, feeds, camera)
//
// The feature engine and the particle simulation never fail; everything here is
// raised by the code that surrounds them.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A named landmark points outside the topology it belongs to
    #[error("landmark {name} uses index {index}, but the {topology} topology has {size} points")]
    Topology {
        topology: &'static str,
        name: &'static str,
        index: usize,
        size: usize,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    /// A line of a landmark feed could not be normalized
    #[error("Landmark feed error at line {line}: {reason}")]
    Feed { line: usize, reason: String },

    #[error("Camera error: {0}")]
    Camera(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
