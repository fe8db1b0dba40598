// src/video.rs - Webcam capture into RGBA frames
use std::sync::{Arc, Mutex, PoisonError};

use image::{DynamicImage, ImageBuffer, Rgba, RgbaImage};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;
use tracing::{debug, info, warn};

use crate::config::CameraConfig;
use crate::error::{Error, Result};

/// Names of the cameras the platform reports, in index order.
pub fn list_cameras() -> Vec<String> {
    match nokhwa::query(ApiBackend::Auto) {
        Ok(cameras) => cameras.iter().map(|c| c.human_name()).collect(),
        Err(e) => {
            warn!("Failed to query cameras: {}", e);
            Vec::new()
        }
    }
}

/// Opaque black frame shown when no camera is available.
pub fn blank_frame(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])))
}

fn rgb_to_rgba(width: u32, height: u32, rgb: &[u8]) -> Option<RgbaImage> {
    let mut rgba = Vec::with_capacity((width * height * 4) as usize);
    for chunk in rgb.chunks_exact(3) {
        rgba.extend_from_slice(chunk);
        rgba.push(255);
    }
    ImageBuffer::from_raw(width, height, rgba)
}

pub struct VideoSource {
    camera: Arc<Mutex<Camera>>,
    mirror: bool,
}

impl VideoSource {
    pub fn new_camera(config: &CameraConfig) -> Result<Self> {
        debug!("Opening camera index {}", config.index);

        let format = CameraFormat::new(
            Resolution::new(config.width, config.height),
            FrameFormat::MJPEG,
            config.fps,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(format));

        let camera = Camera::new(CameraIndex::Index(config.index), requested)
            .map_err(|e| Error::Camera(format!("Failed to open camera {}: {}", config.index, e)))?;

        info!("Camera {} opened: {}", config.index, camera.info().human_name());
        Ok(Self {
            camera: Arc::new(Mutex::new(camera)),
            mirror: config.mirror,
        })
    }

    pub fn resolution(&self) -> (u32, u32) {
        let cam = self.camera.lock().unwrap_or_else(PoisonError::into_inner);
        let resolution = cam.resolution();
        (resolution.width(), resolution.height())
    }

    pub fn read_frame(&mut self) -> Result<DynamicImage> {
        let mut cam = self.camera.lock().unwrap_or_else(PoisonError::into_inner);

        if !cam.is_stream_open() {
            cam.open_stream()
                .map_err(|e| Error::Camera(format!("Failed to open camera stream: {}", e)))?;
        }

        let frame = cam
            .frame()
            .map_err(|e| Error::Camera(format!("Failed to capture frame: {}", e)))?;
        let decoded = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::Camera(format!("Failed to decode frame: {}", e)))?;

        let (width, height) = (decoded.width(), decoded.height());
        let img = rgb_to_rgba(width, height, decoded.as_raw())
            .ok_or_else(|| Error::Camera("Frame buffer has the wrong size".to_string()))?;

        let img = if self.mirror {
            image::imageops::flip_horizontal(&img)
        } else {
            img
        };
        Ok(DynamicImage::ImageRgba8(img))
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        if let Ok(mut cam) = self.camera.lock() {
            let _ = cam.stop_stream();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_frame_is_opaque_black() {
        let frame = blank_frame(8, 4).to_rgba8();
        assert_eq!(frame.dimensions(), (8, 4));
        assert!(frame.pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }

    #[test]
    fn rgb_expands_to_rgba() {
        let img = rgb_to_rgba(2, 1, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(img.as_raw(), &vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert!(rgb_to_rgba(2, 2, &[0; 6]).is_none());
    }
}
