//! Photo capture.
//!
//! A [`CaptureDevice`] opens a live [`FrameSource`]; [`CameraSession`] owns
//! that source for the lifetime of the capturing view and releases it when
//! dropped, whether or not a photo was taken.
//!
//! Two devices are provided:
//! - [`ScreenSource`]: a monitor, through the `screenshots` crate
//! - `WebcamSource`: a camera, through `nokhwa` (cargo feature `webcam`)
//!
//! # Example
//!
//! ```ignore
//! use prompt_genius_core::capture::{CameraSession, ScreenSource};
//!
//! let device = ScreenSource::new(0);
//! let session = CameraSession::open(&device)?;
//! let photo = session.snapshot()?; // the source is released here
//! ```

use crate::error::{AppError, Result};
use crate::image_processing::{EncodedImage, ImageProcessor};
use image::DynamicImage;
use screenshots::Screen;

/// A live stream of frames. Implementations release the underlying device in
/// [`FrameSource::release`]; it may be called more than once.
pub trait FrameSource {
    fn frame(&mut self) -> Result<DynamicImage>;
    fn release(&mut self);
}

pub trait CaptureDevice {
    /// Acquires the device.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Capture`] when access is denied or no device exists.
    fn open(&self) -> Result<Box<dyn FrameSource>>;

    fn name(&self) -> String;
}

/// Scoped ownership of an open [`FrameSource`].
pub struct CameraSession {
    source: Box<dyn FrameSource>,
    device: String,
}

impl CameraSession {
    pub fn open(device: &dyn CaptureDevice) -> Result<Self> {
        let source = device.open()?;
        tracing::debug!(device = %device.name(), "capture device opened");
        Ok(Self {
            source,
            device: device.name(),
        })
    }

    /// Grabs the current frame for the live preview.
    pub fn preview(&mut self) -> Result<DynamicImage> {
        self.source.frame()
    }

    /// Takes the photo, encodes it as JPEG and ends the session.
    pub fn snapshot(mut self) -> Result<EncodedImage> {
        let frame = self.source.frame()?;
        ImageProcessor::encode_jpeg(&frame)
    }

    pub fn device_name(&self) -> &str {
        &self.device
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.source.release();
        tracing::debug!(device = %self.device, "capture device released");
    }
}

/// Screen capturer that provides multi-monitor screenshot capabilities.
///
/// This struct wraps the `screenshots` crate.
pub struct ScreenCapturer {
    screens: Vec<Screen>,
}

impl ScreenCapturer {
    /// Initializes the screen capturer by detecting available screens.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Capture`] if:
    /// - Screen enumeration fails (e.g., no display server available)
    /// - No screens are detected
    pub fn new() -> Result<Self> {
        let screens = Screen::all()
            .map_err(|e| AppError::capture(format!("Failed to enumerate screens: {}", e)))?;

        if screens.is_empty() {
            return Err(AppError::capture("No screens detected"));
        }

        Ok(Self { screens })
    }

    /// Lists available screens with their dimensions and scale factor.
    pub fn list_screen(&self) -> Vec<String> {
        self.screens
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    "Monitor {}: {}x{} (scale: {})",
                    i, s.display_info.width, s.display_info.height, s.display_info.scale_factor
                )
            })
            .collect()
    }

    /// Captures a specific screen by its index.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [`AppError::ScreenNotFound`] if the index is out of bounds
    /// - [`AppError::Capture`] if the capture operation fails
    pub fn capture_screen_by_index(&self, index: usize) -> Result<DynamicImage> {
        let screen = self
            .screens
            .get(index)
            .ok_or(AppError::ScreenNotFound(index))?;

        let captured = screen
            .capture()
            .map_err(|e| AppError::capture(format!("Failed to capture screen: {}", e)))?;

        // Convert screenshots::Image to image::DynamicImage
        let width = captured.width();
        let height = captured.height();
        let rgba_data = captured.into_raw();

        let img_buffer = image::ImageBuffer::from_raw(width, height, rgba_data)
            .ok_or_else(|| AppError::capture("Failed to create image buffer"))?;

        Ok(DynamicImage::ImageRgba8(img_buffer))
    }

    /// Returns the number of available screens.
    pub fn screen_count(&self) -> usize {
        self.screens.len()
    }
}

/// A monitor used as the capture device.
pub struct ScreenSource {
    index: usize,
}

impl ScreenSource {
    pub fn new(index: usize) -> Self {
        Self { index }
    }
}

struct ScreenStream {
    capturer: Option<ScreenCapturer>,
    index: usize,
}

impl FrameSource for ScreenStream {
    fn frame(&mut self) -> Result<DynamicImage> {
        self.capturer
            .as_ref()
            .ok_or_else(|| AppError::capture("Capture source already released"))?
            .capture_screen_by_index(self.index)
    }

    fn release(&mut self) {
        self.capturer = None;
    }
}

impl CaptureDevice for ScreenSource {
    fn open(&self) -> Result<Box<dyn FrameSource>> {
        let capturer = ScreenCapturer::new()?;
        if self.index >= capturer.screen_count() {
            return Err(AppError::ScreenNotFound(self.index));
        }
        Ok(Box::new(ScreenStream {
            capturer: Some(capturer),
            index: self.index,
        }))
    }

    fn name(&self) -> String {
        format!("Monitor {}", self.index)
    }
}

#[cfg(feature = "webcam")]
pub use webcam::WebcamSource;

#[cfg(feature = "webcam")]
mod webcam {
    use super::{CaptureDevice, FrameSource};
    use crate::error::{AppError, Result};
    use image::{DynamicImage, ImageBuffer};
    use nokhwa::Camera;
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};

    /// A camera attached to the machine, by index.
    pub struct WebcamSource {
        index: u32,
    }

    impl WebcamSource {
        pub fn new(index: u32) -> Self {
            Self { index }
        }
    }

    struct WebcamStream {
        camera: Camera,
        open: bool,
    }

    impl FrameSource for WebcamStream {
        fn frame(&mut self) -> Result<DynamicImage> {
            if !self.open {
                return Err(AppError::capture("Camera already released"));
            }
            let buffer = self
                .camera
                .frame()
                .map_err(|e| AppError::capture(format!("Failed to read frame: {}", e)))?;
            let decoded = buffer
                .decode_image::<RgbFormat>()
                .map_err(|e| AppError::capture(format!("Failed to decode frame: {}", e)))?;

            let (width, height) = (decoded.width(), decoded.height());
            let rgb = ImageBuffer::from_raw(width, height, decoded.into_raw())
                .ok_or_else(|| AppError::capture("Failed to create image buffer"))?;
            Ok(DynamicImage::ImageRgb8(rgb))
        }

        fn release(&mut self) {
            if self.open {
                self.open = false;
                if let Err(e) = self.camera.stop_stream() {
                    tracing::warn!("failed to stop camera stream: {}", e);
                }
            }
        }
    }

    impl CaptureDevice for WebcamSource {
        fn open(&self) -> Result<Box<dyn FrameSource>> {
            let requested =
                RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
            let mut camera = Camera::new(CameraIndex::Index(self.index), requested)
                .map_err(|e| AppError::capture(format!("Camera unavailable: {}", e)))?;
            camera
                .open_stream()
                .map_err(|e| AppError::capture(format!("Camera access denied: {}", e)))?;
            Ok(Box::new(WebcamStream { camera, open: true }))
        }

        fn name(&self) -> String {
            format!("Camera {}", self.index)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeStream {
        released: Arc<AtomicUsize>,
    }

    impl FrameSource for FakeStream {
        fn frame(&mut self) -> Result<DynamicImage> {
            Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 6, Rgb([1, 2, 3]))))
        }

        fn release(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct FakeDevice {
        released: Arc<AtomicUsize>,
        denied: bool,
    }

    impl CaptureDevice for FakeDevice {
        fn open(&self) -> Result<Box<dyn FrameSource>> {
            if self.denied {
                return Err(AppError::capture("permission denied"));
            }
            Ok(Box::new(FakeStream {
                released: self.released.clone(),
            }))
        }

        fn name(&self) -> String {
            "fake".to_string()
        }
    }

    fn device(denied: bool) -> (FakeDevice, Arc<AtomicUsize>) {
        let released = Arc::new(AtomicUsize::new(0));
        (
            FakeDevice {
                released: released.clone(),
                denied,
            },
            released,
        )
    }

    #[test]
    fn snapshot_encodes_jpeg_and_releases() {
        let (device, released) = device(false);
        let mut session = CameraSession::open(&device).unwrap();
        assert_eq!(session.device_name(), "fake");
        assert_eq!(session.preview().unwrap().width(), 8);
        assert_eq!(released.load(Ordering::SeqCst), 0);

        let photo = session.snapshot().unwrap();
        assert_eq!(photo.mime_type, "image/jpeg");
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropping_without_capture_releases() {
        let (device, released) = device(false);
        {
            let _session = CameraSession::open(&device).unwrap();
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn denied_device_reports_capture_error() {
        let (device, released) = device(true);
        let err = CameraSession::open(&device).err().unwrap();
        assert_eq!(err.kind(), crate::error::ErrorKind::Capture);
        assert_eq!(released.load(Ordering::SeqCst), 0);
    }
}
