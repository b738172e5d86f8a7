// Screen capture pipeline - one still frame, encoded as base64 PNG
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Screen capture permission was denied")]
    PermissionDenied,

    #[error("Video stream timed out after {0:?}")]
    Timeout(Duration),

    #[error("Capture stream failed: {0}")]
    Stream(String),

    #[error("Failed to encode frame: {0}")]
    Encode(String),
}

/// A decoded video frame, tightly packed RGBA8
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

/// Host facility that can share a screen or window (after asking the user)
#[async_trait]
pub trait DisplaySource: Send + Sync {
    async fn request_stream(&self) -> Result<Box<dyn CaptureStream>, CaptureError>;
}

#[async_trait]
pub trait CaptureStream: Send {
    async fn next_frame(&mut self) -> Result<VideoFrame, CaptureError>;

    /// Stop every track of the stream. Must be idempotent.
    fn stop_tracks(&mut self);
}

/// Owns a live stream and stops its tracks when dropped, whatever the outcome
struct LiveStream(Box<dyn CaptureStream>);

impl Drop for LiveStream {
    fn drop(&mut self) {
        self.0.stop_tracks();
        tracing::debug!("Capture tracks stopped");
    }
}

#[derive(Clone)]
pub struct CapturePipeline {
    source: Arc<dyn DisplaySource>,
    frame_timeout: Duration,
}

impl CapturePipeline {
    pub fn new(source: Arc<dyn DisplaySource>) -> Self {
        Self::with_timeout(source, FIRST_FRAME_TIMEOUT)
    }

    pub fn with_timeout(source: Arc<dyn DisplaySource>, frame_timeout: Duration) -> Self {
        Self {
            source,
            frame_timeout,
        }
    }

    /// Capture one frame and return its PNG bytes as bare base64.
    /// Single attempt, no retry.
    pub async fn capture_base64_png(&self) -> Result<String, CaptureError> {
        let mut stream = LiveStream(self.source.request_stream().await?);

        let frame = tokio::time::timeout(self.frame_timeout, stream.0.next_frame())
            .await
            .map_err(|_| CaptureError::Timeout(self.frame_timeout))??;
        drop(stream);

        let raster = draw(frame)?;
        let png = encode_png(&raster)?;
        tracing::debug!(
            width = raster.width(),
            height = raster.height(),
            bytes = png.len(),
            "Captured frame"
        );
        Ok(STANDARD.encode(png))
    }
}

fn draw(frame: VideoFrame) -> Result<RgbaImage, CaptureError> {
    let (width, height) = (frame.width, frame.height);
    if width == 0 || height == 0 {
        return Err(CaptureError::Encode("frame has no pixels".to_string()));
    }
    RgbaImage::from_raw(width, height, frame.rgba).ok_or_else(|| {
        CaptureError::Encode(format!("pixel buffer does not match {}x{}", width, height))
    })
}

fn encode_png(raster: &RgbaImage) -> Result<Vec<u8>, CaptureError> {
    let mut bytes = Vec::new();
    raster
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| CaptureError::Encode(e.to_string()))?;
    Ok(bytes)
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    pub enum Behavior {
        Deny,
        Frame(u32, u32),
        Stall,
        Broken,
    }

    pub struct FakeDisplay {
        pub behavior: Behavior,
        pub stopped: Arc<AtomicBool>,
        pub requests: AtomicUsize,
    }

    impl FakeDisplay {
        pub fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                stopped: Arc::new(AtomicBool::new(false)),
                requests: AtomicUsize::new(0),
            }
        }
    }

    struct FakeStream {
        frame: Option<(u32, u32)>,
        broken: bool,
        stopped: Arc<AtomicBool>,
    }

    #[async_trait]
    impl CaptureStream for FakeStream {
        async fn next_frame(&mut self) -> Result<VideoFrame, CaptureError> {
            if self.broken {
                return Ok(VideoFrame {
                    width: 4,
                    height: 4,
                    rgba: vec![0; 3],
                });
            }
            match self.frame {
                Some((width, height)) => Ok(VideoFrame {
                    width,
                    height,
                    rgba: vec![200; (width * height * 4) as usize],
                }),
                None => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Err(CaptureError::Stream("never produced a frame".to_string()))
                }
            }
        }

        fn stop_tracks(&mut self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl DisplaySource for FakeDisplay {
        async fn request_stream(&self) -> Result<Box<dyn CaptureStream>, CaptureError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let (frame, broken) = match self.behavior {
                Behavior::Deny => return Err(CaptureError::PermissionDenied),
                Behavior::Frame(w, h) => (Some((w, h)), false),
                Behavior::Stall => (None, false),
                Behavior::Broken => (None, true),
            };
            Ok(Box::new(FakeStream {
                frame,
                broken,
                stopped: self.stopped.clone(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::{Behavior, FakeDisplay};
    use super::*;
    use std::sync::atomic::Ordering;

    #[tokio::test]
    async fn test_frame_is_encoded_as_bare_base64_png() {
        let display = Arc::new(FakeDisplay::new(Behavior::Frame(3, 2)));
        let pipeline = CapturePipeline::new(display.clone());

        let encoded = pipeline.capture_base64_png().await.unwrap();
        assert!(!encoded.starts_with("data:"));

        let png = STANDARD.decode(&encoded).unwrap();
        let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
        assert!(display.stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_permission_denied_is_distinct() {
        let pipeline = CapturePipeline::new(Arc::new(FakeDisplay::new(Behavior::Deny)));
        let err = pipeline.capture_base64_png().await.unwrap_err();
        assert!(matches!(err, CaptureError::PermissionDenied));
    }

    #[tokio::test]
    async fn test_stalled_stream_times_out_and_releases_tracks() {
        let display = Arc::new(FakeDisplay::new(Behavior::Stall));
        let pipeline = CapturePipeline::with_timeout(display.clone(), Duration::from_millis(20));

        let err = pipeline.capture_base64_png().await.unwrap_err();
        assert!(matches!(err, CaptureError::Timeout(_)));
        assert!(display.stopped.load(Ordering::SeqCst));
        assert_eq!(display.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bad_frame_fails_encoding_and_releases_tracks() {
        let display = Arc::new(FakeDisplay::new(Behavior::Broken));
        let pipeline = CapturePipeline::new(display.clone());

        let err = pipeline.capture_base64_png().await.unwrap_err();
        assert!(matches!(err, CaptureError::Encode(_)));
        assert!(display.stopped.load(Ordering::SeqCst));
    }
}
