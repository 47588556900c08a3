//! Image loading for texture data
//!
//! [`ImageSource`] turns an image reference into RGBA pixels. The
//! [`TextureLoader`] runs a source either on worker threads or inline, but
//! in both cases results only become visible through [`TextureLoader::poll`],
//! which the engine calls at a fixed point of every tick. That keeps the
//! scene graph single-threaded while decoding stays off the frame.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use image::imageops::FilterType;

/// Errors raised while fetching or decoding an image
#[derive(Debug, thiserror::Error)]
pub enum ImageLoadError {
    /// The reference does not resolve to anything
    #[error("Image not found: {0}")]
    NotFound(String),

    /// Reading the file failed
    #[error("Failed to read image {url}: {source}")]
    Io {
        /// Image reference
        url: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// The bytes are not a supported image
    #[error("Failed to decode image {url}: {message}")]
    Decode {
        /// Image reference
        url: String,
        /// Decoder message
        message: String,
    },
}

/// Decoded RGBA8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Tightly packed RGBA pixels
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Decode an encoded image held in memory
    pub fn from_bytes(url: &str, bytes: &[u8]) -> Result<Self, ImageLoadError> {
        let img = image::load_from_memory(bytes).map_err(|e| ImageLoadError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        log::debug!("Decoded image {}x{} for {}", width, height, url);

        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Create a solid colour image (useful for tests and placeholders)
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width * height) as usize;
        Self {
            width,
            height,
            pixels: color.repeat(pixel_count),
        }
    }

    /// Downscale so that neither side exceeds `max_size`, keeping the
    /// aspect ratio. Images already within bounds are returned unchanged.
    pub fn fit_within(self, max_size: u32) -> Self {
        if max_size == 0 || (self.width <= max_size && self.height <= max_size) {
            return self;
        }

        let scale = max_size as f32 / self.width.max(self.height) as f32;
        let width = ((self.width as f32 * scale).round() as u32).max(1);
        let height = ((self.height as f32 * scale).round() as u32).max(1);

        let Some(buffer) = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone()) else {
            log::warn!("Pixel buffer does not match {}x{}; keeping original size", self.width, self.height);
            return self;
        };
        let resized = image::imageops::resize(&buffer, width, height, FilterType::Triangle);
        log::debug!("Downscaled image {}x{} -> {}x{}", self.width, self.height, width, height);

        Self {
            width,
            height,
            pixels: resized.into_raw(),
        }
    }
}

/// Capability that resolves an image reference to pixels
pub trait ImageSource: Send + Sync {
    /// Fetch and decode one image; may block
    fn fetch(&self, url: &str) -> Result<DecodedImage, ImageLoadError>;
}

/// Reads images from a directory; references are resolved relative to it
pub struct FileImageSource {
    root: PathBuf,
}

impl FileImageSource {
    /// Serve images found under `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, url: &str) -> PathBuf {
        self.root.join(Path::new(url.trim_start_matches('/')))
    }
}

impl ImageSource for FileImageSource {
    fn fetch(&self, url: &str) -> Result<DecodedImage, ImageLoadError> {
        let path = self.resolve(url);
        if !path.exists() {
            return Err(ImageLoadError::NotFound(url.to_string()));
        }
        let bytes = std::fs::read(&path).map_err(|source| ImageLoadError::Io {
            url: url.to_string(),
            source,
        })?;
        DecodedImage::from_bytes(url, &bytes)
    }
}

/// Serves pre-decoded images from memory; anything else is not found
#[derive(Default)]
pub struct MemoryImageSource {
    images: HashMap<String, DecodedImage>,
}

impl MemoryImageSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image under a reference
    pub fn with_image(mut self, url: impl Into<String>, image: DecodedImage) -> Self {
        self.images.insert(url.into(), image);
        self
    }
}

impl ImageSource for MemoryImageSource {
    fn fetch(&self, url: &str) -> Result<DecodedImage, ImageLoadError> {
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| ImageLoadError::NotFound(url.to_string()))
    }
}

/// Identifier of one load request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadRequestId(pub u64);

/// Outcome of one load request
#[derive(Debug)]
pub struct CompletedLoad {
    /// Request this answers
    pub request: LoadRequestId,
    /// Image reference
    pub url: String,
    /// Pixels or the failure
    pub result: Result<DecodedImage, ImageLoadError>,
}

/// Asynchronous front end over an [`ImageSource`]
pub struct TextureLoader {
    source: Arc<dyn ImageSource>,
    sender: Sender<CompletedLoad>,
    receiver: Receiver<CompletedLoad>,
    threaded: bool,
    next_request: u64,
    in_flight: usize,
}

impl TextureLoader {
    /// Create a loader. With `threaded` set each request is decoded on its
    /// own worker thread; otherwise it is decoded immediately but still only
    /// delivered on the next [`poll`](Self::poll).
    pub fn new(source: Arc<dyn ImageSource>, threaded: bool) -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            source,
            sender,
            receiver,
            threaded,
            next_request: 0,
            in_flight: 0,
        }
    }

    /// Start loading `url`
    pub fn request(&mut self, url: &str) -> LoadRequestId {
        let request = LoadRequestId(self.next_request);
        self.next_request += 1;
        self.in_flight += 1;

        let source = Arc::clone(&self.source);
        let sender = self.sender.clone();
        let url = url.to_string();
        let job = move || {
            let result = source.fetch(&url);
            // Fails only once the loader has been dropped.
            let _ = sender.send(CompletedLoad { request, url, result });
        };

        if self.threaded {
            std::thread::spawn(job);
        } else {
            job();
        }

        log::trace!("Queued image load {:?}", request);
        request
    }

    /// Take every result that has arrived since the last poll
    pub fn poll(&mut self) -> Vec<CompletedLoad> {
        let completed: Vec<CompletedLoad> = self.receiver.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(completed.len());
        completed
    }

    /// Requests not yet handed out by [`poll`](Self::poll)
    pub const fn in_flight(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_image() {
        let img = DecodedImage::solid_color(4, 4, [255, 0, 0, 255]);
        assert_eq!(img.pixels.len(), 4 * 4 * 4);
        assert_eq!(&img.pixels[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_fit_within_keeps_aspect() {
        let img = DecodedImage::solid_color(64, 32, [0, 0, 0, 255]).fit_within(16);
        assert_eq!((img.width, img.height), (16, 8));
        assert_eq!(img.pixels.len(), 16 * 8 * 4);
    }

    #[test]
    fn test_inline_loader_delivers_on_poll() {
        let source = MemoryImageSource::new().with_image("a.png", DecodedImage::solid_color(2, 2, [1, 2, 3, 4]));
        let mut loader = TextureLoader::new(Arc::new(source), false);
        let ok = loader.request("a.png");
        let missing = loader.request("b.png");
        assert_eq!(loader.in_flight(), 2);

        let done = loader.poll();
        assert_eq!(done.len(), 2);
        assert!(done.iter().any(|c| c.request == ok && c.result.is_ok()));
        assert!(done
            .iter()
            .any(|c| c.request == missing && matches!(c.result, Err(ImageLoadError::NotFound(_)))));
        assert_eq!(loader.in_flight(), 0);
    }

    #[test]
    fn test_threaded_loader_eventually_delivers() {
        let source = MemoryImageSource::new().with_image("a.png", DecodedImage::solid_color(1, 1, [0; 4]));
        let mut loader = TextureLoader::new(Arc::new(source), true);
        loader.request("a.png");

        let mut delivered = Vec::new();
        for _ in 0..200 {
            delivered.extend(loader.poll());
            if !delivered.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(delivered.len(), 1);
    }

    #[test]
    fn test_file_source_reports_missing_file() {
        let source = FileImageSource::new(std::env::temp_dir().join("exhibit-engine-missing"));
        assert!(matches!(source.fetch("/images/none.png"), Err(ImageLoadError::NotFound(_))));
    }
}
