//! Asset loading
//!
//! Images referenced by hall configurations are decoded off the tick and
//! handed back through a channel that the engine drains once per frame.

pub mod image_loader;

pub use image_loader::{
    CompletedLoad, DecodedImage, FileImageSource, ImageLoadError, ImageSource, LoadRequestId,
    MemoryImageSource, TextureLoader,
};
