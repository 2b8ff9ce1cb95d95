/// Visual source modules for pixscii (still image, animated GIF, video).

pub mod gif;
pub mod image;
pub mod media;
pub mod resize;

#[cfg(feature = "video")]
pub mod video;
