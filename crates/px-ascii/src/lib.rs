pub mod color_map;
pub mod converter;
pub mod dither;
/// ASCII conversion engine for pixscii.
///
/// Converts pixel frames to character grids.
pub mod luminance;

pub use converter::{AsciiArt, Converter};
pub use luminance::LuminanceProcessor;
