/// Configuration, types, and shared structures for pixscii.
///
/// This crate contains the shared types, traits, and configuration logic
/// used across the pixscii workspace.

pub mod charset;
pub mod color;
pub mod config;
pub mod error;
pub mod frame;
pub mod traits;

pub use charset::LuminanceLut;
pub use config::ConvertConfig;
pub use error::CoreError;
pub use frame::{AsciiCell, AsciiFrame, AsciiGrid, FrameBuffer};
pub use traits::{Processor, Source, SourceFrame};
