/// Export des grilles ASCII vers des fichiers.
///
/// Texte (une ou plusieurs frames), rendu bitmap des glyphes (PNG, GIF animé)
/// et, avec la feature `video`, encodage MP4 via ffmpeg.
pub mod font;
pub mod gif_out;
pub mod image_out;
#[cfg(feature = "video")]
pub mod muxer;
pub mod paths;
pub mod rasterizer;
pub mod text;

pub use rasterizer::{Rasterizer, RenderStyle};
