/// Terminal output for pixscii.
///
/// ANSI encoding of grids, frame pacing, and interactive playback.
pub mod ansi;
pub mod pacing;
pub mod player;
