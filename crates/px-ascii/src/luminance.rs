use px_core::charset::LuminanceLut;
use px_core::config::{ConvertConfig, DitherMode};
use px_core::frame::{AsciiCell, AsciiGrid, FrameBuffer};
use px_core::traits::Processor;

use crate::color_map::map_color;

/// Process a frame into an ASCII grid using luminance mapping.
///
/// For each grid cell, samples the corresponding pixel's luminance,
/// applies invert, contrast/brightness and dithering, then maps it to a
/// character via the LUT. The cell keeps the color-mapped source pixel.
///
/// # Example
/// ```
/// use px_core::frame::{FrameBuffer, AsciiGrid};
/// use px_core::config::ConvertConfig;
/// use px_core::charset::LuminanceLut;
/// use px_ascii::luminance::process_luminance;
///
/// let frame = FrameBuffer::filled(10, 10, (255, 255, 255));
/// let mut grid = AsciiGrid::new(10, 10);
/// let lut = LuminanceLut::new("@. ").unwrap();
/// process_luminance(&frame, &ConvertConfig::default(), &lut, &mut grid);
/// assert_eq!(grid.get(3, 3).ch, ' ');
/// ```
pub fn process_luminance(
    frame: &FrameBuffer,
    config: &ConvertConfig,
    lut: &LuminanceLut,
    grid: &mut AsciiGrid,
) {
    for cy in 0..grid.height {
        for cx in 0..grid.width {
            // Grid coords → pixel coords (identité quand la frame est déjà à la taille de la grille)
            let px = u32::from(cx) * frame.width / u32::from(grid.width).max(1);
            let py = u32::from(cy) * frame.height / u32::from(grid.height).max(1);

            let px = px.min(frame.width.saturating_sub(1));
            let py = py.min(frame.height.saturating_sub(1));

            let mut lum = frame.luminance(px, py);
            if config.invert {
                lum = 255 - lum;
            }

            let mut final_lum = apply_contrast_brightness(lum, config.contrast, config.brightness);
            if config.dither_mode == DitherMode::Bayer8x8 {
                final_lum = crate::dither::apply_bayer_8x8(
                    final_lum,
                    u32::from(cx),
                    u32::from(cy),
                    lut.levels(),
                );
            }

            let (r, g, b, _) = frame.pixel(px, py);
            grid.set(
                cx,
                cy,
                AsciiCell {
                    ch: lut.map(final_lum),
                    fg: map_color(r, g, b, config.color_mode, config.saturation),
                },
            );
        }
    }
}

/// Apply contrast and brightness to a luminance value.
///
/// Contrast: multiply around 128. Brightness: offset.
/// Neutral settings (1.0, 0.0) return the input unchanged.
#[inline(always)]
#[must_use]
pub fn apply_contrast_brightness(lum: u8, contrast: f32, brightness: f32) -> u8 {
    if (contrast - 1.0).abs() < f32::EPSILON && brightness == 0.0 {
        return lum;
    }
    let val = f32::from(lum);
    let adjusted = (val - 128.0) * contrast + 128.0 + brightness * 255.0;
    adjusted.clamp(0.0, 255.0) as u8
}

/// `Processor` luminance → glyphe, LUT pré-calculée.
pub struct LuminanceProcessor {
    lut: LuminanceLut,
}

impl LuminanceProcessor {
    /// Wrap a prebuilt LUT.
    #[must_use]
    pub fn new(lut: LuminanceLut) -> Self {
        Self { lut }
    }
}

impl Processor for LuminanceProcessor {
    fn process(&self, input: &FrameBuffer, config: &ConvertConfig, output: &mut AsciiGrid) {
        process_luminance(input, config, &self.lut, output);
    }

    fn name(&self) -> &'static str {
        "luminance"
    }
}
