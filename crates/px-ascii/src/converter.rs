//! Conversion haut niveau : chemin ou frames → grilles ASCII.
//!
//! Le `Converter` valide le charset une fois, puis enchaîne
//! resize (Lanczos3, correction d'aspect) → luminance → glyphe.

use std::path::Path;

use anyhow::Result;
use px_core::charset::{LuminanceLut, resolve_preset};
use px_core::config::ConvertConfig;
use px_core::error::CoreError;
use px_core::frame::{AsciiFrame, AsciiGrid, FrameBuffer};
use px_core::traits::{Processor, Source, SourceFrame};
use px_source::gif::GifSource;
use px_source::image::load_image;
use px_source::resize::{Resizer, grid_size};
use rayon::prelude::*;

use crate::luminance::LuminanceProcessor;

/// Résultat de la conversion d'une image fixe.
#[derive(Clone, Debug)]
pub struct AsciiArt {
    /// Cellules converties.
    pub grid: AsciiGrid,
    /// Dimensions de l'image source en pixels.
    pub source_size: (u32, u32),
}

impl AsciiArt {
    /// Texte brut, lignes séparées par `\n`.
    #[must_use]
    pub fn text(&self) -> String {
        self.grid.to_text()
    }
}

/// Convertisseur image → ASCII.
///
/// # Example
/// ```
/// use px_ascii::Converter;
/// use px_core::config::ConvertConfig;
/// use px_core::frame::FrameBuffer;
///
/// let converter = Converter::new(ConvertConfig { width: 8, ..Default::default() }).unwrap();
/// let grid = converter.convert_frame(&FrameBuffer::filled(16, 16, (0, 0, 0))).unwrap();
/// assert_eq!((grid.width, grid.height), (8, 4));
/// assert_eq!(grid.get(0, 0).ch, '@');
/// ```
pub struct Converter {
    config: ConvertConfig,
    charset: String,
    processor: LuminanceProcessor,
}

impl Converter {
    /// Validate the charset and precompute the LUT.
    ///
    /// # Errors
    /// [`CoreError::UnknownCharset`] for an unknown preset name,
    /// [`CoreError::Config`] for an empty custom charset.
    pub fn new(config: ConvertConfig) -> Result<Self, CoreError> {
        let charset = match config.custom_charset.as_deref() {
            Some(custom) => custom.to_string(),
            None => resolve_preset(&config.charset)?.to_string(),
        };
        let lut = LuminanceLut::new(&charset)?;
        log::debug!(
            "Converter: width={} charset={} ({} niveaux)",
            config.width,
            config.charset_label(),
            lut.levels()
        );
        Ok(Self {
            config,
            charset,
            processor: LuminanceProcessor::new(lut),
        })
    }

    /// Configuration active.
    #[must_use]
    pub fn config(&self) -> &ConvertConfig {
        &self.config
    }

    /// Caractères effectivement utilisés (dense → clair).
    #[must_use]
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Grille (colonnes, lignes) pour une source de `size` pixels.
    ///
    /// # Errors
    /// [`CoreError::InvalidDimensions`] pour une source vide.
    pub fn grid_for(&self, size: (u32, u32)) -> Result<(u16, u16), CoreError> {
        grid_size(size.0, size.1, self.config.width, self.config.aspect_ratio)
    }

    /// Convertit une frame à la grille calculée depuis ses propres dimensions.
    ///
    /// # Errors
    /// Returns an error if the frame is empty or the resize fails.
    pub fn convert_frame(&self, frame: &FrameBuffer) -> Result<AsciiGrid> {
        let grid = self.grid_for((frame.width, frame.height))?;
        self.convert_frame_to(&mut Resizer::new(), frame, grid)
    }

    /// Convertit une frame vers une grille imposée (frames d'une même animation).
    ///
    /// # Errors
    /// Returns an error if the resize fails.
    pub fn convert_frame_to(
        &self,
        resizer: &mut Resizer,
        frame: &FrameBuffer,
        (cols, rows): (u16, u16),
    ) -> Result<AsciiGrid> {
        let resized = resizer.resize_to(frame, u32::from(cols), u32::from(rows))?;
        let mut grid = AsciiGrid::new(cols, rows);
        self.processor.process(&resized, &self.config, &mut grid);
        Ok(grid)
    }

    /// Load and convert a still image.
    ///
    /// # Errors
    /// Returns an error if the file is missing, undecodable or empty.
    pub fn convert_image(&self, path: &Path) -> Result<AsciiArt> {
        let frame = load_image(path)?;
        let grid = self.convert_frame(&frame)?;
        Ok(AsciiArt {
            grid,
            source_size: (frame.width, frame.height),
        })
    }

    /// Convert every frame of an animated GIF, in order.
    ///
    /// # Errors
    /// Returns an error if the GIF cannot be decoded.
    pub fn convert_gif(&self, path: &Path) -> Result<Vec<AsciiFrame>> {
        let gif = GifSource::new(path)?;
        let size = gif.native_size();
        self.convert_frames(gif.frames(), size)
    }

    /// Convertit des frames décodées en parallèle, ordre conservé.
    ///
    /// Toutes les frames partagent la grille calculée depuis `native_size`.
    ///
    /// # Errors
    /// Returns an error if any frame fails to convert.
    pub fn convert_frames(
        &self,
        frames: &[SourceFrame],
        native_size: (u32, u32),
    ) -> Result<Vec<AsciiFrame>> {
        let grid = self.grid_for(native_size)?;
        frames
            .par_iter()
            .enumerate()
            .map_init(Resizer::new, |resizer, (index, frame)| {
                Ok::<_, anyhow::Error>(AsciiFrame {
                    index,
                    grid: self.convert_frame_to(resizer, &frame.buffer, grid)?,
                    delay: frame.delay,
                })
            })
            .collect::<Result<Vec<_>>>()
    }

    /// Draine une source frame par frame, `on_frame` reçoit chaque résultat.
    ///
    /// Retourne le nombre de frames converties.
    ///
    /// # Errors
    /// Propage les erreurs de conversion et celles de `on_frame`.
    pub fn for_each_frame<F>(&self, source: &mut dyn Source, mut on_frame: F) -> Result<usize>
    where
        F: FnMut(AsciiFrame) -> Result<()>,
    {
        let grid = self.grid_for(source.native_size())?;
        let mut resizer = Resizer::new();
        let mut index = 0usize;
        while let Some(frame) = source.next_frame() {
            let converted = AsciiFrame {
                index,
                grid: self.convert_frame_to(&mut resizer, &frame.buffer, grid)?,
                delay: frame.delay,
            };
            on_frame(converted)?;
            index += 1;
        }
        Ok(index)
    }

    /// Draine une source entière en mémoire.
    ///
    /// # Errors
    /// Propage les erreurs de conversion.
    pub fn convert_source(&self, source: &mut dyn Source) -> Result<Vec<AsciiFrame>> {
        let mut frames = Vec::with_capacity(source.frame_count().unwrap_or(0));
        self.for_each_frame(source, |frame| {
            frames.push(frame);
            Ok(())
        })?;
        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgba, RgbaImage};
    use px_core::charset::CHARSET_BLOCKS;
    use px_core::config::DitherMode;
    use px_source::image::ImageSource;
    use std::sync::Arc;
    use std::time::Duration;

    fn converter(width: u32) -> Converter {
        Converter::new(ConvertConfig {
            width,
            ..ConvertConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn unknown_charset_is_rejected() {
        let err = Converter::new(ConvertConfig {
            charset: "fancy".into(),
            ..ConvertConfig::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, CoreError::UnknownCharset { .. }));
        assert!(err.to_string().contains("blocks-simple"));
    }

    #[test]
    fn custom_charset_wins_over_preset() {
        let conv = Converter::new(ConvertConfig {
            charset: "standard".into(),
            custom_charset: Some("XO".into()),
            ..ConvertConfig::default()
        })
        .unwrap();
        assert_eq!(conv.charset(), "XO");
        let grid = conv.convert_frame(&FrameBuffer::filled(4, 4, (0, 0, 0))).unwrap();
        assert!(grid.cells.iter().all(|c| c.ch == 'X'));
    }

    #[test]
    fn empty_custom_charset_is_a_config_error() {
        let err = Converter::new(ConvertConfig {
            custom_charset: Some(String::new()),
            ..ConvertConfig::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn white_image_text_is_all_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("white.png");
        RgbaImage::from_pixel(200, 100, Rgba([255, 255, 255, 255]))
            .save(&path)
            .unwrap();

        let art = converter(100).convert_image(&path).unwrap();
        assert_eq!(art.source_size, (200, 100));
        let text = art.text();
        assert_eq!(text.lines().count(), 25);
        // Lanczos peut laisser 254 sur un aplat blanc : dernier ou avant-dernier glyphe
        assert!(
            text.lines()
                .all(|l| l.len() == 100 && l.chars().all(|c| c == ' ' || c == '.'))
        );
    }

    #[test]
    fn bayer_dither_spreads_mid_gray_over_several_glyphs() {
        let mut frame = FrameBuffer::new(64, 32);
        for (i, px) in frame.data.chunks_exact_mut(4).enumerate() {
            // Dégradé 120..=151 le long de x
            let v = 120 + (i % 64) as u8 / 2;
            px.copy_from_slice(&[v, v, v, 255]);
        }
        let conv = Converter::new(ConvertConfig {
            width: 32,
            dither_mode: DitherMode::Bayer8x8,
            ..ConvertConfig::default()
        })
        .unwrap();
        let grid = conv.convert_frame(&frame).unwrap();

        let mut chars: Vec<char> = grid.cells.iter().map(|c| c.ch).collect();
        chars.sort_unstable();
        chars.dedup();
        assert!(chars.len() > 1, "{chars:?}");
        // Chaque ligne mélange les glyphes, pas seulement le dégradé horizontal
        let first_col: Vec<char> = (0..grid.height).map(|y| grid.get(0, y).ch).collect();
        assert!(first_col.windows(2).any(|w| w[0] != w[1]), "{first_col:?}");
    }

    #[test]
    fn blocks_charset_renders_dark_pixels_as_full_block() {
        let conv = Converter::new(ConvertConfig {
            width: 4,
            charset: "blocks".into(),
            ..ConvertConfig::default()
        })
        .unwrap();
        assert_eq!(conv.charset(), CHARSET_BLOCKS);
        let grid = conv.convert_frame(&FrameBuffer::filled(8, 8, (0, 0, 0))).unwrap();
        assert!(grid.cells.iter().all(|c| c.ch == '█'));
    }

    #[test]
    fn gif_frames_keep_order_index_and_delay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        {
            let mut encoder = GifEncoder::new(std::fs::File::create(&path).unwrap());
            for (gray, ms) in [(0u8, 30u32), (255, 60), (0, 90)] {
                let buffer = RgbaImage::from_pixel(20, 20, Rgba([gray, gray, gray, 255]));
                encoder
                    .encode_frame(Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(ms, 1)))
                    .unwrap();
            }
        }

        let frames = converter(10).convert_gif(&path).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(
            frames.iter().map(|f| f.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(frames[1].delay, Duration::from_millis(60));
        assert_eq!(frames[0].grid.get(0, 0).ch, '@');
        assert!(matches!(frames[1].grid.get(0, 0).ch, ' ' | '.'));
        assert_eq!((frames[2].grid.width, frames[2].grid.height), (10, 5));
    }

    #[test]
    fn convert_source_drains_image_source() {
        let mut source = ImageSource::from_frame(FrameBuffer::filled(40, 20, (255, 255, 255)));
        let frames = converter(20).convert_source(&mut source).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!((frames[0].grid.width, frames[0].grid.height), (20, 5));
    }

    #[test]
    fn convert_frames_uses_native_size_for_grid() {
        let frame = SourceFrame {
            buffer: Arc::new(FrameBuffer::filled(10, 10, (0, 0, 0))),
            delay: Duration::from_millis(5),
        };
        let frames = converter(6)
            .convert_frames(&[frame.clone(), frame], (30, 60))
            .unwrap();
        assert_eq!((frames[0].grid.width, frames[0].grid.height), (6, 6));
    }
}
