//! Décodage des GIF animés : toutes les frames, composées sur le canevas complet.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, ImageDecoder};
use px_core::traits::{Source, SourceFrame};

use crate::image::{ensure_exists, rgba_to_frame};

/// Délai appliqué aux frames déclarant 0 ms (convention des navigateurs).
pub const ZERO_DELAY_FALLBACK: Duration = Duration::from_millis(100);

fn open_decoder(path: &Path) -> Result<GifDecoder<BufReader<File>>> {
    ensure_exists(path)?;
    let file = File::open(path).with_context(|| format!("Impossible d'ouvrir {}", path.display()))?;
    GifDecoder::new(BufReader::new(file))
        .with_context(|| format!("Failed to load image '{}': not a GIF", path.display()))
}

/// `true` si le fichier est un GIF d'au moins deux frames.
///
/// Toute erreur (fichier absent, autre format) donne `false`.
///
/// # Example
/// ```
/// use px_source::gif::is_animated_gif;
/// use std::path::Path;
/// assert!(!is_animated_gif(Path::new("/nope.gif")));
/// ```
#[must_use]
pub fn is_animated_gif(path: &Path) -> bool {
    let Ok(decoder) = open_decoder(path) else {
        return false;
    };
    decoder
        .into_frames()
        .take(2)
        .filter(std::result::Result::is_ok)
        .count()
        > 1
}

/// Nombre de frames d'un GIF.
///
/// # Errors
/// Returns an error if the file is not a decodable GIF.
pub fn count_frames(path: &Path) -> Result<usize> {
    let decoder = open_decoder(path)?;
    decoder
        .into_frames()
        .try_fold(0usize, |n, frame| frame.map(|_| n + 1))
        .with_context(|| format!("Frame GIF illisible dans {}", path.display()))
}

/// Source GIF : toutes les frames décodées à l'ouverture, rejouées dans l'ordre.
///
/// # Example
/// ```no_run
/// use px_source::gif::GifSource;
/// use px_core::traits::Source;
/// use std::path::Path;
/// let mut gif = GifSource::new(Path::new("anim.gif")).unwrap();
/// while let Some(frame) = gif.next_frame() {
///     println!("{}x{} for {:?}", frame.buffer.width, frame.buffer.height, frame.delay);
/// }
/// ```
pub struct GifSource {
    frames: Vec<SourceFrame>,
    cursor: usize,
    size: (u32, u32),
}

impl GifSource {
    /// Decode every frame of `path`.
    ///
    /// # Errors
    /// Returns an error if the file is missing, not a GIF, or has no frame.
    pub fn new(path: &Path) -> Result<Self> {
        let decoder = open_decoder(path)?;
        let size = decoder.dimensions();
        let frames = decoder
            .into_frames()
            .collect_frames()
            .with_context(|| format!("Failed to load image '{}'", path.display()))?;

        if frames.is_empty() {
            anyhow::bail!("Aucune frame dans {}", path.display());
        }

        let frames: Vec<SourceFrame> = frames
            .into_iter()
            .map(|frame| {
                let delay = Duration::from(frame.delay());
                SourceFrame {
                    buffer: Arc::new(rgba_to_frame(frame.into_buffer())),
                    delay: if delay.is_zero() {
                        ZERO_DELAY_FALLBACK
                    } else {
                        delay
                    },
                }
            })
            .collect();

        log::info!(
            "GIF {}: {}x{}, {} frames",
            path.display(),
            size.0,
            size.1,
            frames.len()
        );

        Ok(Self {
            frames,
            cursor: 0,
            size,
        })
    }

    /// Toutes les frames décodées.
    #[must_use]
    pub fn frames(&self) -> &[SourceFrame] {
        &self.frames
    }

    /// Consomme la source et rend ses frames.
    #[must_use]
    pub fn into_frames(self) -> Vec<SourceFrame> {
        self.frames
    }
}

impl Source for GifSource {
    fn next_frame(&mut self) -> Option<SourceFrame> {
        let frame = self.frames.get(self.cursor).cloned();
        if frame.is_some() {
            self.cursor += 1;
        }
        frame
    }

    fn native_size(&self) -> (u32, u32) {
        self.size
    }

    fn frame_count(&self) -> Option<usize> {
        Some(self.frames.len())
    }
}
