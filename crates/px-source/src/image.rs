use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use image::{ImageReader, RgbaImage};
use px_core::error::CoreError;
use px_core::frame::FrameBuffer;
use px_core::traits::{Source, SourceFrame};

/// Source d'image statique. Livre sa frame une seule fois.
///
/// # Example
/// ```no_run
/// use px_source::image::ImageSource;
/// use std::path::Path;
/// let source = ImageSource::new(Path::new("photo.jpg")).unwrap();
/// ```
pub struct ImageSource {
    frame: Arc<FrameBuffer>,
    consumed: bool,
}

impl ImageSource {
    /// Load an image from disk and create a source.
    ///
    /// # Errors
    /// Returns an error if the file is missing or cannot be decoded.
    pub fn new(path: &Path) -> Result<Self> {
        Ok(Self {
            frame: Arc::new(load_image(path)?),
            consumed: false,
        })
    }

    /// Wrap an already decoded frame.
    #[must_use]
    pub fn from_frame(frame: FrameBuffer) -> Self {
        Self {
            frame: Arc::new(frame),
            consumed: false,
        }
    }
}

impl Source for ImageSource {
    fn next_frame(&mut self) -> Option<SourceFrame> {
        if self.consumed {
            return None;
        }
        self.consumed = true;
        Some(SourceFrame {
            buffer: Arc::clone(&self.frame),
            delay: Duration::ZERO,
        })
    }

    fn native_size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn frame_count(&self) -> Option<usize> {
        Some(1)
    }
}

/// Décode une image (PNG, JPEG, BMP, GIF : première frame) en RGBA.
///
/// # Errors
/// [`CoreError::FileNotFound`] si le fichier n'existe pas, sinon une erreur
/// `Failed to load image '<path>'` avec la cause du décodeur.
///
/// # Example
/// ```no_run
/// use px_source::image::load_image;
/// use std::path::Path;
/// let frame = load_image(Path::new("photo.jpg")).unwrap();
/// ```
pub fn load_image(path: &Path) -> Result<FrameBuffer> {
    let img = open_reader(path)?
        .decode()
        .with_context(|| format!("Failed to load image '{}'", path.display()))?;
    Ok(rgba_to_frame(img.to_rgba8()))
}

/// Dimensions natives sans décoder les pixels.
///
/// # Errors
/// Returns an error if the file is missing or its header is unreadable.
pub fn image_size(path: &Path) -> Result<(u32, u32)> {
    open_reader(path)?
        .into_dimensions()
        .with_context(|| format!("Failed to read image size of '{}'", path.display()))
}

/// Lecteur dont le format vient des octets de tête, l'extension ne sert
/// que si la signature est inconnue.
fn open_reader(path: &Path) -> Result<ImageReader<BufReader<File>>> {
    ensure_exists(path)?;
    ImageReader::open(path)
        .and_then(ImageReader::with_guessed_format)
        .with_context(|| format!("Failed to load image '{}'", path.display()))
}

/// Convertit un `RgbaImage` en `FrameBuffer` sans copie.
#[must_use]
pub fn rgba_to_frame(rgba: RgbaImage) -> FrameBuffer {
    let (width, height) = rgba.dimensions();
    FrameBuffer {
        data: rgba.into_raw(),
        width,
        height,
    }
}

pub(crate) fn ensure_exists(path: &Path) -> Result<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into())
    }
}
