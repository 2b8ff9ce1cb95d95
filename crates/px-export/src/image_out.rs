use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use px_core::frame::FrameBuffer;

/// Copie un FrameBuffer dans une image `image`.
///
/// # Errors
/// Retourne une erreur si la taille du buffer ne correspond pas aux dimensions.
pub fn to_rgba_image(fb: &FrameBuffer) -> Result<RgbaImage> {
    RgbaImage::from_raw(fb.width, fb.height, fb.data.clone())
        .with_context(|| format!("Buffer RGBA incohérent ({}x{})", fb.width, fb.height))
}

/// Enregistre le buffer en PNG, quelle que soit l'extension de `path`.
///
/// # Errors
/// Retourne une erreur si l'encodage ou l'écriture échoue.
pub fn save_png(fb: &FrameBuffer, path: &Path) -> Result<()> {
    to_rgba_image(fb)?
        .save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Impossible d'écrire le PNG {}", path.display()))?;
    log::info!("PNG écrit: {} ({}x{})", path.display(), fb.width, fb.height);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_roundtrips_dimensions_and_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("art.png");
        save_png(&FrameBuffer::filled(7, 3, (12, 34, 56)), &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (7, 3));
        assert_eq!(img.get_pixel(6, 2).0, [12, 34, 56, 255]);
    }

    #[test]
    fn inconsistent_buffer_is_rejected() {
        let fb = FrameBuffer {
            data: vec![0; 3],
            width: 2,
            height: 2,
        };
        assert!(to_rgba_image(&fb).is_err());
    }
}
