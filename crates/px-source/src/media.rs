use std::path::Path;

use anyhow::Result;
use px_core::traits::Source;

use crate::gif::{GifSource, is_animated_gif};
use crate::image::{ImageSource, ensure_exists};

/// Extensions vidéo reconnues.
pub const VIDEO_EXTS: &[&str] = &[
    "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "ts", "mpg", "mpeg",
];

/// Catégorie d'un fichier d'entrée.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    /// Image fixe (y compris GIF à une seule frame).
    Image,
    /// GIF à plusieurs frames.
    AnimatedGif,
    /// Vidéo décodée par ffmpeg.
    Video,
}

impl MediaKind {
    /// Classe un chemin : extension vidéo, sinon GIF animé, sinon image.
    ///
    /// Les extensions inconnues sont tentées comme images.
    ///
    /// # Errors
    /// `CoreError::FileNotFound` si le fichier n'existe pas.
    pub fn detect(path: &Path) -> Result<Self> {
        ensure_exists(path)?;
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        if VIDEO_EXTS.contains(&ext.as_str()) {
            return Ok(Self::Video);
        }
        if is_animated_gif(path) {
            return Ok(Self::AnimatedGif);
        }
        Ok(Self::Image)
    }

    /// `true` pour les entrées à plusieurs frames.
    #[must_use]
    pub fn is_animated(self) -> bool {
        matches!(self, Self::AnimatedGif | Self::Video)
    }
}

/// Ouvre la source correspondant à `kind`.
///
/// Pour la vidéo, ffmpeg décode directement à `grid` (colonnes, lignes).
///
/// # Errors
/// Returns an error if decoding fails, or for video when the `video` feature
/// is disabled.
pub fn open_source(path: &Path, kind: MediaKind, grid: (u32, f32)) -> Result<Box<dyn Source>> {
    match kind {
        MediaKind::Image => Ok(Box::new(ImageSource::new(path)?)),
        MediaKind::AnimatedGif => Ok(Box::new(GifSource::new(path)?)),
        MediaKind::Video => open_video(path, grid),
    }
}

#[cfg(feature = "video")]
fn open_video(path: &Path, (width, aspect): (u32, f32)) -> Result<Box<dyn Source>> {
    Ok(Box::new(crate::video::VideoSource::open(path, width, aspect)?))
}

#[cfg(not(feature = "video"))]
fn open_video(path: &Path, _grid: (u32, f32)) -> Result<Box<dyn Source>> {
    Err(px_core::error::CoreError::UnsupportedFormat {
        format: format!(
            "{} (video support requires building with --features video)",
            path.display()
        ),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gif::tests::write_gif;
    use px_core::error::CoreError;
    use image::RgbaImage;

    #[test]
    fn detects_still_and_animated_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("still.png");
        RgbaImage::new(4, 4).save(&png).unwrap();
        let single = write_gif(dir.path(), "single.gif", &[(0, 10)]);
        let anim = write_gif(dir.path(), "anim.gif", &[(0, 10), (255, 10)]);

        assert_eq!(MediaKind::detect(&png).unwrap(), MediaKind::Image);
        assert_eq!(MediaKind::detect(&single).unwrap(), MediaKind::Image);
        assert_eq!(MediaKind::detect(&anim).unwrap(), MediaKind::AnimatedGif);
    }

    #[test]
    fn detects_video_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let clip = dir.path().join("clip.MP4");
        std::fs::write(&clip, b"").unwrap();
        assert_eq!(MediaKind::detect(&clip).unwrap(), MediaKind::Video);
        assert!(MediaKind::Video.is_animated());
    }

    #[test]
    fn missing_input_is_not_found() {
        let err = MediaKind::detect(Path::new("/no/such/file.png")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::FileNotFound { .. })
        ));
    }

    #[test]
    fn open_source_for_animated_gif_reports_frames() {
        let dir = tempfile::tempdir().unwrap();
        let anim = write_gif(dir.path(), "anim.gif", &[(0, 10), (90, 10), (255, 10)]);
        let source = open_source(&anim, MediaKind::AnimatedGif, (40, 0.5)).unwrap();
        assert_eq!(source.frame_count(), Some(3));
    }
}
