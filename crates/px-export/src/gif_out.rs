use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use px_core::frame::FrameBuffer;

use crate::image_out::to_rgba_image;

/// Vitesse de quantification NeuQuant (1 = meilleure qualité, 30 = plus rapide).
const ENCODER_SPEED: i32 = 10;

/// Écrit un GIF animé qui boucle indéfiniment, un délai par frame.
///
/// Retourne le nombre de frames écrites.
///
/// # Errors
/// Retourne une erreur si le fichier ne peut pas être créé ou encodé.
pub fn save_animated_gif<I>(path: &Path, frames: I) -> Result<usize>
where
    I: IntoIterator<Item = (FrameBuffer, Duration)>,
{
    let file = File::create(path).with_context(|| format!("Impossible de créer {}", path.display()))?;
    let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), ENCODER_SPEED);
    encoder.set_repeat(Repeat::Infinite)?;

    let mut count = 0usize;
    for (fb, delay) in frames {
        let frame = Frame::from_parts(to_rgba_image(&fb)?, 0, 0, Delay::from_saturating_duration(delay));
        encoder
            .encode_frame(frame)
            .with_context(|| format!("Échec d'encodage GIF (frame {count})"))?;
        count += 1;
    }
    log::info!("GIF écrit: {} ({count} frames)", path.display());
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::AnimationDecoder;
    use image::codecs::gif::GifDecoder;
    use std::io::BufReader;

    #[test]
    fn animated_gif_keeps_frame_count_and_delays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        let frames = vec![
            (FrameBuffer::filled(8, 4, (0, 0, 0)), Duration::from_millis(50)),
            (FrameBuffer::filled(8, 4, (255, 255, 255)), Duration::from_millis(120)),
        ];
        assert_eq!(save_animated_gif(&path, frames).unwrap(), 2);

        let decoder = GifDecoder::new(BufReader::new(File::open(&path).unwrap())).unwrap();
        let decoded = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(Duration::from(decoded[1].delay()), Duration::from_millis(120));
        assert_eq!(decoded[0].buffer().dimensions(), (8, 4));
    }

    #[test]
    fn unwritable_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("a.gif");
        assert!(save_animated_gif(&path, Vec::new()).is_err());
    }
}
