use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use px_core::frame::AsciiFrame;

use crate::paths::{frame_base, frame_path};

/// Écrit le texte en UTF-8, tel quel.
///
/// # Errors
/// Retourne une erreur si le fichier ne peut pas être écrit.
pub fn save_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).with_context(|| format!("Impossible d'écrire {}", path.display()))?;
    log::info!("Texte écrit: {} ({} octets)", path.display(), text.len());
    Ok(())
}

/// Un fichier texte par frame : `<base>_frame_<NNNN>.txt`.
///
/// `<base>` est `output` sans sa dernière extension. Retourne les chemins écrits,
/// dans l'ordre des frames.
///
/// # Errors
/// Retourne une erreur à la première écriture qui échoue.
pub fn save_frames(output: &Path, frames: &[AsciiFrame]) -> Result<Vec<PathBuf>> {
    let base = frame_base(output);
    frames
        .iter()
        .map(|frame| {
            let path = frame_path(&base, frame.index);
            save_text(&path, &frame.text())?;
            Ok(path)
        })
        .collect()
}
