//! Résolution de la police monospace utilisée pour le rendu bitmap.
//!
//! Ordre : chemin explicite, variable `PIXSCII_FONT`, polices système connues.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Variable d'environnement pointant vers une police TTF/OTF.
pub const FONT_ENV: &str = "PIXSCII_FONT";

/// Polices monospace courantes, essayées dans l'ordre.
pub const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/TTF/DejaVuSansMono.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationMono-Regular.ttf",
    "/usr/share/fonts/liberation-mono/LiberationMono-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansMono-Regular.ttf",
    "/Library/Fonts/Courier New.ttf",
    "/System/Library/Fonts/Supplemental/Courier New.ttf",
    "C:\\Windows\\Fonts\\consola.ttf",
    "C:\\Windows\\Fonts\\cour.ttf",
];

/// Candidats dans l'ordre de priorité, sans vérifier leur existence.
#[must_use]
pub fn font_candidates(explicit: Option<&Path>, env: Option<OsString>) -> Vec<PathBuf> {
    let mut out = Vec::with_capacity(SYSTEM_FONTS.len() + 2);
    if let Some(path) = explicit {
        out.push(path.to_path_buf());
    }
    if let Some(var) = env.filter(|v| !v.is_empty()) {
        out.push(PathBuf::from(var));
    }
    out.extend(SYSTEM_FONTS.iter().map(PathBuf::from));
    out
}

/// Trouve une police utilisable.
///
/// Un chemin explicite absent est une erreur (pas de repli silencieux).
///
/// # Errors
/// Retourne une erreur si aucune police n'est trouvée.
pub fn resolve_font(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit
        && !path.is_file()
    {
        anyhow::bail!("Police introuvable : {}", path.display());
    }

    let found = font_candidates(explicit, std::env::var_os(FONT_ENV))
        .into_iter()
        .find(|p| p.is_file());

    match found {
        Some(path) => {
            log::debug!("Police: {}", path.display());
            Ok(path)
        }
        None => anyhow::bail!(
            "No monospace font found. Pass --font <PATH>, set {FONT_ENV}, \
             or install DejaVu Sans Mono."
        ),
    }
}

/// Résout puis lit la police en mémoire.
///
/// # Errors
/// Retourne une erreur si aucune police n'est trouvée ou lisible.
pub fn load_font(explicit: Option<&Path>) -> Result<Vec<u8>> {
    let path = resolve_font(explicit)?;
    std::fs::read(&path).with_context(|| format!("Impossible de lire la police {}", path.display()))
}
