use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::charset::DEFAULT_CHARSET;

/// Largeur par défaut de la sortie, en caractères.
pub const DEFAULT_WIDTH: u32 = 100;

/// Largeur maximale acceptée.
pub const MAX_WIDTH: u32 = 2000;

/// Correction d'aspect : un glyphe terminal est ~2× plus haut que large.
/// Plus la valeur est basse, plus la hauteur est compressée.
pub const ASPECT_RATIO_CORRECTION: f32 = 0.5;

/// Fichier de config cherché dans le répertoire courant si `--config` est absent.
pub const DEFAULT_CONFIG_FILE: &str = "pixscii.toml";

/// Configuration complète de la conversion.
///
/// Sérialisable en TOML. Chaque champ a une valeur par défaut saine.
///
/// # Example
/// ```
/// use px_core::config::ConvertConfig;
/// let config = ConvertConfig::default();
/// assert_eq!(config.width, 100);
/// assert_eq!(config.charset, "simple");
/// ```
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ConvertConfig {
    // === Conversion ===
    /// Largeur de sortie en caractères.
    pub width: u32,
    /// Nom du preset de charset.
    pub charset: String,
    /// Charset libre (dense → clair), prioritaire sur `charset`.
    pub custom_charset: Option<String>,
    /// Facteur appliqué à la hauteur calculée (0.5 pour les polices terminal).
    pub aspect_ratio: f32,
    /// Inverser la luminance (pour fond clair).
    pub invert: bool,
    /// Contraste [0.1, 3.0]. 1.0 = neutre.
    pub contrast: f32,
    /// Brightness offset [-1.0, 1.0]. 0.0 = neutre.
    pub brightness: f32,
    /// Dithering mode.
    pub dither_mode: DitherMode,

    // === Couleur ===
    /// Sortie couleur (ANSI en terminal, glyphes colorés en image).
    pub color_enabled: bool,
    /// Méthode de mapping couleur.
    pub color_mode: ColorMode,
    /// Saturation boost [0.0, 3.0], utilisé par `HsvBright`.
    pub saturation: f32,

    // === Lecture ===
    /// FPS forcé pour la lecture. `None` = délais de la source.
    pub playback_fps: Option<u32>,
    /// Reboucler l'animation en lecture terminal.
    pub loop_playback: bool,

    // === Rendu image ===
    /// Police TTF/OTF pour `--render-image`.
    pub font_path: Option<PathBuf>,
    /// Taille de police en pixels.
    pub font_size: f32,
    /// Couleur de fond du rendu image.
    pub background: [u8; 3],
    /// Couleur des glyphes quand la couleur est désactivée.
    pub foreground: [u8; 3],
}

/// Color mapping mode.
///
/// # Example
/// ```
/// use px_core::config::ColorMode;
/// assert!(matches!(ColorMode::default(), ColorMode::Direct));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum ColorMode {
    /// RGB direct du pixel source (truecolor).
    #[default]
    Direct,
    /// HSV avec V forcé à 1.0 (le glyphe encode la luminance).
    HsvBright,
    /// Cube 6×6×6 de la palette 256 couleurs, pour les terminaux sans truecolor.
    Ansi256,
}

/// Dithering mode for luminance quantization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum DitherMode {
    /// No dithering.
    #[default]
    None,
    /// Bayer 8×8 ordered dithering.
    Bayer8x8,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            charset: DEFAULT_CHARSET.to_string(),
            custom_charset: None,
            aspect_ratio: ASPECT_RATIO_CORRECTION,
            invert: false,
            contrast: 1.0,
            brightness: 0.0,
            dither_mode: DitherMode::None,
            color_enabled: false,
            color_mode: ColorMode::Direct,
            saturation: 1.0,
            playback_fps: None,
            loop_playback: true,
            font_path: None,
            font_size: 14.0,
            background: [0, 0, 0],
            foreground: [255, 255, 255],
        }
    }
}

impl ConvertConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization and after CLI overrides.
    pub fn clamp_all(&mut self) {
        self.width = self.width.clamp(1, MAX_WIDTH);
        self.aspect_ratio = self.aspect_ratio.clamp(0.1, 4.0);
        self.contrast = self.contrast.clamp(0.1, 3.0);
        self.brightness = self.brightness.clamp(-1.0, 1.0);
        self.saturation = self.saturation.clamp(0.0, 3.0);
        self.playback_fps = self.playback_fps.map(|fps| fps.clamp(1, 120));
        self.font_size = self.font_size.clamp(4.0, 128.0);
    }

    /// Nom lisible du charset actif (`custom` si un charset libre est défini).
    ///
    /// # Example
    /// ```
    /// use px_core::config::ConvertConfig;
    /// let mut config = ConvertConfig::default();
    /// assert_eq!(config.charset_label(), "simple");
    /// config.custom_charset = Some("#. ".into());
    /// assert_eq!(config.charset_label(), "custom");
    /// ```
    #[must_use]
    pub fn charset_label(&self) -> &str {
        if self.custom_charset.is_some() {
            "custom"
        } else {
            &self.charset
        }
    }
}

/// Structure TOML intermédiaire, toutes sections optionnelles.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    convert: Option<ConvertSection>,
    playback: Option<PlaybackSection>,
    render: Option<RenderSection>,
}

/// Convert section of the TOML config, all fields optional for partial override.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConvertSection {
    width: Option<u32>,
    charset: Option<String>,
    custom_charset: Option<String>,
    aspect_ratio: Option<f32>,
    invert: Option<bool>,
    contrast: Option<f32>,
    brightness: Option<f32>,
    dither_mode: Option<DitherMode>,
    color_enabled: Option<bool>,
    color_mode: Option<ColorMode>,
    saturation: Option<f32>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct PlaybackSection {
    fps: Option<u32>,
    #[serde(rename = "loop")]
    loop_playback: Option<bool>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RenderSection {
    font_path: Option<PathBuf>,
    font_size: Option<f32>,
    background: Option<[u8; 3]>,
    foreground: Option<[u8; 3]>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
///
/// # Example
/// ```no_run
/// use px_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("pixscii.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<ConvertConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;
    parse_config(&content).with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))
}

/// Parse un document TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the document is not valid TOML or has unknown keys.
///
/// # Example
/// ```
/// use px_core::config::parse_config;
/// let config = parse_config("[convert]\nwidth = 80\n").unwrap();
/// assert_eq!(config.width, 80);
/// assert_eq!(config.charset, "simple");
/// ```
pub fn parse_config(content: &str) -> Result<ConvertConfig> {
    let file: ConfigFile = toml::from_str(content)?;
    let mut config = ConvertConfig::default();

    if let Some(c) = file.convert {
        if let Some(v) = c.width {
            config.width = v;
        }
        if let Some(v) = c.charset {
            config.charset = v;
        }
        if c.custom_charset.is_some() {
            config.custom_charset = c.custom_charset;
        }
        if let Some(v) = c.aspect_ratio {
            config.aspect_ratio = v;
        }
        if let Some(v) = c.invert {
            config.invert = v;
        }
        if let Some(v) = c.contrast {
            config.contrast = v;
        }
        if let Some(v) = c.brightness {
            config.brightness = v;
        }
        if let Some(v) = c.dither_mode {
            config.dither_mode = v;
        }
        if let Some(v) = c.color_enabled {
            config.color_enabled = v;
        }
        if let Some(v) = c.color_mode {
            config.color_mode = v;
        }
        if let Some(v) = c.saturation {
            config.saturation = v;
        }
    }

    if let Some(p) = file.playback {
        if p.fps.is_some() {
            config.playback_fps = p.fps;
        }
        if let Some(v) = p.loop_playback {
            config.loop_playback = v;
        }
    }

    if let Some(r) = file.render {
        if r.font_path.is_some() {
            config.font_path = r.font_path;
        }
        if let Some(v) = r.font_size {
            config.font_size = v;
        }
        if let Some(v) = r.background {
            config.background = v;
        }
        if let Some(v) = r.foreground {
            config.foreground = v;
        }
    }

    config.clamp_all();
    log::debug!("config: {config:?}");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        assert_eq!(parse_config("").unwrap(), ConvertConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_fields() {
        let config = parse_config(
            r#"
            [convert]
            charset = "blocks"
            color_mode = "Ansi256"

            [playback]
            loop = false
            "#,
        )
        .unwrap();
        assert_eq!(config.charset, "blocks");
        assert_eq!(config.color_mode, ColorMode::Ansi256);
        assert!(!config.loop_playback);
        assert_eq!(config.width, DEFAULT_WIDTH);
        assert!((config.aspect_ratio - ASPECT_RATIO_CORRECTION).abs() < f32::EPSILON);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let config = parse_config(
            "[convert]\nwidth = 0\ncontrast = 9.0\nbrightness = -4.0\n[playback]\nfps = 500\n",
        )
        .unwrap();
        assert_eq!(config.width, 1);
        assert!((config.contrast - 3.0).abs() < f32::EPSILON);
        assert!((config.brightness + 1.0).abs() < f32::EPSILON);
        assert_eq!(config.playback_fps, Some(120));
    }

    #[test]
    fn unknown_key_is_an_error() {
        assert!(parse_config("[convert]\nwdith = 80\n").is_err());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(parse_config("[convert\nwidth = ").is_err());
    }

    #[test]
    fn load_config_reads_render_section() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[render]\nfont_size = 20.0\nbackground = [255, 255, 255]\nforeground = [0, 0, 0]"
        )
        .unwrap();
        let config = load_config(file.path()).unwrap();
        assert!((config.font_size - 20.0).abs() < f32::EPSILON);
        assert_eq!(config.background, [255, 255, 255]);
        assert_eq!(config.foreground, [0, 0, 0]);
    }

    #[test]
    fn load_config_missing_file_mentions_path() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.toml"));
    }
}
