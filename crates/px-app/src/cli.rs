use std::path::PathBuf;

use clap::builder::PossibleValuesParser;
use clap::{Parser, ValueEnum};
use px_core::charset::PRESETS;
use px_core::config::{ColorMode, MAX_WIDTH};

/// pixscii — convertit images, GIF animés et vidéos en art ASCII.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier d'entrée : image (PNG, JPEG, BMP), GIF animé ou vidéo.
    pub input: PathBuf,

    /// Largeur de sortie en caractères. Défaut : 100, ou auto avec --render-image.
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_WIDTH)))]
    pub width: Option<u32>,

    /// Jeu de caractères (du plus dense au plus clair).
    #[arg(long = "char-set", value_parser = PossibleValuesParser::new(PRESETS.iter().map(|(name, _)| *name)))]
    pub char_set: Option<String>,

    /// Charset libre, prioritaire sur --char-set.
    #[arg(long)]
    pub custom_charset: Option<String>,

    /// Fichier de sortie (texte, ou image avec --render-image).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Rendre l'art ASCII en image (PNG, GIF animé ou MP4).
    #[arg(long, default_value_t = false)]
    pub render_image: bool,

    /// Sortie couleur (ANSI en terminal, glyphes colorés en image).
    #[arg(long, default_value_t = false)]
    pub color: bool,

    /// Méthode de mapping couleur.
    #[arg(long, value_enum)]
    pub color_mode: Option<ColorModeArg>,

    /// Inverser la luminance (pour fond clair).
    #[arg(long, default_value_t = false)]
    pub invert: bool,

    /// Dithering ordonné Bayer 8×8.
    #[arg(long, default_value_t = false)]
    pub dither: bool,

    /// Contraste [0.1, 3.0].
    #[arg(long)]
    pub contrast: Option<f32>,

    /// Luminosité [-1.0, 1.0].
    #[arg(long)]
    pub brightness: Option<f32>,

    /// Lire l'animation dans le terminal (GIF animé, vidéo).
    #[arg(long, default_value_t = false)]
    pub play: bool,

    /// FPS imposé pour la lecture (sinon délais de la source).
    #[arg(long)]
    pub fps: Option<u32>,

    /// Ne pas reboucler la lecture.
    #[arg(long, default_value_t = false)]
    pub no_loop: bool,

    /// Police TTF/OTF pour --render-image.
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Taille de police en pixels pour --render-image.
    #[arg(long)]
    pub font_size: Option<f32>,

    /// Fichier de configuration TOML. Défaut : pixscii.toml s'il existe.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Supprimer les messages d'état.
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    pub log_level: String,
}

/// Valeurs CLI de `--color-mode`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorModeArg {
    /// RGB du pixel source (truecolor).
    Direct,
    /// Teinte saturée, luminosité portée par le glyphe.
    HsvBright,
    /// Palette 256 couleurs.
    Ansi256,
}

impl From<ColorModeArg> for ColorMode {
    fn from(arg: ColorModeArg) -> Self {
        match arg {
            ColorModeArg::Direct => Self::Direct,
            ColorModeArg::HsvBright => Self::HsvBright,
            ColorModeArg::Ansi256 => Self::Ansi256,
        }
    }
}
