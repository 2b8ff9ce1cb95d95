//! Résolution de la configuration : fichier TOML, puis overrides CLI.

use std::path::{Path, PathBuf};

use anyhow::Result;
use px_core::config::{ColorMode, ConvertConfig, DEFAULT_CONFIG_FILE, DitherMode, MAX_WIDTH, load_config};

use crate::cli::Cli;

/// Fraction de la largeur en pixels retenue par l'auto-détection.
const AUTO_WIDTH_RATIO: f64 = 0.3;

/// Largeur max produite par l'auto-détection.
const AUTO_WIDTH_MAX: u32 = 500;

/// Fichier de config à utiliser : `--config`, sinon `pixscii.toml` dans `cwd` s'il existe.
///
/// # Errors
/// Retourne une erreur si le fichier passé explicitement n'existe pas.
pub fn config_path(explicit: Option<&Path>, cwd: &Path) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config introuvable : {}", path.display());
        }
        return Ok(Some(path.to_path_buf()));
    }
    let fallback = cwd.join(DEFAULT_CONFIG_FILE);
    Ok(fallback.is_file().then_some(fallback))
}

/// Charge la config du fichier (ou les défauts si aucun).
///
/// # Errors
/// Retourne une erreur si le fichier ne peut pas être lu ou parsé.
pub fn load_file_config(path: Option<&Path>) -> Result<ConvertConfig> {
    match path {
        Some(path) => {
            log::info!("Config: {}", path.display());
            load_config(path)
        }
        None => {
            log::debug!("Pas de fichier de config, valeurs par défaut.");
            Ok(ConvertConfig::default())
        }
    }
}

/// Valeurs imposées en ligne de commande, réappliquées après chaque rechargement.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Overrides {
    pub width: Option<u32>,
    pub charset: Option<String>,
    pub custom_charset: Option<String>,
    pub invert: bool,
    pub dither: bool,
    pub contrast: Option<f32>,
    pub brightness: Option<f32>,
    pub color: bool,
    pub color_mode: Option<ColorMode>,
    pub fps: Option<u32>,
    pub no_loop: bool,
    pub font: Option<PathBuf>,
    pub font_size: Option<f32>,
}

impl Overrides {
    #[must_use]
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            width: cli.width,
            charset: cli.char_set.clone(),
            custom_charset: cli.custom_charset.clone(),
            invert: cli.invert,
            dither: cli.dither,
            contrast: cli.contrast,
            brightness: cli.brightness,
            color: cli.color,
            color_mode: cli.color_mode.map(ColorMode::from),
            fps: cli.fps,
            no_loop: cli.no_loop,
            font: cli.font.clone(),
            font_size: cli.font_size,
        }
    }

    /// Écrase les champs fournis puis re-clampe.
    pub fn apply(&self, config: &mut ConvertConfig) {
        if let Some(v) = self.width {
            config.width = v;
        }
        if let Some(v) = &self.charset {
            config.charset.clone_from(v);
            // un preset explicite l'emporte sur le charset libre du fichier
            if self.custom_charset.is_none() {
                config.custom_charset = None;
            }
        }
        if self.custom_charset.is_some() {
            config.custom_charset.clone_from(&self.custom_charset);
        }
        if self.invert {
            config.invert = true;
        }
        if self.dither {
            config.dither_mode = DitherMode::Bayer8x8;
        }
        if let Some(v) = self.contrast {
            config.contrast = v;
        }
        if let Some(v) = self.brightness {
            config.brightness = v;
        }
        if self.color {
            config.color_enabled = true;
        }
        if let Some(v) = self.color_mode {
            config.color_mode = v;
        }
        if self.fps.is_some() {
            config.playback_fps = self.fps;
        }
        if self.no_loop {
            config.loop_playback = false;
        }
        if self.font.is_some() {
            config.font_path.clone_from(&self.font);
        }
        if let Some(v) = self.font_size {
            config.font_size = v;
        }
        config.clamp_all();
    }
}

/// Largeur auto pour le rendu image : 30 % de la largeur en pixels, max 500.
#[must_use]
pub fn auto_width(pixel_width: u32) -> u32 {
    let width = (f64::from(pixel_width) * AUTO_WIDTH_RATIO).floor() as u32;
    width.clamp(1, AUTO_WIDTH_MAX.min(MAX_WIDTH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pixscii").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn auto_width_follows_ratio_and_cap() {
        assert_eq!(auto_width(640), 192);
        assert_eq!(auto_width(1000), 300);
        assert_eq!(auto_width(4000), 500);
        assert_eq!(auto_width(2), 1);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(config_path(Some(&dir.path().join("nope.toml")), dir.path()).is_err());
    }

    #[test]
    fn default_config_file_is_picked_up_when_present() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(config_path(None, dir.path()).unwrap(), None);
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[convert]\nwidth = 42\n").unwrap();
        let found = config_path(None, dir.path()).unwrap();
        assert_eq!(found, Some(dir.path().join(DEFAULT_CONFIG_FILE)));
        assert_eq!(load_file_config(found.as_deref()).unwrap().width, 42);
    }

    #[test]
    fn cli_values_override_file_values() {
        let mut config = px_core::config::parse_config(
            "[convert]\nwidth = 42\ncharset = \"blocks\"\ncontrast = 2.0\n",
        )
        .unwrap();
        Overrides::from_cli(&cli(&["a.png", "-w", "80", "--invert", "--dither", "--no-loop"]))
            .apply(&mut config);
        assert_eq!(config.width, 80);
        assert_eq!(config.charset, "blocks");
        assert!((config.contrast - 2.0).abs() < f32::EPSILON);
        assert!(config.invert);
        assert_eq!(config.dither_mode, DitherMode::Bayer8x8);
        assert!(!config.loop_playback);
    }

    #[test]
    fn explicit_preset_clears_file_custom_charset() {
        let mut config = ConvertConfig {
            custom_charset: Some("XO".into()),
            ..ConvertConfig::default()
        };
        Overrides::from_cli(&cli(&["a.png", "--char-set", "standard"])).apply(&mut config);
        assert_eq!(config.charset, "standard");
        assert_eq!(config.custom_charset, None);
    }

    #[test]
    fn overrides_are_clamped() {
        let mut config = ConvertConfig::default();
        Overrides::from_cli(&cli(&["a.png", "--contrast", "10", "--fps", "1000"])).apply(&mut config);
        assert!((config.contrast - 3.0).abs() < f32::EPSILON);
        assert_eq!(config.playback_fps, Some(120));
    }
}
