//! Character sets, ordered from darkest to lightest (dense → sparse).
//!
//! Bright pixels land on the sparse end of the set, dark pixels on the dense end.

use crate::error::CoreError;

/// 10 caractères — compact, bon contraste.
pub const CHARSET_SIMPLE: &str = "@%#*+=-:. ";

/// 70 caractères — Paul Bourke, résolution maximale.
pub const CHARSET_STANDARD: &str =
    "$@B%8&WM#*oahkbdpqwmZO0QLCJUYXzcvunxrjft/\\|()1{}[]?-_+~<>i!lI;:,\"^`'. ";

/// Alias historique de `simple`.
// TODO: give `detailed` its own ramp once a 20-30 glyph set is settled on.
pub const CHARSET_DETAILED: &str = "@%#*+=-:. ";

/// Blocs Unicode — pseudo-pixels.
pub const CHARSET_BLOCKS: &str = "█▓▒░ ";

/// Blocs denses puis ASCII pour les tons clairs.
pub const CHARSET_BLOCKS_SIMPLE: &str = "█▓▒░*+=-:. ";

/// Nom du charset par défaut.
pub const DEFAULT_CHARSET: &str = "simple";

/// Presets built-in, dans l'ordre d'affichage.
pub const PRESETS: &[(&str, &str)] = &[
    ("simple", CHARSET_SIMPLE),
    ("standard", CHARSET_STANDARD),
    ("detailed", CHARSET_DETAILED),
    ("blocks", CHARSET_BLOCKS),
    ("blocks-simple", CHARSET_BLOCKS_SIMPLE),
];

/// Names of the built-in presets.
///
/// # Example
/// ```
/// use px_core::charset::preset_names;
/// assert_eq!(preset_names()[0], "simple");
/// ```
#[must_use]
pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|(name, _)| *name).collect()
}

/// Resolve a preset name to its characters.
///
/// # Errors
/// Returns [`CoreError::UnknownCharset`] listing the available names.
///
/// # Example
/// ```
/// use px_core::charset::resolve_preset;
/// assert_eq!(resolve_preset("blocks").unwrap(), "█▓▒░ ");
/// assert!(resolve_preset("fancy").is_err());
/// ```
pub fn resolve_preset(name: &str) -> Result<&'static str, CoreError> {
    PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, chars)| *chars)
        .ok_or_else(|| CoreError::UnknownCharset {
            name: name.to_string(),
            available: preset_names().join(", "),
        })
}

/// Lookup table mapping luminance [0..255] → character.
///
/// Pre-computed once per conversion for O(1) per-pixel cost.
///
/// # Example
/// ```
/// use px_core::charset::LuminanceLut;
/// let lut = LuminanceLut::new("@#:. ").unwrap();
/// assert_eq!(lut.map(0), '@');
/// assert_eq!(lut.map(255), ' ');
/// ```
#[derive(Clone)]
pub struct LuminanceLut {
    lut: [char; 256],
    levels: usize,
}

impl LuminanceLut {
    /// Build a LUT from a charset ordered densest→lightest.
    ///
    /// Index = `luminance * (len - 1) / 255`, so a single-character set
    /// maps every pixel to that character.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] if the charset is empty.
    pub fn new(charset: &str) -> Result<Self, CoreError> {
        let chars: Vec<char> = charset.chars().collect();
        if chars.is_empty() {
            return Err(CoreError::Config("charset must not be empty".into()));
        }
        let len = chars.len();
        let mut lut = [' '; 256];
        for (i, slot) in lut.iter_mut().enumerate() {
            *slot = chars[i * (len - 1) / 255];
        }
        Ok(Self { lut, levels: len })
    }

    /// Map a luminance value [0..255] to a character.
    ///
    /// # Example
    /// ```
    /// use px_core::charset::LuminanceLut;
    /// let lut = LuminanceLut::new("@#:. ").unwrap();
    /// assert_eq!(lut.map(128), ':');
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn map(&self, luminance: u8) -> char {
        self.lut[luminance as usize]
    }

    /// Nombre de caractères distincts du charset source.
    #[must_use]
    pub fn levels(&self) -> usize {
        self.levels
    }
}
