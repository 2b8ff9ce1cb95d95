//! Tramage ordonné (Bayer 8×8) : casse le banding sur les dégradés
//! quand le charset a peu de niveaux.

/// Matrice de Bayer 8x8. Normalisée sur 64 niveaux (0-63).
pub const BAYER_8X8: [[u8; 8]; 8] = [
    [0, 32, 8, 40, 2, 34, 10, 42],
    [48, 16, 56, 24, 50, 18, 58, 26],
    [12, 44, 4, 36, 14, 46, 6, 38],
    [60, 28, 52, 20, 62, 30, 54, 22],
    [3, 35, 11, 43, 1, 33, 9, 41],
    [51, 19, 59, 27, 49, 17, 57, 25],
    [15, 47, 7, 39, 13, 45, 5, 37],
    [63, 31, 55, 23, 61, 29, 53, 21],
];

/// Applique le tramage Bayer 8x8 à une luminance [0..255].
///
/// L'amplitude du bruit vaut un palier de quantification (`1 / levels`).
/// Les valeurs proches des bornes (0..=1, 254..=255) ne sont pas tramées.
///
/// # Example
/// ```
/// use px_ascii::dither::apply_bayer_8x8;
/// assert_eq!(apply_bayer_8x8(0, 3, 5, 10), 0);
/// assert_eq!(apply_bayer_8x8(255, 3, 5, 10), 255);
/// ```
#[must_use]
#[inline(always)]
pub fn apply_bayer_8x8(lum: u8, x: u32, y: u32, levels: usize) -> u8 {
    if !(2..=253).contains(&lum) {
        return lum;
    }

    let bayer_val = f32::from(BAYER_8X8[(y % 8) as usize][(x % 8) as usize]);
    // [0, 63] → [-0.5, +0.5)
    let threshold = (bayer_val / 64.0) - 0.5;
    let step = 1.0 / (levels.max(2) as f32);

    let dithered = (f32::from(lum) / 255.0 + threshold * step).clamp(0.0, 1.0);
    (dithered * 255.0).round() as u8
}
