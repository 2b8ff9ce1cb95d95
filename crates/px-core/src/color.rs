/// Convertit RGB [0,255] → HSV. H ∈ [0.0, 1.0), S ∈ [0.0, 1.0], V ∈ [0.0, 1.0].
///
/// # Example
/// ```
/// use px_core::color::rgb_to_hsv;
/// let (h, s, v) = rgb_to_hsv(255, 0, 0);
/// assert!(h.abs() < 0.01);
/// assert!((s - 1.0).abs() < 0.01);
/// assert!((v - 1.0).abs() < 0.01);
/// ```
#[must_use]
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let r = f32::from(r) / 255.0;
    let g = f32::from(g) / 255.0;
    let b = f32::from(b) / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { delta / max };
    let h = if delta == 0.0 {
        0.0
    } else if (max - r).abs() < f32::EPSILON {
        (((g - b) / delta) % 6.0) / 6.0
    } else if (max - g).abs() < f32::EPSILON {
        ((b - r) / delta + 2.0) / 6.0
    } else {
        ((r - g) / delta + 4.0) / 6.0
    };
    let h = if h < 0.0 { h + 1.0 } else { h };

    (h, s, max)
}

/// Convertit HSV → RGB [0,255].
///
/// # Example
/// ```
/// use px_core::color::hsv_to_rgb;
/// assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), (255, 0, 0));
/// ```
#[must_use]
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let h = h * 6.0;
    let i = h.floor() as u32;
    let f = h - i as f32;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match i % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    (
        (r * 255.0).round() as u8,
        (g * 255.0).round() as u8,
        (b * 255.0).round() as u8,
    )
}

/// HSV Bright : force V=1.0, le glyphe porte déjà la luminance.
///
/// Couleurs vives sur fond noir. Les gris restent gris (S=0 → blanc).
///
/// # Example
/// ```
/// use px_core::color::apply_hsv_bright;
/// let (r, g, b) = apply_hsv_bright(100, 25, 25, 1.0);
/// assert_eq!(r, 255);
/// assert!(g < r && b < r);
/// ```
#[must_use]
pub fn apply_hsv_bright(r: u8, g: u8, b: u8, saturation_boost: f32) -> (u8, u8, u8) {
    let (h, s, _v) = rgb_to_hsv(r, g, b);
    let s = (s * saturation_boost).min(1.0);
    hsv_to_rgb(h, s, 1.0)
}

/// Niveaux du cube 6×6×6 de la palette xterm 256 couleurs.
const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

fn cube_index(c: u8) -> u8 {
    match c {
        0..=47 => 0,
        48..=114 => 1,
        _ => (c - 35) / 40,
    }
}

/// Quantize a color to its xterm-256 cube index (16..=231).
///
/// # Example
/// ```
/// use px_core::color::rgb_to_ansi256;
/// assert_eq!(rgb_to_ansi256(0, 0, 0), 16);
/// assert_eq!(rgb_to_ansi256(255, 255, 255), 231);
/// assert_eq!(rgb_to_ansi256(255, 0, 0), 196);
/// ```
#[must_use]
pub fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    16 + 36 * cube_index(r) + 6 * cube_index(g) + cube_index(b)
}

/// RGB value actually displayed for a cube index produced by [`rgb_to_ansi256`].
///
/// # Example
/// ```
/// use px_core::color::ansi256_to_rgb;
/// assert_eq!(ansi256_to_rgb(196), (255, 0, 0));
/// ```
#[must_use]
pub fn ansi256_to_rgb(index: u8) -> (u8, u8, u8) {
    let i = index.saturating_sub(16).min(215);
    (
        CUBE_LEVELS[usize::from(i / 36)],
        CUBE_LEVELS[usize::from((i / 6) % 6)],
        CUBE_LEVELS[usize::from(i % 6)],
    )
}
