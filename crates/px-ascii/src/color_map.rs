use px_core::color::{ansi256_to_rgb, apply_hsv_bright, rgb_to_ansi256};
use px_core::config::ColorMode;

/// Map a pixel color according to the selected color mode.
///
/// `Ansi256` rend la couleur réellement affichée par la palette, pas l'index.
///
/// # Example
/// ```
/// use px_ascii::color_map::map_color;
/// use px_core::config::ColorMode;
/// assert_eq!(map_color(200, 50, 50, ColorMode::Direct, 1.0), (200, 50, 50));
/// assert_eq!(map_color(250, 10, 5, ColorMode::Ansi256, 1.0), (255, 0, 0));
/// ```
#[must_use]
pub fn map_color(r: u8, g: u8, b: u8, mode: ColorMode, saturation: f32) -> (u8, u8, u8) {
    match mode {
        ColorMode::Direct => (r, g, b),
        ColorMode::HsvBright => apply_hsv_bright(r, g, b, saturation),
        ColorMode::Ansi256 => ansi256_to_rgb(rgb_to_ansi256(r, g, b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hsv_bright_lifts_dark_colors() {
        let (r, _, _) = map_color(60, 10, 10, ColorMode::HsvBright, 1.0);
        assert_eq!(r, 255);
    }

    #[test]
    fn ansi256_is_idempotent() {
        let once = map_color(123, 45, 210, ColorMode::Ansi256, 1.0);
        let twice = map_color(once.0, once.1, once.2, ColorMode::Ansi256, 1.0);
        assert_eq!(once, twice);
    }
}
