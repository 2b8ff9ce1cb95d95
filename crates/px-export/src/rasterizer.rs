use std::collections::HashMap;

use ab_glyph::{Font, FontVec, PxScale, point};
use anyhow::Context;
use px_core::config::ConvertConfig;
use px_core::frame::{AsciiGrid, FrameBuffer};
use rayon::prelude::*;

/// Couleurs du rendu bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderStyle {
    /// Couleur de fond de l'image entière.
    pub background: [u8; 3],
    /// Couleur des glyphes si `use_cell_color` est faux.
    pub foreground: [u8; 3],
    /// Utiliser la couleur source de chaque cellule.
    pub use_cell_color: bool,
}

impl RenderStyle {
    /// Style tiré de la configuration.
    ///
    /// # Example
    /// ```
    /// use px_core::config::ConvertConfig;
    /// use px_export::RenderStyle;
    /// let style = RenderStyle::from_config(&ConvertConfig::default());
    /// assert_eq!(style.background, [0, 0, 0]);
    /// assert!(!style.use_cell_color);
    /// ```
    #[must_use]
    pub fn from_config(config: &ConvertConfig) -> Self {
        Self {
            background: config.background,
            foreground: config.foreground,
            use_cell_color: config.color_enabled,
        }
    }
}

/// Convertit une AsciiGrid en pixels RGBA.
/// Atlas de glyphes pré-calculé : aucun appel à la police pendant le rendu.
pub struct Rasterizer {
    font: FontVec,
    scale: PxScale,
    char_width: u32,
    char_height: u32,
    /// Alpha de chaque glyphe (char_width * char_height).
    glyph_cache: HashMap<char, Vec<u8>>,
    /// Glyphe vide pour les caractères absents de la police.
    empty_glyph: Vec<u8>,
}

impl Rasterizer {
    /// Charge la police et pré-calcule l'ASCII imprimable, Latin-1 et les blocs.
    ///
    /// Cellule = avance horizontale de `M` × hauteur de ligne.
    ///
    /// # Errors
    /// Retourne une erreur si la police fournie est invalide.
    pub fn new(font_data: Vec<u8>, scale_px: f32) -> anyhow::Result<Self> {
        let font = FontVec::try_from_vec(font_data).context("Police invalide (TTF/OTF attendu)")?;
        let scale = PxScale::from(scale_px);

        let v_advance = font.ascent_unscaled() - font.descent_unscaled() + font.line_gap_unscaled();
        let height = (v_advance * scale.y / font.height_unscaled()).ceil() as u32;

        let m_glyph = font.glyph_id('M');
        let h_advance = font.h_advance_unscaled(m_glyph);
        let width = (h_advance * scale.x / font.height_unscaled()).ceil() as u32;

        let char_width = width.max(1);
        let char_height = height.max(1);

        let mut rasterizer = Self {
            font,
            scale,
            char_width,
            char_height,
            glyph_cache: HashMap::new(),
            empty_glyph: vec![0u8; (char_width * char_height) as usize],
        };

        rasterizer.cache_chars((32..=126).filter_map(char::from_u32));
        rasterizer.cache_chars((0x00A0..=0x00FF).filter_map(char::from_u32));
        // Block Elements (█▓▒░)
        rasterizer.cache_chars((0x2580..=0x259F).filter_map(char::from_u32));

        log::debug!(
            "Rasterizer: cellule {}x{} px, {} glyphes",
            rasterizer.char_width,
            rasterizer.char_height,
            rasterizer.glyph_cache.len()
        );
        Ok(rasterizer)
    }

    /// Ajoute à l'atlas les caractères d'un charset libre.
    #[must_use]
    pub fn with_charset(mut self, charset: &str) -> Self {
        self.cache_chars(charset.chars());
        self
    }

    fn cache_chars(&mut self, chars: impl IntoIterator<Item = char>) {
        let ascent_px = self.font.ascent_unscaled() * self.scale.y / self.font.height_unscaled();
        for ch in chars {
            if self.glyph_cache.contains_key(&ch) {
                continue;
            }
            // glyph_id 0 = .notdef : pas de boîte "?" dans le rendu
            let gid = self.font.glyph_id(ch);
            if gid.0 == 0 {
                continue;
            }

            let mut buffer = vec![0u8; (self.char_width * self.char_height) as usize];
            let glyph = gid.with_scale_and_position(self.scale, point(0.0, ascent_px));

            if let Some(outline) = self.font.outline_glyph(glyph) {
                let bounds = outline.px_bounds();
                let (cw, chh) = (self.char_width, self.char_height);
                #[allow(clippy::cast_possible_wrap)]
                outline.draw(|x, y, v| {
                    let px = (x as i32 + bounds.min.x as i32).max(0) as u32;
                    let py = (y as i32 + bounds.min.y as i32).max(0) as u32;
                    if px < cw && py < chh {
                        let idx = (py * cw + px) as usize;
                        buffer[idx] = buffer[idx].max((v * 255.0).round() as u8);
                    }
                });
            }
            self.glyph_cache.insert(ch, buffer);
        }
    }

    /// Taille d'une cellule en pixels (largeur, hauteur).
    #[must_use]
    pub fn cell_size(&self) -> (u32, u32) {
        (self.char_width, self.char_height)
    }

    /// Le caractère a-t-il un glyphe dans l'atlas ?
    #[must_use]
    pub fn has_glyph(&self, ch: char) -> bool {
        self.glyph_cache.contains_key(&ch)
    }

    /// Dimensions du FrameBuffer pour une grille donnée.
    #[must_use]
    pub fn target_dimensions(&self, grid_w: u16, grid_h: u16) -> (u32, u32) {
        (
            u32::from(grid_w) * self.char_width,
            u32::from(grid_h) * self.char_height,
        )
    }

    /// Rend la grille dans un buffer neuf.
    #[must_use]
    pub fn render_grid(&self, grid: &AsciiGrid, style: RenderStyle) -> FrameBuffer {
        let (w, h) = self.target_dimensions(grid.width, grid.height);
        let mut fb = FrameBuffer::new(w, h);
        self.render(grid, style, &mut fb);
        fb
    }

    /// Rendu de la grille sur `fb`, parallélisé par rangée de texte.
    ///
    /// `fb` doit mesurer exactement [`Self::target_dimensions`], sinon rien n'est écrit.
    pub fn render(&self, grid: &AsciiGrid, style: RenderStyle, fb: &mut FrameBuffer) {
        let (expected_w, expected_h) = self.target_dimensions(grid.width, grid.height);
        if fb.width != expected_w || fb.height != expected_h {
            log::error!(
                "Rasterizer dimension mismatch: fb={}x{} expected={}x{}",
                fb.width,
                fb.height,
                expected_w,
                expected_h
            );
            return;
        }
        if fb.data.is_empty() {
            return;
        }

        let empty_glyph = &self.empty_glyph;
        let cw = self.char_width as usize;
        let stride = expected_w as usize * 4;
        let band_size = stride * self.char_height as usize;
        let bg = style.background.map(f32::from);

        let cols = usize::from(grid.width);

        fb.data
            .par_chunks_exact_mut(band_size)
            .enumerate()
            .for_each(|(gy, band)| {
                let row = &grid.cells[gy * cols..(gy + 1) * cols];
                for (gx, cell) in row.iter().enumerate() {
                    let alpha_map = self.glyph_cache.get(&cell.ch).unwrap_or(empty_glyph);
                    let fg = if style.use_cell_color {
                        [cell.fg.0, cell.fg.1, cell.fg.2]
                    } else {
                        style.foreground
                    }
                    .map(f32::from);

                    let cx_start = gx * cw;
                    for (cy, alpha_row) in alpha_map.chunks_exact(cw).enumerate() {
                        let row_offset = cy * stride;
                        for (cx, &alpha) in alpha_row.iter().enumerate() {
                            let a = f32::from(alpha) / 255.0;
                            let px_idx = row_offset + (cx_start + cx) * 4;
                            let px = &mut band[px_idx..px_idx + 4];
                            for ((dst, f), b) in px.iter_mut().zip(fg).zip(bg) {
                                *dst = (f * a + b * (1.0 - a)).round() as u8;
                            }
                            px[3] = 255;
                        }
                    }
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::tests::system_font;
    use px_core::frame::AsciiCell;

    const STYLE: RenderStyle = RenderStyle {
        background: [0, 0, 0],
        foreground: [255, 255, 255],
        use_cell_color: false,
    };

    #[test]
    fn invalid_font_is_rejected() {
        assert!(Rasterizer::new(vec![0, 1, 2, 3], 14.0).is_err());
    }

    #[test]
    fn blank_grid_renders_background_only() {
        let Some(font) = system_font() else { return };
        let raster = Rasterizer::new(font, 12.0).unwrap();
        let style = RenderStyle {
            background: [10, 20, 30],
            ..STYLE
        };
        let fb = raster.render_grid(&AsciiGrid::new(3, 2), style);
        let (cw, ch) = raster.cell_size();
        assert_eq!((fb.width, fb.height), (3 * cw, 2 * ch));
        assert!(fb.data.chunks_exact(4).all(|p| p == [10, 20, 30, 255]));
    }

    #[test]
    fn dense_glyph_uses_cell_color_when_enabled() {
        let Some(font) = system_font() else { return };
        let raster = Rasterizer::new(font, 16.0).unwrap();
        let mut grid = AsciiGrid::new(1, 1);
        grid.set(0, 0, AsciiCell { ch: '@', fg: (255, 0, 0) });

        let colored = raster.render_grid(&grid, RenderStyle { use_cell_color: true, ..STYLE });
        assert!(colored.data.chunks_exact(4).any(|p| p[0] > 128 && p[1] == 0 && p[2] == 0));

        let mono = raster.render_grid(&grid, STYLE);
        assert!(mono.data.chunks_exact(4).any(|p| p[0] > 128 && p[0] == p[1] && p[1] == p[2]));
    }

    #[test]
    fn mismatched_buffer_is_left_untouched() {
        let Some(font) = system_font() else { return };
        let raster = Rasterizer::new(font, 12.0).unwrap();
        let mut fb = FrameBuffer::new(1, 1);
        raster.render(&AsciiGrid::new(2, 2), STYLE, &mut fb);
        assert_eq!(fb.data, vec![0, 0, 0, 0]);
    }

    #[test]
    fn custom_charset_glyphs_are_cached() {
        let Some(font) = system_font() else { return };
        let raster = Rasterizer::new(font, 12.0).unwrap().with_charset("#@");
        assert!(raster.has_glyph('@'));
        assert!(raster.has_glyph('#'));
    }
}
