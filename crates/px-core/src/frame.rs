use std::time::Duration;

/// Buffer de pixels RGBA. Pré-alloué, réutilisé entre frames.
///
/// Stocke les pixels en RGBA row-major, 4 bytes par pixel.
///
/// # Example
/// ```
/// use px_core::frame::FrameBuffer;
/// let fb = FrameBuffer::new(10, 10);
/// assert_eq!(fb.data.len(), 400);
/// ```
#[derive(Clone, Debug)]
pub struct FrameBuffer {
    /// Pixels RGBA, row-major, 4 bytes par pixel.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameBuffer {
    /// Crée un buffer noir transparent aux dimensions données.
    ///
    /// # Example
    /// ```
    /// use px_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::new(100, 50);
    /// assert_eq!(fb.data.len(), 100 * 50 * 4);
    /// ```
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 4],
            width,
            height,
        }
    }

    /// Wrap an existing RGBA buffer.
    ///
    /// Returns `None` if `data.len() != width * height * 4`.
    ///
    /// # Example
    /// ```
    /// use px_core::frame::FrameBuffer;
    /// assert!(FrameBuffer::from_rgba(1, 1, vec![1, 2, 3, 4]).is_some());
    /// assert!(FrameBuffer::from_rgba(2, 1, vec![1, 2, 3, 4]).is_none());
    /// ```
    #[must_use]
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        (data.len() == width as usize * height as usize * 4).then_some(Self {
            data,
            width,
            height,
        })
    }

    /// Buffer rempli d'une couleur opaque unique.
    ///
    /// # Example
    /// ```
    /// use px_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(2, 2, (255, 0, 0));
    /// assert_eq!(fb.pixel(1, 1), (255, 0, 0, 255));
    /// ```
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: (u8, u8, u8)) -> Self {
        let mut fb = Self::new(width, height);
        for px in fb.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[rgb.0, rgb.1, rgb.2, 255]);
        }
        fb
    }

    /// Accès au pixel (x, y) → (r, g, b, a). Hors limites → transparent.
    #[inline(always)]
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> (u8, u8, u8, u8) {
        if x >= self.width || y >= self.height {
            return (0, 0, 0, 0);
        }
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        (
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        )
    }

    /// Luma ITU-R BT.601 (`299 R + 587 G + 114 B`), alpha ignoré.
    ///
    /// # Example
    /// ```
    /// use px_core::frame::FrameBuffer;
    /// let fb = FrameBuffer::filled(1, 1, (255, 255, 255));
    /// assert_eq!(fb.luminance(0, 0), 255);
    /// ```
    #[inline(always)]
    #[must_use]
    pub fn luminance(&self, x: u32, y: u32) -> u8 {
        let (r, g, b, _) = self.pixel(x, y);
        ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000) as u8
    }
}

/// Single cell in the ASCII grid.
///
/// # Example
/// ```
/// use px_core::frame::AsciiCell;
/// let cell = AsciiCell::default();
/// assert_eq!(cell.ch, ' ');
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AsciiCell {
    /// Caractère à afficher.
    pub ch: char,
    /// Couleur foreground (RGB), issue du pixel source.
    pub fg: (u8, u8, u8),
}

impl Default for AsciiCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: (255, 255, 255),
        }
    }
}

/// Grille de sortie ASCII, row-major.
///
/// # Example
/// ```
/// use px_core::frame::{AsciiGrid, AsciiCell};
/// let mut grid = AsciiGrid::new(80, 24);
/// grid.set(0, 0, AsciiCell { ch: '@', fg: (255, 0, 0) });
/// assert_eq!(grid.get(0, 0).ch, '@');
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AsciiGrid {
    /// Flat array of cells, row-major.
    pub cells: Vec<AsciiCell>,
    /// Width in characters.
    pub width: u16,
    /// Height in characters.
    pub height: u16,
}

impl AsciiGrid {
    /// Crée une grille remplie d'espaces.
    ///
    /// # Example
    /// ```
    /// use px_core::frame::AsciiGrid;
    /// let grid = AsciiGrid::new(80, 24);
    /// assert_eq!(grid.cells.len(), 80 * 24);
    /// ```
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            cells: vec![AsciiCell::default(); width as usize * height as usize],
            width,
            height,
        }
    }

    /// Set a cell at position (x, y).
    #[inline(always)]
    pub fn set(&mut self, x: u16, y: u16, cell: AsciiCell) {
        self.cells[y as usize * self.width as usize + x as usize] = cell;
    }

    /// Get a cell reference at position (x, y).
    #[inline(always)]
    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> &AsciiCell {
        &self.cells[y as usize * self.width as usize + x as usize]
    }

    /// Iterate over rows as cell slices.
    pub fn rows(&self) -> impl Iterator<Item = &[AsciiCell]> {
        self.cells.chunks(usize::from(self.width).max(1))
    }

    /// Texte brut : une ligne par rangée, séparées par `\n`, sans newline final.
    ///
    /// # Example
    /// ```
    /// use px_core::frame::{AsciiGrid, AsciiCell};
    /// let mut grid = AsciiGrid::new(2, 2);
    /// grid.set(0, 0, AsciiCell { ch: '#', fg: (0, 0, 0) });
    /// assert_eq!(grid.to_text(), "# \n  ");
    /// ```
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::with_capacity(self.cells.len() + usize::from(self.height));
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.extend(row.iter().map(|c| c.ch));
        }
        out
    }
}

/// Frame d'animation convertie : numéro, grille, délai d'affichage.
#[derive(Clone, Debug)]
pub struct AsciiFrame {
    /// Zero-based frame number within the animation.
    pub index: usize,
    /// Converted cells.
    pub grid: AsciiGrid,
    /// How long this frame stays on screen.
    pub delay: Duration,
}

impl AsciiFrame {
    /// Texte brut de la frame.
    #[must_use]
    pub fn text(&self) -> String {
        self.grid.to_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_matches_bt601_weights() {
        let red = FrameBuffer::filled(1, 1, (255, 0, 0));
        let green = FrameBuffer::filled(1, 1, (0, 255, 0));
        let blue = FrameBuffer::filled(1, 1, (0, 0, 255));
        assert_eq!(red.luminance(0, 0), 76);
        assert_eq!(green.luminance(0, 0), 150);
        assert_eq!(blue.luminance(0, 0), 29);
    }

    #[test]
    fn luminance_rounds_to_nearest() {
        // 114*5 = 570 millièmes → 1 ; 114*4 = 456 → 0
        assert_eq!(FrameBuffer::filled(1, 1, (0, 0, 5)).luminance(0, 0), 1);
        assert_eq!(FrameBuffer::filled(1, 1, (0, 0, 4)).luminance(0, 0), 0);
    }

    #[test]
    fn luminance_ignores_alpha() {
        let fb = FrameBuffer::from_rgba(1, 1, vec![255, 255, 255, 0]).unwrap();
        assert_eq!(fb.luminance(0, 0), 255);
    }

    #[test]
    fn out_of_bounds_pixel_is_transparent() {
        let fb = FrameBuffer::filled(2, 2, (9, 9, 9));
        assert_eq!(fb.pixel(2, 0), (0, 0, 0, 0));
    }

    #[test]
    fn to_text_has_one_line_per_row() {
        let grid = AsciiGrid::new(3, 4);
        let text = grid.to_text();
        assert_eq!(text.lines().count(), 4);
        assert!(text.lines().all(|l| l.chars().count() == 3));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn rows_split_on_width() {
        let mut grid = AsciiGrid::new(2, 3);
        grid.set(1, 2, AsciiCell { ch: 'x', fg: (1, 2, 3) });
        let rows: Vec<_> = grid.rows().collect();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][1].ch, 'x');
    }
}
