use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use px_core::color::rgb_to_ansi256;
use px_core::config::ColorMode;
use px_core::frame::AsciiGrid;

/// Couleur terminal d'une cellule selon le mode.
#[inline]
fn term_color(fg: (u8, u8, u8), mode: ColorMode) -> Color {
    match mode {
        ColorMode::Ansi256 => Color::AnsiValue(rgb_to_ansi256(fg.0, fg.1, fg.2)),
        ColorMode::Direct | ColorMode::HsvBright => Color::Rgb {
            r: fg.0,
            g: fg.1,
            b: fg.2,
        },
    }
}

/// Écrit une rangée : séquence couleur seulement quand elle change, reset en fin de ligne.
fn write_row<W: Write>(
    out: &mut W,
    row: &[px_core::frame::AsciiCell],
    color: Option<ColorMode>,
) -> io::Result<()> {
    let Some(mode) = color else {
        let line: String = row.iter().map(|c| c.ch).collect();
        return queue!(out, Print(line));
    };

    let mut current: Option<Color> = None;
    for cell in row {
        let c = term_color(cell.fg, mode);
        if current != Some(c) {
            queue!(out, SetForegroundColor(c))?;
            current = Some(c);
        }
        queue!(out, Print(cell.ch))?;
    }
    if current.is_some() {
        queue!(out, ResetColor)?;
    }
    Ok(())
}

/// Écrit la grille, rangées séparées par `\n`, sans newline final.
///
/// `color = None` donne le texte brut.
///
/// # Errors
/// Propage les erreurs I/O du writer.
pub fn write_grid<W: Write>(out: &mut W, grid: &AsciiGrid, color: Option<ColorMode>) -> io::Result<()> {
    for (i, row) in grid.rows().enumerate() {
        if i > 0 {
            queue!(out, Print('\n'))?;
        }
        write_row(out, row, color)?;
    }
    Ok(())
}

/// Écrit la grille en positionnant le curseur à chaque rangée (raw mode),
/// tronquée à `max` (colonnes, lignes).
///
/// # Errors
/// Propage les erreurs I/O du writer.
pub fn write_grid_at<W: Write>(
    out: &mut W,
    grid: &AsciiGrid,
    color: Option<ColorMode>,
    max: (u16, u16),
) -> io::Result<()> {
    let cols = usize::from(grid.width.min(max.0));
    for (y, row) in grid.rows().take(usize::from(max.1)).enumerate() {
        queue!(out, MoveTo(0, y as u16))?;
        write_row(out, &row[..cols.min(row.len())], color)?;
    }
    Ok(())
}

/// Rend la grille en chaîne, colorée ANSI si `color` est fourni.
///
/// # Example
/// ```
/// use px_core::frame::{AsciiGrid, AsciiCell};
/// use px_core::config::ColorMode;
/// use px_render::ansi::grid_to_ansi;
///
/// let mut grid = AsciiGrid::new(1, 1);
/// grid.set(0, 0, AsciiCell { ch: '#', fg: (255, 0, 0) });
/// assert_eq!(grid_to_ansi(&grid, None), "#");
/// assert!(grid_to_ansi(&grid, Some(ColorMode::Direct)).contains("\x1b[38;2;255;0;0m#"));
/// ```
#[must_use]
pub fn grid_to_ansi(grid: &AsciiGrid, color: Option<ColorMode>) -> String {
    let mut buf = Vec::with_capacity(grid.cells.len() * if color.is_some() { 20 } else { 1 });
    if let Err(e) = write_grid(&mut buf, grid, color) {
        log::warn!("grid_to_ansi: {e}");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use px_core::frame::AsciiCell;

    fn two_by_two() -> AsciiGrid {
        let mut grid = AsciiGrid::new(2, 2);
        grid.set(0, 0, AsciiCell { ch: 'a', fg: (1, 2, 3) });
        grid.set(1, 0, AsciiCell { ch: 'b', fg: (1, 2, 3) });
        grid.set(0, 1, AsciiCell { ch: 'c', fg: (9, 9, 9) });
        grid.set(1, 1, AsciiCell { ch: 'd', fg: (1, 2, 3) });
        grid
    }

    #[test]
    fn plain_output_matches_text() {
        let grid = two_by_two();
        assert_eq!(grid_to_ansi(&grid, None), grid.to_text());
    }

    #[test]
    fn color_codes_only_on_change() {
        let out = grid_to_ansi(&two_by_two(), Some(ColorMode::Direct));
        let first_line = out.lines().next().unwrap();
        assert_eq!(first_line.matches("\x1b[38;2;1;2;3m").count(), 1);
        assert!(first_line.contains("ab"));
        assert!(first_line.ends_with("\x1b[0m"));
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn ansi256_uses_palette_index() {
        let mut grid = AsciiGrid::new(1, 1);
        grid.set(0, 0, AsciiCell { ch: 'x', fg: (255, 0, 0) });
        let out = grid_to_ansi(&grid, Some(ColorMode::Ansi256));
        assert!(out.contains("\x1b[38;5;196m"), "{out:?}");
    }

    #[test]
    fn positioned_output_is_clipped() {
        let mut buf = Vec::new();
        write_grid_at(&mut buf, &two_by_two(), None, (1, 1)).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains('a'));
        assert!(!out.contains('b') && !out.contains('c'));
    }
}
