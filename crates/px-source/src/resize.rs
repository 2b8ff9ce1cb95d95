use anyhow::{Context, Result};
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer as FirResizer};
use px_core::error::CoreError;
use px_core::frame::FrameBuffer;

/// Taille de grille (colonnes, lignes) pour une source `src_w × src_h`.
///
/// `rows = floor(width × src_h / src_w × aspect)`, jamais 0.
///
/// # Errors
/// [`CoreError::InvalidDimensions`] si la source est vide.
///
/// # Example
/// ```
/// use px_source::resize::grid_size;
/// assert_eq!(grid_size(200, 100, 100, 0.5).unwrap(), (100, 25));
/// assert_eq!(grid_size(1000, 1, 10, 0.5).unwrap(), (10, 1));
/// ```
pub fn grid_size(src_w: u32, src_h: u32, width: u32, aspect: f32) -> Result<(u16, u16), CoreError> {
    if src_w == 0 || src_h == 0 || width == 0 {
        return Err(CoreError::InvalidDimensions {
            width: src_w,
            height: src_h,
        });
    }
    let cols = width.min(u32::from(u16::MAX));
    let ratio = f64::from(src_h) / f64::from(src_w);
    let rows = (f64::from(cols) * ratio * f64::from(aspect)).floor();
    let rows = rows.clamp(1.0, f64::from(u16::MAX)) as u16;
    Ok((cols as u16, rows))
}

/// Resizer réutilisable wrappant fast_image_resize (Lanczos3).
///
/// # Example
/// ```
/// use px_source::resize::Resizer;
/// let r = Resizer::new();
/// ```
pub struct Resizer {
    inner: FirResizer,
    options: ResizeOptions,
    /// Copie de la source (l'API exige `&mut` sur le buffer source).
    src_buf: Vec<u8>,
}

impl Resizer {
    /// Create a new Lanczos3 resizer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: FirResizer::new(),
            options: ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3)),
            src_buf: Vec::new(),
        }
    }

    /// Resize `src` into `dst`. Dimensions of `dst` determine output size.
    ///
    /// # Errors
    /// Returns an error if the resize operation fails.
    ///
    /// # Example
    /// ```
    /// use px_source::resize::Resizer;
    /// use px_core::frame::FrameBuffer;
    /// let mut r = Resizer::new();
    /// let src = FrameBuffer::new(100, 100);
    /// let mut dst = FrameBuffer::new(50, 50);
    /// r.resize_into(&src, &mut dst).unwrap();
    /// ```
    pub fn resize_into(&mut self, src: &FrameBuffer, dst: &mut FrameBuffer) -> Result<()> {
        if src.width == dst.width && src.height == dst.height {
            dst.data.copy_from_slice(&src.data);
            return Ok(());
        }

        self.src_buf.clear();
        self.src_buf.extend_from_slice(&src.data);

        let src_image =
            Image::from_slice_u8(src.width, src.height, &mut self.src_buf, PixelType::U8x4)
                .context("Invalid source dimensions")?;

        let mut dst_image =
            Image::from_slice_u8(dst.width, dst.height, &mut dst.data, PixelType::U8x4)
                .context("Invalid destination dimensions")?;

        self.inner
            .resize(&src_image, &mut dst_image, Some(&self.options))
            .context("Resize failed")?;

        Ok(())
    }

    /// Resize to one pixel per grid cell.
    ///
    /// # Errors
    /// Returns an error if the resize operation fails.
    pub fn resize_to(&mut self, src: &FrameBuffer, width: u32, height: u32) -> Result<FrameBuffer> {
        let mut dst = FrameBuffer::new(width, height);
        self.resize_into(src, &mut dst)?;
        Ok(dst)
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience for one-shot usage.
///
/// # Errors
/// Returns an error if the resize operation fails.
///
/// # Example
/// ```
/// use px_source::resize::resize_frame;
/// use px_core::frame::FrameBuffer;
/// let src = FrameBuffer::new(100, 100);
/// let dst = resize_frame(&src, 50, 50).unwrap();
/// assert_eq!(dst.width, 50);
/// ```
pub fn resize_frame(src: &FrameBuffer, width: u32, height: u32) -> Result<FrameBuffer> {
    Resizer::new().resize_to(src, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_height_follows_aspect_correction() {
        // 100 × (300/400) × 0.5 = 37.5 → 37
        assert_eq!(grid_size(400, 300, 100, 0.5).unwrap(), (100, 37));
        assert_eq!(grid_size(400, 300, 100, 1.0).unwrap(), (100, 75));
    }

    #[test]
    fn grid_height_is_never_zero() {
        assert_eq!(grid_size(5000, 10, 20, 0.5).unwrap().1, 1);
    }

    #[test]
    fn empty_source_is_rejected() {
        assert!(matches!(
            grid_size(0, 10, 20, 0.5),
            Err(CoreError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn uniform_color_survives_downscale() {
        let src = FrameBuffer::filled(64, 48, (120, 60, 30));
        let dst = resize_frame(&src, 10, 5).unwrap();
        assert_eq!((dst.width, dst.height), (10, 5));
        let (r, g, b, a) = dst.pixel(4, 2);
        assert!(r.abs_diff(120) <= 1 && g.abs_diff(60) <= 1 && b.abs_diff(30) <= 1);
        assert_eq!(a, 255);
    }

    #[test]
    fn same_size_is_a_copy() {
        let src = FrameBuffer::filled(3, 3, (1, 2, 3));
        let dst = resize_frame(&src, 3, 3).unwrap();
        assert_eq!(dst.data, src.data);
    }
}
