use std::sync::Arc;
use std::time::Duration;

use crate::config::ConvertConfig;
use crate::frame::{AsciiGrid, FrameBuffer};

/// Frame décodée plus sa durée d'affichage.
#[derive(Clone, Debug)]
pub struct SourceFrame {
    /// Pixels RGBA (partagés, le décodeur peut en garder une référence).
    pub buffer: Arc<FrameBuffer>,
    /// Durée d'affichage. `Duration::ZERO` pour une image fixe.
    pub delay: Duration,
}

/// Fournit des frames visuelles au pipeline.
///
/// Implémenté par : `ImageSource`, `GifSource`, `VideoSource`.
///
/// # Example
/// ```
/// use px_core::traits::{Source, SourceFrame};
///
/// struct Empty;
/// impl Source for Empty {
///     fn next_frame(&mut self) -> Option<SourceFrame> { None }
///     fn native_size(&self) -> (u32, u32) { (0, 0) }
/// }
/// assert!(!Empty.is_animated());
/// ```
pub trait Source: Send {
    /// Retourne la prochaine frame, `None` quand la source est épuisée.
    fn next_frame(&mut self) -> Option<SourceFrame>;

    /// Dimensions natives de la source (avant resize).
    fn native_size(&self) -> (u32, u32);

    /// Nombre total de frames, si connu à l'avance.
    fn frame_count(&self) -> Option<usize> {
        None
    }

    /// `true` pour les sources à plus d'une frame.
    fn is_animated(&self) -> bool {
        self.frame_count().is_some_and(|n| n > 1)
    }
}

/// Transforme une frame pixel en une grille de cellules ASCII.
///
/// # Example
/// ```
/// use px_core::traits::Processor;
/// use px_core::frame::{FrameBuffer, AsciiGrid};
/// use px_core::config::ConvertConfig;
///
/// struct Blank;
/// impl Processor for Blank {
///     fn process(&self, _input: &FrameBuffer, _config: &ConvertConfig, output: &mut AsciiGrid) {
///         output.cells.fill(Default::default());
///     }
///     fn name(&self) -> &'static str { "blank" }
/// }
/// ```
pub trait Processor: Send + Sync {
    /// Traite une frame et écrit le résultat dans `output`.
    ///
    /// `output` est pré-alloué : ses dimensions fixent la taille de la grille.
    fn process(&self, input: &FrameBuffer, config: &ConvertConfig, output: &mut AsciiGrid);

    /// Nom lisible pour les logs.
    fn name(&self) -> &'static str;
}
