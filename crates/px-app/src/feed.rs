//! Lecture vidéo en flux : chaque frame est convertie quand le lecteur la
//! demande, et seule une fenêtre de frames source reste en mémoire pour le
//! rechargement de configuration.

use std::collections::VecDeque;

use anyhow::Result;
use px_ascii::Converter;
use px_core::config::ConvertConfig;
use px_core::frame::AsciiFrame;
use px_core::traits::{Source, SourceFrame};
use px_render::player::{FrameFeed, MAX_RETAINED_FRAMES, Reload};
use px_source::resize::Resizer;

use crate::app::reconvert;

/// Flux de frames ASCII tiré d'une [`Source`].
///
/// `reopen` relance la source depuis le début (boucle au-delà de la fenêtre),
/// `configs` livre les configurations rechargées.
pub struct SourceFeed<O, C> {
    source: Box<dyn Source>,
    reopen: O,
    configs: C,
    converter: Converter,
    resizer: Resizer,
    grid: (u16, u16),
    next_index: usize,
    retained: VecDeque<SourceFrame>,
}

impl<O, C> SourceFeed<O, C>
where
    O: FnMut(&ConvertConfig) -> Result<Box<dyn Source>>,
    C: FnMut() -> Option<ConvertConfig>,
{
    /// # Errors
    /// [`px_core::error::CoreError::InvalidDimensions`] pour une source vide.
    pub fn new(source: Box<dyn Source>, converter: Converter, reopen: O, configs: C) -> Result<Self> {
        let grid = converter.grid_for(source.native_size())?;
        Ok(Self {
            source,
            reopen,
            configs,
            converter,
            resizer: Resizer::new(),
            grid,
            next_index: 0,
            retained: VecDeque::new(),
        })
    }

    /// Frames source gardées pour une reconversion.
    #[must_use]
    pub fn retained(&self) -> usize {
        self.retained.len()
    }
}

impl<O, C> FrameFeed for SourceFeed<O, C>
where
    O: FnMut(&ConvertConfig) -> Result<Box<dyn Source>>,
    C: FnMut() -> Option<ConvertConfig>,
{
    fn next_frame(&mut self) -> Option<AsciiFrame> {
        let frame = self.source.next_frame()?;
        let grid = match self.converter.convert_frame_to(&mut self.resizer, &frame.buffer, self.grid) {
            Ok(grid) => grid,
            Err(e) => {
                log::warn!("Frame {} non convertie : {e:#}", self.next_index);
                return None;
            }
        };

        if self.retained.len() == MAX_RETAINED_FRAMES {
            self.retained.pop_front();
        }
        let converted = AsciiFrame {
            index: self.next_index,
            grid,
            delay: frame.delay,
        };
        self.retained.push_back(frame);
        self.next_index += 1;
        Some(converted)
    }

    fn rewind(&mut self) -> bool {
        let source = match (self.reopen)(self.converter.config()) {
            Ok(source) => source,
            Err(e) => {
                log::warn!("Relance du flux impossible : {e:#}");
                return false;
            }
        };
        match self.converter.grid_for(source.native_size()) {
            Ok(grid) => self.grid = grid,
            Err(e) => {
                log::warn!("Relance du flux impossible : {e}");
                return false;
            }
        }
        self.source = source;
        self.retained.clear();
        self.next_index = 0;
        log::info!("Flux relancé depuis le début");
        true
    }

    fn reload(&mut self) -> Option<Reload> {
        let config = (self.configs)()?;
        let native = self.source.native_size();
        let (converter, mut reload) = reconvert(config, self.retained.make_contiguous(), native)?;
        self.grid = converter.grid_for(native).ok()?;
        self.converter = converter;

        let first = self.next_index - self.retained.len();
        for (offset, frame) in reload.frames.iter_mut().enumerate() {
            frame.index = first + offset;
        }
        Some(reload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use px_core::frame::FrameBuffer;
    use std::sync::Arc;
    use std::time::Duration;

    /// Source finie de frames unies.
    struct Solid {
        left: usize,
        size: (u32, u32),
    }

    impl Source for Solid {
        fn next_frame(&mut self) -> Option<SourceFrame> {
            if self.left == 0 {
                return None;
            }
            self.left -= 1;
            Some(SourceFrame {
                buffer: Arc::new(FrameBuffer::filled(self.size.0, self.size.1, (0, 0, 0))),
                delay: Duration::from_millis(40),
            })
        }

        fn native_size(&self) -> (u32, u32) {
            self.size
        }
    }

    fn solid(frames: usize) -> Box<dyn Source> {
        Box::new(Solid {
            left: frames,
            size: (20, 20),
        })
    }

    fn converter(width: u32) -> Converter {
        Converter::new(ConvertConfig {
            width,
            ..ConvertConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn frames_are_converted_on_demand() {
        let mut feed = SourceFeed::new(solid(3), converter(10), |_: &ConvertConfig| Ok(solid(3)), || None).unwrap();
        let first = feed.next_frame().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!((first.grid.width, first.grid.height), (10, 5));
        assert_eq!(first.delay, Duration::from_millis(40));
        assert_eq!(feed.retained(), 1);

        assert_eq!(feed.next_frame().unwrap().index, 1);
        assert_eq!(feed.next_frame().unwrap().index, 2);
        assert!(feed.next_frame().is_none());
        assert_eq!(feed.retained(), 3);
    }

    #[test]
    fn retention_is_capped() {
        let total = MAX_RETAINED_FRAMES + 5;
        let mut feed =
            SourceFeed::new(solid(total), converter(4), |_: &ConvertConfig| Ok(solid(1)), || None).unwrap();
        let mut last = 0;
        while let Some(frame) = feed.next_frame() {
            last = frame.index;
        }
        assert_eq!(last, total - 1);
        assert_eq!(feed.retained(), MAX_RETAINED_FRAMES);
    }

    #[test]
    fn rewind_restarts_numbering_with_a_fresh_source() {
        let mut reopened = 0;
        let mut feed = SourceFeed::new(
            solid(2),
            converter(6),
            |config: &ConvertConfig| {
                reopened += 1;
                assert_eq!(config.width, 6);
                Ok(solid(2))
            },
            || None,
        )
        .unwrap();
        while feed.next_frame().is_some() {}

        assert!(feed.rewind());
        assert_eq!(feed.retained(), 0);
        assert_eq!(feed.next_frame().unwrap().index, 0);
        drop(feed);
        assert_eq!(reopened, 1);
    }

    #[test]
    fn failed_reopen_reports_false() {
        let mut feed = SourceFeed::new(
            solid(1),
            converter(6),
            |_: &ConvertConfig| Err(anyhow::anyhow!("ffmpeg absent")),
            || None,
        )
        .unwrap();
        assert!(!feed.rewind());
    }

    #[test]
    fn reload_reconverts_the_window_and_later_frames() {
        let mut pending = Some(ConvertConfig {
            width: 8,
            ..ConvertConfig::default()
        });
        let mut feed =
            SourceFeed::new(solid(3), converter(4), |_: &ConvertConfig| Ok(solid(3)), || pending.take()).unwrap();
        feed.next_frame();
        feed.next_frame();

        let reload = feed.reload().unwrap();
        assert_eq!(reload.frames.len(), 2);
        assert_eq!(reload.frames[1].index, 1);
        assert!(reload.frames.iter().all(|f| f.grid.width == 8));
        assert_eq!(feed.next_frame().unwrap().grid.width, 8);
        assert!(feed.reload().is_none());
    }

    #[test]
    fn invalid_reload_keeps_current_converter() {
        let mut pending = Some(ConvertConfig {
            charset: "nope".into(),
            ..ConvertConfig::default()
        });
        let mut feed =
            SourceFeed::new(solid(2), converter(4), |_: &ConvertConfig| Ok(solid(2)), || pending.take()).unwrap();
        feed.next_frame();
        assert!(feed.reload().is_none());
        assert_eq!(feed.next_frame().unwrap().grid.width, 4);
    }
}
