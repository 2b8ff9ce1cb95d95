//! Orchestration : détection du média, conversion, puis sortie choisie
//! (stdout, fichiers texte, image, GIF, MP4 ou lecture terminal).

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use px_ascii::Converter;
use px_core::config::ConvertConfig;
use px_core::frame::{AsciiFrame, AsciiGrid};
use px_core::traits::{Source, SourceFrame};
use px_export::gif_out::save_animated_gif;
use px_export::image_out::save_png;
use px_export::paths::{ensure_gif_extension, frame_base};
use px_export::text::{save_frames, save_text};
use px_export::{Rasterizer, RenderStyle};
use px_render::ansi::grid_to_ansi;
use px_render::player::{PlaybackOptions, Player, Reload};
use px_source::gif::GifSource;
use px_source::media::MediaKind;
use rayon::prelude::*;

use crate::cli::Cli;
use crate::hotreload::{ConfigTracker, spawn_config_watcher};
use crate::settings::{Overrides, auto_width, config_path, load_file_config};

/// Sortie par défaut de `--render-image` pour une image fixe.
pub const DEFAULT_PNG: &str = "ascii_output.png";
/// Sortie par défaut de `--render-image` pour un GIF animé.
pub const DEFAULT_GIF: &str = "ascii_output.gif";
/// Sortie par défaut de `--render-image` pour une vidéo.
#[cfg(feature = "video")]
pub const DEFAULT_MP4: &str = "ascii_output.mp4";

const SEPARATOR_WIDTH: usize = 50;

/// Messages d'état sur stdout, muets avec `--quiet`.
#[derive(Clone, Copy)]
struct Status {
    quiet: bool,
}

impl Status {
    fn say(self, msg: impl Display) {
        if !self.quiet {
            println!("{msg}");
        }
    }

    fn separator(self) {
        self.say("-".repeat(SEPARATOR_WIDTH));
    }
}

/// Point d'entrée de l'application.
///
/// # Errors
/// Retourne la première erreur rencontrée (fichier absent, format, écriture...).
pub fn run(cli: &Cli) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config_path = config_path(cli.config.as_deref(), &cwd)?;
    let file_config = load_file_config(config_path.as_deref())?;
    let status = Status { quiet: cli.quiet };

    let kind = MediaKind::detect(&cli.input)?;
    log::info!("{}: {kind:?}", cli.input.display());

    let mut overrides = Overrides::from_cli(cli);
    if cli.render_image && overrides.width.is_none() {
        match source_pixel_width(&cli.input, kind) {
            Some(px) => {
                let width = auto_width(px);
                status.say(format!("Auto-detected width from image: {px}px → {width} characters"));
                overrides.width = Some(width);
            }
            None => log::warn!("Largeur auto indisponible, largeur par défaut."),
        }
    }

    let mut config = file_config.clone();
    overrides.apply(&mut config);
    let converter = Converter::new(config.clone())?;

    status.say(format!("Converting {}...", cli.input.display()));
    status.say(format!(
        "Width: {} characters, Character set: {}",
        config.width,
        config.charset_label()
    ));

    let session = Session {
        cli,
        config,
        converter,
        overrides,
        config_path,
        file_config,
        status,
    };

    match kind {
        MediaKind::Image => session.run_image(),
        MediaKind::AnimatedGif => session.run_gif(),
        MediaKind::Video => session.run_video(),
    }
}

/// Largeur en pixels de la source, pour l'auto-détection.
fn source_pixel_width(path: &Path, kind: MediaKind) -> Option<u32> {
    match kind {
        MediaKind::Image | MediaKind::AnimatedGif => px_source::image::image_size(path).ok().map(|(w, _)| w),
        #[cfg(feature = "video")]
        MediaKind::Video => px_source::video::probe_video(path).ok().map(|info| info.width),
        #[cfg(not(feature = "video"))]
        MediaKind::Video => None,
    }
}

struct Session<'a> {
    cli: &'a Cli,
    config: ConvertConfig,
    converter: Converter,
    overrides: Overrides,
    config_path: Option<PathBuf>,
    file_config: ConvertConfig,
    status: Status,
}

impl Session<'_> {
    fn color(&self) -> Option<px_core::config::ColorMode> {
        self.config.color_enabled.then_some(self.config.color_mode)
    }

    fn style(&self) -> RenderStyle {
        RenderStyle::from_config(&self.config)
    }

    fn rasterizer(&self) -> Result<Rasterizer> {
        let font = px_export::font::load_font(self.config.font_path.as_deref())?;
        Ok(Rasterizer::new(font, self.config.font_size)?.with_charset(self.converter.charset()))
    }

    /// Texte pour stdout, ANSI si la couleur est active.
    fn terminal_text(&self, grid: &AsciiGrid) -> String {
        grid_to_ansi(grid, self.color())
    }

    fn print_art(&self, grid: &AsciiGrid) {
        if self.status.quiet {
            println!("{}", self.terminal_text(grid));
        } else {
            println!("\n{}", self.terminal_text(grid));
        }
    }

    fn run_image(&self) -> Result<()> {
        self.status.separator();
        let art = self.converter.convert_image(&self.cli.input)?;

        if self.cli.render_image {
            let out = self
                .cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PNG));
            let fb = self.rasterizer()?.render_grid(&art.grid, self.style());
            save_png(&fb, &out)?;
            self.status.say(format!(
                "\nASCII art rendered as image: {} (width: {} chars)",
                out.display(),
                self.config.width
            ));
        } else if let Some(out) = &self.cli.output {
            save_text(out, &art.text())?;
            self.status.say(format!("\nASCII art saved to: {}", out.display()));
        } else {
            if self.cli.play {
                log::info!("--play ignoré pour une image fixe.");
            }
            self.print_art(&art.grid);
        }
        Ok(())
    }

    fn run_gif(&self) -> Result<()> {
        let gif = GifSource::new(&self.cli.input)?;
        let native = gif.native_size();
        let sources = gif.into_frames();
        self.status.say(format!("Detected animated GIF with {} frames", sources.len()));

        let frames = self.converter.convert_frames(&sources, native)?;
        self.status.say(format!("Processed {} frames", frames.len()));
        self.status.separator();

        if self.cli.render_image {
            let requested = self
                .cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GIF));
            let out = ensure_gif_extension(&requested);
            self.render_gif(&frames, &out)?;
            self.status.say(format!(
                "\nAnimated GIF rendered: {} ({} frames, width: {} chars)",
                out.display(),
                frames.len(),
                self.config.width
            ));
        } else if let Some(out) = &self.cli.output {
            save_frames(out, &frames)?;
            self.report_frames_saved(out, frames.len());
        } else if self.cli.play {
            self.play(frames, sources, native)?;
        } else {
            self.print_first_frame(&frames);
        }
        Ok(())
    }

    fn print_first_frame(&self, frames: &[AsciiFrame]) {
        let Some(first) = frames.first() else { return };
        self.print_art(&first.grid);
        if frames.len() > 1 {
            self.status.say(format!(
                "\n(Showing first frame only. GIF has {} total frames)",
                frames.len()
            ));
        }
    }

    fn report_frames_saved(&self, out: &Path, count: usize) {
        self.status.say(format!(
            "\nASCII art saved to {count} files: {}_frame_*.txt",
            frame_base(out).display()
        ));
    }

    fn render_gif(&self, frames: &[AsciiFrame], out: &Path) -> Result<()> {
        let rasterizer = self.rasterizer()?;
        let style = self.style();
        let rendered: Vec<_> = frames
            .par_iter()
            .map(|frame| (rasterizer.render_grid(&frame.grid, style), frame.delay))
            .collect();
        save_animated_gif(out, rendered)?;
        Ok(())
    }

    /// Surveille le fichier de config s'il y en a un.
    fn watch_config(&self, shared: &Arc<ArcSwap<ConvertConfig>>) -> Option<impl notify::Watcher + use<>> {
        let path = self.config_path.as_deref()?;
        match spawn_config_watcher(path, shared) {
            Ok(w) => Some(w),
            Err(e) => {
                log::warn!("Hot reload indisponible : {e}");
                None
            }
        }
    }

    /// Config rechargée, overrides CLI réappliqués.
    fn next_config(&self, tracker: &mut ConfigTracker) -> Option<ConvertConfig> {
        let file_config = tracker.poll()?;
        let mut config = (*file_config).clone();
        self.overrides.apply(&mut config);
        Some(config)
    }

    /// Lecture terminal ; recharge la config (hot reload) si un fichier est utilisé.
    fn play(&self, frames: Vec<AsciiFrame>, sources: Vec<SourceFrame>, native: (u32, u32)) -> Result<()> {
        let mut player = Player::new(playback_options(&self.config));
        let shared = Arc::new(ArcSwap::from_pointee(self.file_config.clone()));
        let _watcher = self.watch_config(&shared);
        let mut tracker = ConfigTracker::new(shared);

        let stats = player.run(frames, || {
            let config = self.next_config(&mut tracker)?;
            reconvert(config, &sources, native).map(|(_, reload)| reload)
        })?;

        log::info!("Lecture: {stats:?}");
        Ok(())
    }

    /// Lecture en flux d'une vidéo : frames converties à la volée, mémoire bornée.
    #[cfg(feature = "video")]
    fn stream_video(&self, source: Box<dyn Source>) -> Result<()> {
        use crate::feed::SourceFeed;
        use px_source::video::VideoSource;

        let mut player = Player::new(playback_options(&self.config));
        let shared = Arc::new(ArcSwap::from_pointee(self.file_config.clone()));
        let _watcher = self.watch_config(&shared);
        let mut tracker = ConfigTracker::new(shared);

        let input = &self.cli.input;
        let converter = Converter::new(self.config.clone())?;
        let mut feed = SourceFeed::new(
            source,
            converter,
            |config: &ConvertConfig| {
                let source = VideoSource::open(input, config.width, config.aspect_ratio)?;
                Ok(Box::new(source) as Box<dyn Source>)
            },
            || self.next_config(&mut tracker),
        )?;

        let stats = player.stream(&mut feed)?;
        log::info!("Lecture: {stats:?}");
        Ok(())
    }

    #[cfg(not(feature = "video"))]
    fn run_video(&self) -> Result<()> {
        let grid = (self.config.width, self.config.aspect_ratio);
        px_source::media::open_source(&self.cli.input, MediaKind::Video, grid).map(|_| ())
    }

    #[cfg(feature = "video")]
    fn run_video(&self) -> Result<()> {
        use px_export::muxer::Mp4Muxer;
        use px_export::paths::{ensure_extension, frame_path};
        use px_source::video::VideoSource;

        let mut source = VideoSource::open(&self.cli.input, self.config.width, self.config.aspect_ratio)?;
        let info = source.info();
        self.status.say(format!(
            "Detected video: {}x{} @ {:.2} fps",
            info.width, info.height, info.fps
        ));
        self.status.separator();

        if self.cli.render_image {
            let requested = self
                .cli
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MP4));
            let out = ensure_extension(&requested, "mp4");
            let rasterizer = self.rasterizer()?;
            let style = self.style();
            let fps = self
                .config
                .playback_fps
                .map_or(info.fps.clamp(1.0, 60.0), f64::from);

            let mut muxer: Option<Mp4Muxer> = None;
            let count = self.converter.for_each_frame(&mut source, |frame| {
                let fb = rasterizer.render_grid(&frame.grid, style);
                if muxer.is_none() {
                    muxer = Some(Mp4Muxer::new(&out, fb.width, fb.height, fps)?);
                }
                if let Some(m) = muxer.as_mut() {
                    m.write_frame(&fb)?;
                }
                Ok(())
            })?;
            let Some(muxer) = muxer else {
                anyhow::bail!("Aucune frame décodée dans {}", self.cli.input.display());
            };
            muxer.finish()?;
            self.status.say(format!(
                "\nVideo rendered: {} ({count} frames, width: {} chars)",
                out.display(),
                self.config.width
            ));
        } else if let Some(out) = &self.cli.output {
            let base = frame_base(out);
            let count = self.converter.for_each_frame(&mut source, |frame| {
                save_text(&frame_path(&base, frame.index), &frame.text())
            })?;
            self.report_frames_saved(out, count);
        } else {
            self.stream_video(Box::new(source))?;
        }
        Ok(())
    }
}

fn playback_options(config: &ConvertConfig) -> PlaybackOptions {
    PlaybackOptions {
        color: config.color_enabled.then_some(config.color_mode),
        loop_playback: config.loop_playback,
        fps: config.playback_fps,
    }
}

/// Reconvertit les frames source avec une nouvelle config ; `None` si elle est invalide.
///
/// Rend aussi le convertisseur, réutilisé pour les frames suivantes d'un flux.
pub(crate) fn reconvert(
    config: ConvertConfig,
    sources: &[SourceFrame],
    native: (u32, u32),
) -> Option<(Converter, Reload)> {
    let options = playback_options(&config);
    let converter = match Converter::new(config) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Config rechargée invalide : {e}");
            return None;
        }
    };
    match converter.convert_frames(sources, native) {
        Ok(frames) => Some((converter, Reload { frames, options })),
        Err(e) => {
            log::warn!("Reconversion impossible : {e:#}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame, Rgba, RgbaImage};
    use std::time::Duration;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("pixscii").chain(args.iter().copied())).unwrap()
    }

    fn write_png(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(w, h, Rgba([0, 0, 0, 255])).save(&path).unwrap();
        path
    }

    fn write_gif(dir: &Path, name: &str, frames: usize) -> PathBuf {
        let path = dir.join(name);
        let mut encoder = GifEncoder::new(std::fs::File::create(&path).unwrap());
        for i in 0..frames {
            let gray = if i % 2 == 0 { 0 } else { 255 };
            let buffer = RgbaImage::from_pixel(16, 16, Rgba([gray, gray, gray, 255]));
            encoder
                .encode_frame(Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(40, 1)))
                .unwrap();
        }
        path
    }

    #[test]
    fn still_image_to_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_png(dir.path(), "black.png", 40, 20);
        let out = dir.path().join("art.txt");
        run(&cli(&[
            input.to_str().unwrap(),
            "-w",
            "10",
            "-o",
            out.to_str().unwrap(),
            "--quiet",
        ]))
        .unwrap();

        let text = std::fs::read_to_string(&out).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().all(|l| l == "@@@@@@@@@@"));
    }

    #[test]
    fn animated_gif_to_numbered_text_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_gif(dir.path(), "anim.gif", 3);
        let out = dir.path().join("frames.txt");
        run(&cli(&[
            input.to_str().unwrap(),
            "-w",
            "8",
            "-o",
            out.to_str().unwrap(),
            "-q",
        ]))
        .unwrap();

        for i in 0..3 {
            assert!(dir.path().join(format!("frames_frame_{i:04}.txt")).is_file());
        }
        assert!(!dir.path().join("frames_frame_0003.txt").exists());
        let first = std::fs::read_to_string(dir.path().join("frames_frame_0000.txt")).unwrap();
        assert!(first.starts_with("@@@@@@@@"));
    }

    #[test]
    fn missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("ghost.png");
        let err = run(&cli(&[missing.to_str().unwrap(), "-q"])).unwrap_err();
        assert!(err.to_string().contains("ghost.png"));
    }

    #[test]
    fn unknown_charset_in_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_png(dir.path(), "a.png", 4, 4);
        let config = dir.path().join("c.toml");
        std::fs::write(&config, "[convert]\ncharset = \"fancy\"\n").unwrap();
        let err = run(&cli(&[
            input.to_str().unwrap(),
            "-c",
            config.to_str().unwrap(),
            "-q",
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("Unknown character set 'fancy'"));
    }

    #[test]
    fn reconvert_applies_new_width() {
        let sources = vec![SourceFrame {
            buffer: Arc::new(px_core::frame::FrameBuffer::filled(20, 20, (0, 0, 0))),
            delay: Duration::from_millis(40),
        }];
        let (converter, reload) = reconvert(
            ConvertConfig {
                width: 6,
                loop_playback: false,
                ..ConvertConfig::default()
            },
            &sources,
            (20, 20),
        )
        .unwrap();
        assert_eq!(reload.frames[0].grid.width, 6);
        assert!(!reload.options.loop_playback);
        assert_eq!(converter.config().width, 6);
    }

    #[test]
    fn reconvert_rejects_invalid_charset() {
        let config = ConvertConfig {
            charset: "nope".into(),
            ..ConvertConfig::default()
        };
        assert!(reconvert(config, &[], (1, 1)).is_none());
    }

    #[test]
    fn render_image_writes_png_when_a_font_is_available() {
        if px_export::font::resolve_font(None).is_err() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let input = write_png(dir.path(), "a.png", 50, 50);
        let out = dir.path().join("render.png");
        run(&cli(&[
            input.to_str().unwrap(),
            "--render-image",
            "-o",
            out.to_str().unwrap(),
            "-q",
        ]))
        .unwrap();
        assert!(image::open(&out).is_ok());
    }
}
