//! Lecture interactive d'une animation ASCII dans l'écran alternatif.
//!
//! Touches : `q` / `Esc` / `Ctrl-C` quittent, espace met en pause,
//! `←` / `→` avancent d'une frame pendant la pause.

use std::collections::VecDeque;
use std::io::{self, BufWriter, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::ResetColor;
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use px_core::config::ColorMode;
use px_core::frame::AsciiFrame;

use crate::ansi::write_grid_at;
use crate::pacing::FramePacer;

/// Attente max entre deux vérifications pendant la pause.
const IDLE_POLL: Duration = Duration::from_millis(50);

/// Fenêtre du FPS mesuré.
const FPS_WINDOW: usize = 30;

/// Options de lecture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackOptions {
    /// Mode couleur, `None` pour du texte brut.
    pub color: Option<ColorMode>,
    /// Reboucler à la fin.
    pub loop_playback: bool,
    /// FPS imposé, sinon délais des frames.
    pub fps: Option<u32>,
}

/// Nouvelles frames à afficher après un rechargement de configuration.
#[derive(Clone, Debug)]
pub struct Reload {
    /// Animation reconvertie, remplace celle en cours.
    pub frames: Vec<AsciiFrame>,
    /// Options de lecture issues de la nouvelle configuration.
    pub options: PlaybackOptions,
}

/// Bilan d'une lecture.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlaybackStats {
    /// Frames dessinées (redessins compris).
    pub frames_shown: usize,
    /// Retours au début de l'animation.
    pub loops: usize,
    /// Lecture interrompue par l'utilisateur.
    pub quit_by_user: bool,
    /// FPS effectif mesuré en fin de lecture.
    pub fps: f64,
}

/// Sens de déplacement dans l'animation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Frame suivante.
    Forward,
    /// Frame précédente.
    Backward,
}

/// Action associée à une touche.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    /// Quitter la lecture.
    Quit,
    /// Basculer entre pause et lecture.
    TogglePause,
    /// Avancer ou reculer d'une frame (en pause).
    Step(Direction),
}

/// Traduit une touche en action de lecture.
///
/// # Example
/// ```
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
/// use px_render::player::{control_for_key, Control};
///
/// let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
/// assert_eq!(control_for_key(&key), Some(Control::Quit));
/// ```
#[must_use]
pub fn control_for_key(key: &KeyEvent) -> Option<Control> {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Control::Quit),
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Some(Control::Quit),
        KeyCode::Char(' ') => Some(Control::TogglePause),
        KeyCode::Right => Some(Control::Step(Direction::Forward)),
        KeyCode::Left => Some(Control::Step(Direction::Backward)),
        _ => None,
    }
}

/// Index suivant dans une animation de `len` frames.
///
/// `None` en bout d'animation sans rebouclage.
///
/// # Example
/// ```
/// use px_render::player::{next_index, Direction};
/// assert_eq!(next_index(2, 3, Direction::Forward, true), Some(0));
/// assert_eq!(next_index(2, 3, Direction::Forward, false), None);
/// assert_eq!(next_index(0, 3, Direction::Backward, true), Some(2));
/// ```
#[must_use]
pub fn next_index(current: usize, len: usize, direction: Direction, wrap: bool) -> Option<usize> {
    if len == 0 {
        return None;
    }
    match direction {
        Direction::Forward if current + 1 < len => Some(current + 1),
        Direction::Backward if current > 0 => Some(current.min(len) - 1),
        Direction::Forward => wrap.then_some(0),
        Direction::Backward => wrap.then_some(len - 1),
    }
}

/// Raw mode + écran alternatif + curseur caché, restaurés au drop.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("Impossible d'activer le raw mode")?;
        let guard = Self;
        execute!(io::stdout(), EnterAlternateScreen, Hide, Clear(ClearType::All))
            .context("Impossible d'ouvrir l'écran alternatif")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = execute!(io::stdout(), ResetColor, Show, LeaveAlternateScreen) {
            log::warn!("Restauration terminal: {e}");
        }
        if let Err(e) = terminal::disable_raw_mode() {
            log::warn!("disable_raw_mode: {e}");
        }
    }
}

/// Frames retenues au plus pendant une lecture en flux.
///
/// Au-delà, les plus anciennes sont oubliées : le retour arrière est limité
/// à cette fenêtre et la boucle relance le flux via [`FrameFeed::rewind`].
pub const MAX_RETAINED_FRAMES: usize = 1800;

/// Alimentation du lecteur pendant la lecture.
pub trait FrameFeed {
    /// Frame suivante du flux, `None` une fois épuisé.
    fn next_frame(&mut self) -> Option<AsciiFrame>;

    /// Relance le flux depuis le début. `false` si impossible.
    fn rewind(&mut self) -> bool;

    /// Frames reconverties après un rechargement de configuration.
    ///
    /// Pour un flux, elles remplacent la fenêtre retenue, dans le même ordre.
    fn reload(&mut self) -> Option<Reload>;
}

/// Animation complète en mémoire : seul le rechargement passe par la closure.
struct ReloadOnly<F>(F);

impl<F: FnMut() -> Option<Reload>> FrameFeed for ReloadOnly<F> {
    fn next_frame(&mut self) -> Option<AsciiFrame> {
        None
    }

    fn rewind(&mut self) -> bool {
        false
    }

    fn reload(&mut self) -> Option<Reload> {
        (self.0)()
    }
}

/// Résultat d'un pas en avant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Advance {
    Moved,
    Looped,
    End,
}

/// Frames jouables : l'animation entière, ou une fenêtre glissante sur un flux.
struct Timeline {
    frames: VecDeque<AsciiFrame>,
    /// Frames du flux déjà oubliées avant `frames[0]`.
    dropped: usize,
    index: usize,
    streaming: bool,
    capacity: usize,
}

impl Timeline {
    fn complete(frames: Vec<AsciiFrame>) -> Self {
        let capacity = frames.len().max(1);
        Self {
            frames: frames.into(),
            dropped: 0,
            index: 0,
            streaming: false,
            capacity,
        }
    }

    fn streamed(capacity: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            dropped: 0,
            index: 0,
            streaming: true,
            capacity: capacity.max(1),
        }
    }

    fn current(&self) -> Option<&AsciiFrame> {
        self.frames.get(self.index)
    }

    /// Tire la première frame d'un flux. `false` si rien n'est jouable.
    fn prime<S: FrameFeed + ?Sized>(&mut self, feed: &mut S) -> bool {
        if self.frames.is_empty() && self.streaming {
            match feed.next_frame() {
                Some(frame) => self.push(frame),
                None => self.streaming = false,
            }
        }
        !self.frames.is_empty()
    }

    fn push(&mut self, frame: AsciiFrame) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
            self.dropped += 1;
        }
        self.frames.push_back(frame);
        self.index = self.frames.len() - 1;
    }

    fn advance<S: FrameFeed + ?Sized>(&mut self, feed: &mut S, wrap: bool) -> Advance {
        if self.index + 1 >= self.frames.len() && self.streaming {
            match feed.next_frame() {
                Some(frame) => {
                    self.push(frame);
                    return Advance::Moved;
                }
                None => self.streaming = false,
            }
        }

        if self.dropped == 0 || self.index + 1 < self.frames.len() {
            return match next_index(self.index, self.frames.len(), Direction::Forward, wrap) {
                Some(i) if i > self.index => {
                    self.index = i;
                    Advance::Moved
                }
                Some(i) => {
                    self.index = i;
                    Advance::Looped
                }
                None => Advance::End,
            };
        }

        // Début du flux oublié : on le relance.
        if wrap && feed.rewind() {
            self.frames.clear();
            self.dropped = 0;
            self.index = 0;
            self.streaming = true;
            if self.prime(feed) {
                return Advance::Looped;
            }
        }
        Advance::End
    }

    fn step_back(&mut self) -> bool {
        let wrap = !self.streaming && self.dropped == 0;
        match next_index(self.index, self.frames.len(), Direction::Backward, wrap) {
            Some(i) => {
                self.index = i;
                true
            }
            None => false,
        }
    }

    fn replace(&mut self, frames: Vec<AsciiFrame>) {
        if frames.is_empty() {
            return;
        }
        self.capacity = self.capacity.max(frames.len());
        self.frames = frames.into();
        self.index = self.index.min(self.frames.len() - 1);
    }
}

/// Lecteur terminal.
pub struct Player {
    options: PlaybackOptions,
}

impl Player {
    #[must_use]
    pub fn new(options: PlaybackOptions) -> Self {
        Self { options }
    }

    /// Options actives.
    #[must_use]
    pub fn options(&self) -> PlaybackOptions {
        self.options
    }

    /// Joue `frames` jusqu'à la fin (sans rebouclage) ou jusqu'à `q`.
    ///
    /// `poll_reload` est appelé à chaque tour de boucle ; un `Some` remplace
    /// les frames et les options en conservant la position.
    ///
    /// # Errors
    /// Retourne une erreur si le terminal ne peut pas être piloté.
    pub fn run<F>(&mut self, frames: Vec<AsciiFrame>, poll_reload: F) -> Result<PlaybackStats>
    where
        F: FnMut() -> Option<Reload>,
    {
        self.play(Timeline::complete(frames), &mut ReloadOnly(poll_reload))
    }

    /// Joue un flux : chaque frame est tirée de `feed` à son échéance.
    ///
    /// Au plus [`MAX_RETAINED_FRAMES`] frames restent en mémoire.
    ///
    /// # Errors
    /// Retourne une erreur si le terminal ne peut pas être piloté.
    pub fn stream<S: FrameFeed + ?Sized>(&mut self, feed: &mut S) -> Result<PlaybackStats> {
        self.play(Timeline::streamed(MAX_RETAINED_FRAMES), feed)
    }

    fn play<S: FrameFeed + ?Sized>(&mut self, mut timeline: Timeline, feed: &mut S) -> Result<PlaybackStats> {
        let mut stats = PlaybackStats::default();
        if !timeline.prime(feed) {
            return Ok(stats);
        }

        let _guard = TerminalGuard::enter()?;
        let mut out = BufWriter::new(io::stdout());
        let mut pacer = FramePacer::new(self.options.fps, FPS_WINDOW);
        let mut paused = false;
        let mut pending = true;

        loop {
            if let Some(reload) = feed.reload()
                && !reload.frames.is_empty()
            {
                log::info!("Lecture: {} frames rechargées", reload.frames.len());
                timeline.replace(reload.frames);
                self.options = reload.options;
                pacer.set_fps_override(self.options.fps);
                queue!(out, Clear(ClearType::All))?;
                pending = true;
            }

            if pending && let Some(frame) = timeline.current() {
                let size = terminal::size().unwrap_or((frame.grid.width, frame.grid.height));
                write_grid_at(&mut out, &frame.grid, self.options.color, size)?;
                out.flush()?;
                stats.frames_shown += 1;
                pacer.tick(frame.delay);
                pending = false;
            }

            let timeout = if paused { IDLE_POLL } else { pacer.remaining().min(IDLE_POLL) };
            if event::poll(timeout)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => match control_for_key(&key) {
                        Some(Control::Quit) => {
                            stats.quit_by_user = true;
                            break;
                        }
                        Some(Control::TogglePause) => {
                            paused = !paused;
                            log::debug!("Lecture: pause={paused}");
                            if !paused {
                                pacer.reset();
                            }
                        }
                        Some(Control::Step(Direction::Forward)) if paused => {
                            pending = timeline.advance(feed, true) != Advance::End;
                        }
                        Some(Control::Step(Direction::Backward)) if paused => {
                            pending = timeline.step_back();
                        }
                        _ => {}
                    },
                    Event::Resize(..) => {
                        queue!(out, Clear(ClearType::All))?;
                        pending = true;
                    }
                    _ => {}
                }
                continue;
            }

            if !paused && pacer.is_due() {
                match timeline.advance(feed, self.options.loop_playback) {
                    Advance::Moved => pending = true,
                    Advance::Looped => {
                        stats.loops += 1;
                        pending = true;
                    }
                    Advance::End => break,
                }
            }
        }

        stats.fps = pacer.fps();
        log::info!(
            "Lecture terminée: {} frames affichées, {} boucles, {:.1} fps",
            stats.frames_shown,
            stats.loops,
            stats.fps
        );
        Ok(stats)
    }
}
