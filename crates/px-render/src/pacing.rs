use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Délai minimal entre deux frames quand la source annonce 0.
pub const MIN_FRAME_DELAY: Duration = Duration::from_millis(10);

/// Cadence la lecture : délai par frame (source ou FPS forcé) et FPS mesuré
/// par fenêtre glissante.
///
/// # Example
/// ```
/// use std::time::Duration;
/// use px_render::pacing::FramePacer;
///
/// let pacer = FramePacer::new(Some(25), 30);
/// assert_eq!(pacer.delay_for(Duration::from_millis(500)), Duration::from_millis(40));
///
/// let pacer = FramePacer::new(None, 30);
/// assert_eq!(pacer.delay_for(Duration::from_millis(80)), Duration::from_millis(80));
/// ```
pub struct FramePacer {
    /// FPS imposé, prioritaire sur les délais de la source.
    fps_override: Option<u32>,
    /// Timestamps des dernières N frames affichées.
    timestamps: VecDeque<Instant>,
    window: usize,
    fps: f64,
    /// Échéance de la frame courante.
    deadline: Option<Instant>,
}

impl FramePacer {
    /// `window` : nombre de frames moyennées pour le FPS mesuré.
    #[must_use]
    pub fn new(fps_override: Option<u32>, window: usize) -> Self {
        let window = window.max(2);
        Self {
            fps_override: fps_override.filter(|&f| f > 0),
            timestamps: VecDeque::with_capacity(window + 1),
            window,
            fps: 0.0,
            deadline: None,
        }
    }

    /// Durée d'affichage effective d'une frame.
    #[must_use]
    pub fn delay_for(&self, source_delay: Duration) -> Duration {
        match self.fps_override {
            Some(fps) => Duration::from_secs_f64(1.0 / f64::from(fps)),
            None => source_delay.max(MIN_FRAME_DELAY),
        }
    }

    /// Change le FPS imposé (hot reload).
    pub fn set_fps_override(&mut self, fps: Option<u32>) {
        self.fps_override = fps.filter(|&f| f > 0);
    }

    /// Appeler une fois par frame, APRÈS l'affichage. Arme l'échéance suivante.
    pub fn tick(&mut self, source_delay: Duration) {
        let now = Instant::now();
        self.timestamps.push_back(now);
        if self.timestamps.len() > self.window {
            self.timestamps.pop_front();
        }
        if let Some(&first) = self.timestamps.front() {
            let secs = now.duration_since(first).as_secs_f64();
            if self.timestamps.len() >= 2 && secs > 0.0 {
                self.fps = (self.timestamps.len() - 1) as f64 / secs;
            }
        }
        self.deadline = Some(now + self.delay_for(source_delay));
    }

    /// Temps restant avant la frame suivante. Zéro si aucune échéance.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline
            .map_or(Duration::ZERO, |d| d.saturating_duration_since(Instant::now()))
    }

    /// L'échéance est-elle atteinte ?
    #[must_use]
    pub fn is_due(&self) -> bool {
        self.remaining().is_zero()
    }

    /// Force l'affichage immédiat de la frame suivante.
    pub fn reset(&mut self) {
        self.deadline = None;
    }

    /// FPS moyen mesuré sur la fenêtre.
    #[must_use]
    pub fn fps(&self) -> f64 {
        self.fps
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_source_delay_is_floored() {
        let pacer = FramePacer::new(None, 10);
        assert_eq!(pacer.delay_for(Duration::ZERO), MIN_FRAME_DELAY);
    }

    #[test]
    fn zero_fps_override_is_ignored() {
        let pacer = FramePacer::new(Some(0), 10);
        assert_eq!(
            pacer.delay_for(Duration::from_millis(70)),
            Duration::from_millis(70)
        );
    }

    #[test]
    fn fresh_pacer_is_due() {
        let pacer = FramePacer::new(None, 10);
        assert!(pacer.is_due());
        assert!(pacer.fps().abs() < f64::EPSILON);
    }

    #[test]
    fn tick_arms_deadline_and_reset_clears_it() {
        let mut pacer = FramePacer::new(Some(1), 10);
        pacer.tick(Duration::ZERO);
        assert!(!pacer.is_due());
        assert!(pacer.remaining() <= Duration::from_secs(1));
        pacer.reset();
        assert!(pacer.is_due());
    }

    #[test]
    fn measured_fps_is_positive_after_two_ticks() {
        let mut pacer = FramePacer::new(None, 10);
        pacer.tick(Duration::ZERO);
        std::thread::sleep(Duration::from_millis(5));
        pacer.tick(Duration::ZERO);
        assert!(pacer.fps() > 0.0);
    }
}
