use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use arc_swap::ArcSwap;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use px_core::config::{ConvertConfig, load_config};

/// Surveille le fichier config et publie chaque version valide dans l'ArcSwap.
///
/// Retourne le Watcher (doit rester vivant tant que la lecture tourne).
/// Une config invalide est ignorée : la précédente reste active.
///
/// # Errors
/// Returns an error if the watcher cannot be created or the path cannot be watched.
pub fn spawn_config_watcher(
    config_path: &Path,
    config: &Arc<ArcSwap<ConvertConfig>>,
) -> Result<impl Watcher + use<>> {
    let config = Arc::clone(config);
    let path = config_path.to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
        if let Ok(event) = res
            && matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        {
            match load_config(&path) {
                Ok(new_config) => {
                    if **config.load() != new_config {
                        config.store(Arc::new(new_config));
                        log::info!("Config rechargée depuis {}", path.display());
                    }
                }
                Err(e) => {
                    log::warn!("Erreur de rechargement config : {e:#}");
                }
            }
        }
    })?;

    watcher.watch(config_path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Détecte les nouvelles versions publiées dans un `ArcSwap`.
pub struct ConfigTracker {
    shared: Arc<ArcSwap<ConvertConfig>>,
    seen: Arc<ConvertConfig>,
}

impl ConfigTracker {
    #[must_use]
    pub fn new(shared: Arc<ArcSwap<ConvertConfig>>) -> Self {
        let seen = shared.load_full();
        Self { shared, seen }
    }

    /// Nouvelle config depuis le dernier appel, sinon `None`.
    pub fn poll(&mut self) -> Option<Arc<ConvertConfig>> {
        let current = self.shared.load_full();
        if Arc::ptr_eq(&current, &self.seen) {
            return None;
        }
        self.seen = Arc::clone(&current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracker_reports_each_store_once() {
        let shared = Arc::new(ArcSwap::from_pointee(ConvertConfig::default()));
        let mut tracker = ConfigTracker::new(Arc::clone(&shared));
        assert!(tracker.poll().is_none());

        shared.store(Arc::new(ConvertConfig {
            width: 33,
            ..ConvertConfig::default()
        }));
        assert_eq!(tracker.poll().map(|c| c.width), Some(33));
        assert!(tracker.poll().is_none());
    }

    #[test]
    fn watcher_on_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let shared = Arc::new(ArcSwap::from_pointee(ConvertConfig::default()));
        assert!(spawn_config_watcher(&dir.path().join("absent.toml"), &shared).is_err());
    }
}
