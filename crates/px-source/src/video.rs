// Décodage vidéo via subprocess ffmpeg/ffprobe (std::process::Command),
// sans binding C. Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
//   - `probe_video`       : interroge ffprobe pour width/height/fps/nb_frames
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGBA sur stdout, déjà à la taille de la grille
//   - `VideoSource`       : thread dédié qui lit les frames et les pousse dans un canal borné

use anyhow::{Context, Result};
use flume::{Receiver, Sender};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use px_core::frame::FrameBuffer;
use px_core::traits::{Source, SourceFrame};

use crate::image::ensure_exists;
use crate::resize::grid_size;

/// Capacité du canal décodeur → convertisseur.
const CHANNEL_CAPACITY: usize = 8;

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    /// Largeur native en pixels.
    pub width: u32,
    /// Hauteur native en pixels.
    pub height: u32,
    /// Images par seconde (ex: 23.976, 24.0, 30.0).
    pub fps: f64,
    /// Nombre de frames annoncé par le conteneur, s'il est connu.
    pub frame_count: Option<usize>,
}

/// Parse la sortie `key=value` de ffprobe.
///
/// # Example
/// ```
/// use px_source::video::parse_probe_output;
/// let info = parse_probe_output("width=640\nheight=360\nr_frame_rate=30000/1001\nnb_frames=N/A\n").unwrap();
/// assert_eq!((info.width, info.height), (640, 360));
/// assert!((info.fps - 29.97).abs() < 0.01);
/// assert_eq!(info.frame_count, None);
/// ```
#[must_use]
pub fn parse_probe_output(text: &str) -> Option<VideoInfo> {
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut fps: f64 = 30.0;
    let mut frame_count: Option<usize> = None;

    for line in text.lines() {
        if let Some(val) = line.strip_prefix("width=") {
            width = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("height=") {
            height = val.trim().parse().ok();
        } else if let Some(val) = line.strip_prefix("r_frame_rate=") {
            // Format: "24/1" ou "30000/1001"
            let mut parts = val.trim().splitn(2, '/');
            let num: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(30.0);
            let den: f64 = parts.next().and_then(|s| s.parse().ok()).unwrap_or(1.0);
            if den > 0.0 && num > 0.0 {
                fps = num / den;
            }
        } else if let Some(val) = line.strip_prefix("nb_frames=") {
            frame_count = val.trim().parse().ok();
        }
    }

    match (width, height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => Some(VideoInfo {
            width,
            height,
            fps,
            frame_count,
        }),
        _ => None,
    }
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// Retourne une erreur si `ffprobe` est introuvable ou si le fichier
/// ne contient aucun flux vidéo décodable.
pub fn probe_video(path: &Path) -> Result<VideoInfo> {
    ensure_exists(path)?;
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,nb_frames",
            "-of",
            "default=noprint_wrappers=1",
            "-i",
            path_str,
        ])
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .context("Impossible de lancer ffprobe. Vérifiez que ffprobe est installé et dans le PATH.")?;

    let text = String::from_utf8_lossy(&output.stdout);
    let Some(info) = parse_probe_output(&text) else {
        anyhow::bail!("ffprobe n'a trouvé aucun flux vidéo dans {}", path.display());
    };

    log::info!(
        "probe_video: {}x{} @ {:.3}fps ({:?} frames) — {}",
        info.width,
        info.height,
        info.fps,
        info.frame_count,
        path.display()
    );
    Ok(info)
}

/// Lance un processus `ffmpeg` qui écrit des frames RGBA brutes sur stdout.
///
/// Chaque frame = `w × h × 4` bytes (RGBA row-major, sans padding).
/// `-an` supprime l'audio.
///
/// # Errors
/// Retourne une erreur si ffmpeg ne peut pas être lancé.
pub fn spawn_ffmpeg_pipe(path: &Path, w: u32, h: u32, fps: f64) -> Result<Child> {
    let path_str = path.to_str().context("Chemin vidéo invalide (non-UTF8)")?;
    let scale_filter = format!("scale={w}:{h}:flags=lanczos");
    let fps_str = format!("{fps:.3}");

    let child = Command::new("ffmpeg")
        .args([
            "-i",
            path_str,
            "-vf",
            &scale_filter,
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-r",
            &fps_str,
            "-an",
            "-hide_banner",
            "-loglevel",
            "error",
            "pipe:1",
        ])
        .stdout(Stdio::piped())
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Impossible de lancer ffmpeg. Vérifiez qu'il est installé et dans le PATH.")?;

    log::debug!("ffmpeg spawné: {w}x{h} @ {fps:.3}fps");
    Ok(child)
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// Retourne `Ok(true)` si lu avec succès, `Ok(false)` sur EOF avant complétion,
/// `Err` sur erreur I/O fatale.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<bool> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(false),
            Ok(n) => total += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

/// Source vidéo : un thread `px-video` décode via ffmpeg et pousse les frames
/// (déjà à la taille de la grille) dans un canal borné.
///
/// `next_frame` bloque jusqu'à la frame suivante et rend `None` en fin de flux.
pub struct VideoSource {
    info: VideoInfo,
    grid: (u32, u32),
    frame_rx: Receiver<SourceFrame>,
}

impl VideoSource {
    /// Probe `path` and start decoding at `width` columns.
    ///
    /// # Errors
    /// Retourne une erreur si ffprobe/ffmpeg sont introuvables ou si le fichier est invalide.
    pub fn open(path: &Path, width: u32, aspect: f32) -> Result<Self> {
        let info = probe_video(path)?;
        let (cols, rows) = grid_size(info.width, info.height, width, aspect)?;
        let grid = (u32::from(cols), u32::from(rows));
        let fps = info.fps.clamp(1.0, 60.0);

        let child = spawn_ffmpeg_pipe(path, grid.0, grid.1, fps)?;
        let (frame_tx, frame_rx) = flume::bounded(CHANNEL_CAPACITY);
        let owned: PathBuf = path.to_path_buf();

        thread::Builder::new()
            .name("px-video".to_string())
            .spawn(move || decode_loop(&owned, child, grid, fps, &frame_tx))
            .context("Impossible de spawner le thread vidéo")?;

        Ok(Self {
            info,
            grid,
            frame_rx,
        })
    }

    /// Métadonnées ffprobe.
    #[must_use]
    pub fn info(&self) -> VideoInfo {
        self.info
    }

    /// Taille (colonnes, lignes) à laquelle ffmpeg décode.
    #[must_use]
    pub fn grid(&self) -> (u32, u32) {
        self.grid
    }
}

impl Source for VideoSource {
    fn next_frame(&mut self) -> Option<SourceFrame> {
        self.frame_rx.recv().ok()
    }

    fn native_size(&self) -> (u32, u32) {
        (self.info.width, self.info.height)
    }

    fn frame_count(&self) -> Option<usize> {
        self.info.frame_count
    }

    fn is_animated(&self) -> bool {
        true
    }
}

/// Boucle du thread vidéo. Sort sur EOF, erreur de pipe ou récepteur fermé.
fn decode_loop(
    path: &Path,
    mut child: Child,
    (w, h): (u32, u32),
    fps: f64,
    frame_tx: &Sender<SourceFrame>,
) {
    let delay = Duration::from_secs_f64(1.0 / fps);
    let mut decoded = 0usize;

    if let Some(mut stdout) = child.stdout.take() {
        loop {
            let mut fb = FrameBuffer::new(w, h);
            match read_exact_or_eof(&mut stdout, &mut fb.data) {
                Ok(true) => {
                    let frame = SourceFrame {
                        buffer: Arc::new(fb),
                        delay,
                    };
                    if frame_tx.send(frame).is_err() {
                        log::debug!("Thread vidéo: récepteur fermé, arrêt.");
                        break;
                    }
                    decoded += 1;
                }
                Ok(false) => {
                    log::info!("Thread vidéo: EOF après {decoded} frames ({}).", path.display());
                    break;
                }
                Err(e) => {
                    log::warn!("Thread vidéo: erreur lecture pipe: {e}");
                    break;
                }
            }
        }
    }

    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_output_without_video_stream_is_rejected() {
        assert!(parse_probe_output("").is_none());
        assert!(parse_probe_output("width=0\nheight=0\n").is_none());
    }

    #[test]
    fn probe_output_reads_frame_count() {
        let info = parse_probe_output("width=1920\nheight=1080\nr_frame_rate=24/1\nnb_frames=240\n")
            .unwrap();
        assert!((info.fps - 24.0).abs() < f64::EPSILON);
        assert_eq!(info.frame_count, Some(240));
    }

    #[test]
    fn read_exact_or_eof_reports_short_reads() {
        let mut full: &[u8] = &[1, 2, 3, 4];
        let mut buf = [0u8; 4];
        assert!(read_exact_or_eof(&mut full, &mut buf).unwrap());
        assert_eq!(buf, [1, 2, 3, 4]);

        let mut short: &[u8] = &[9, 9];
        assert!(!read_exact_or_eof(&mut short, &mut buf).unwrap());
    }
}
