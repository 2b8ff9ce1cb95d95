use std::io::Write;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};
use px_core::frame::FrameBuffer;

/// Encode des frames RGBA brutes en MP4 (H.264) via un subprocess ffmpeg.
pub struct Mp4Muxer {
    ffmpeg_child: Child,
    size: (u32, u32),
    frames_written: usize,
}

/// Arguments ffmpeg : rawvideo RGBA sur stdin → H.264 yuv420p.
///
/// yuv420p exige des dimensions paires : le filtre `pad` ajoute au besoin
/// une colonne/ligne.
#[must_use]
pub fn encoder_args(output: &str, width: u32, height: u32, fps: f64) -> Vec<String> {
    [
        "-y",
        "-f",
        "rawvideo",
        "-vcodec",
        "rawvideo",
        "-s",
        &format!("{width}x{height}"),
        "-pix_fmt",
        "rgba",
        "-r",
        &format!("{fps:.3}"),
        "-i",
        "-",
        "-vf",
        "pad=ceil(iw/2)*2:ceil(ih/2)*2",
        "-c:v",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-crf",
        "18",
        "-movflags",
        "+faststart",
        "-hide_banner",
        "-loglevel",
        "error",
        output,
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl Mp4Muxer {
    /// Lance l'encodeur pour des frames de `width × height` pixels.
    ///
    /// # Errors
    /// Retourne une erreur si ffmpeg n'est pas installé ou impossible à démarrer.
    pub fn new(output_path: &Path, width: u32, height: u32, fps: f64) -> Result<Self> {
        let path_str = output_path.to_str().context("Chemin de sortie invalide (non-UTF8)")?;
        let fps = if fps > 0.0 { fps } else { 30.0 };

        let child = Command::new("ffmpeg")
            .args(encoder_args(path_str, width, height, fps))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Échec de l'initialisation de l'encodeur vidéo ffmpeg. (Est-il dans PATH ?)")?;

        log::debug!("Mp4Muxer: {width}x{height} @ {fps:.3}fps → {}", output_path.display());
        Ok(Self {
            ffmpeg_child: child,
            size: (width, height),
            frames_written: 0,
        })
    }

    /// Ajoute une frame au flux.
    ///
    /// # Errors
    /// Retourne une erreur si la taille diffère de celle annoncée ou si le pipe est rompu.
    pub fn write_frame(&mut self, fb: &FrameBuffer) -> Result<()> {
        if (fb.width, fb.height) != self.size {
            anyhow::bail!(
                "Frame {}x{} ≠ taille encodeur {}x{}",
                fb.width,
                fb.height,
                self.size.0,
                self.size.1
            );
        }
        let stdin = self
            .ffmpeg_child
            .stdin
            .as_mut()
            .context("Pipe ffmpeg déjà fermé")?;
        stdin.write_all(&fb.data).context("Écriture vers ffmpeg impossible")?;
        self.frames_written += 1;
        Ok(())
    }

    /// Frames écrites jusqu'ici.
    #[must_use]
    pub fn frames_written(&self) -> usize {
        self.frames_written
    }

    /// Ferme le flux et attend la fin de l'encodage.
    ///
    /// # Errors
    /// Retourne une erreur si ffmpeg signale une erreur de terminaison.
    pub fn finish(mut self) -> Result<usize> {
        drop(self.ffmpeg_child.stdin.take());

        let output = self.ffmpeg_child.wait_with_output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("ffmpeg encoder error: {stderr}");
        }
        log::info!("MP4 finalisé: {} frames", self.frames_written);
        Ok(self.frames_written)
    }
}
