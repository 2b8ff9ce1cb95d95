use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Remplace (ou ajoute) l'extension de `path`.
///
/// # Example
/// ```
/// use std::path::Path;
/// use px_export::paths::ensure_extension;
/// assert_eq!(ensure_extension(Path::new("clip.mov"), "mp4"), Path::new("clip.mp4"));
/// assert_eq!(ensure_extension(Path::new("clip.mp4"), "mp4"), Path::new("clip.mp4"));
/// ```
#[must_use]
pub fn ensure_extension(path: &Path, ext: &str) -> PathBuf {
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case(ext)) {
        return path.to_path_buf();
    }
    path.with_extension(ext)
}

/// Force l'extension `.gif`.
///
/// # Example
/// ```
/// use std::path::Path;
/// use px_export::paths::ensure_gif_extension;
/// assert_eq!(ensure_gif_extension(Path::new("a.png")), Path::new("a.gif"));
/// assert_eq!(ensure_gif_extension(Path::new("a")), Path::new("a.gif"));
/// ```
#[must_use]
pub fn ensure_gif_extension(path: &Path) -> PathBuf {
    ensure_extension(path, "gif")
}

/// Chemin de sortie sans sa dernière extension.
///
/// # Example
/// ```
/// use std::path::Path;
/// use px_export::paths::frame_base;
/// assert_eq!(frame_base(Path::new("out/art.txt")), Path::new("out/art"));
/// assert_eq!(frame_base(Path::new("art")), Path::new("art"));
/// ```
#[must_use]
pub fn frame_base(output: &Path) -> PathBuf {
    output.with_extension("")
}

/// `<base>_frame_<NNNN>.txt`, numéro sur 4 chiffres minimum.
#[must_use]
pub fn frame_path(base: &Path, index: usize) -> PathBuf {
    let mut name: OsString = base.as_os_str().to_owned();
    name.push(format!("_frame_{index:04}.txt"));
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gif_extension_is_case_insensitive() {
        assert_eq!(ensure_gif_extension(Path::new("x.GIF")), Path::new("x.GIF"));
    }

    #[test]
    fn only_last_extension_is_replaced() {
        assert_eq!(ensure_gif_extension(Path::new("a.b.png")), Path::new("a.b.gif"));
        assert_eq!(frame_base(Path::new("a.b.txt")), Path::new("a.b"));
    }

    #[test]
    fn frame_paths_are_zero_padded() {
        let base = Path::new("dir/out");
        assert_eq!(frame_path(base, 0), Path::new("dir/out_frame_0000.txt"));
        assert_eq!(frame_path(base, 42), Path::new("dir/out_frame_0042.txt"));
        assert_eq!(frame_path(base, 12345), Path::new("dir/out_frame_12345.txt"));
    }
}
