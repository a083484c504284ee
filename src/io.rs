use image::codecs::png::PngEncoder;
use image::{ImageError, RgbaImage};
use rfd::FileDialog;
use std::path::{Path, PathBuf};

/// File name the export dialog suggests.
pub const DEFAULT_EXPORT_NAME: &str = "image.png";

/// Media type of everything this module writes.
pub const PNG_MIME: &str = "image/png";

// ============================================================================
// PNG ENCODING
// ============================================================================

/// Encode `image` as an RGBA8 PNG held in memory.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ImageError> {
    let mut bytes = Vec::new();
    let encoder = PngEncoder::new(&mut bytes);
    #[allow(deprecated)]
    encoder.encode(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgba8,
    )?;
    Ok(bytes)
}

/// Write already-encoded PNG bytes to `path`.
pub fn save_png(bytes: &[u8], path: &Path) -> Result<(), String> {
    std::fs::write(path, bytes).map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

/// Append `.png` unless the path already ends in it (any case).
pub fn ensure_png_extension(path: PathBuf) -> PathBuf {
    let has_png = path
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("png"));
    if has_png {
        path
    } else {
        let mut name = path.into_os_string();
        name.push(".png");
        PathBuf::from(name)
    }
}

// ============================================================================
// EXPORT DIALOG
// ============================================================================

/// Remembers where the last export went so the next dialog opens there.
#[derive(Default)]
pub struct FileHandler {
    pub last_export_dir: Option<PathBuf>,
}

impl FileHandler {
    pub fn new(last_export_dir: Option<PathBuf>) -> Self {
        Self { last_export_dir }
    }

    /// Native save dialog pre-filled with [`DEFAULT_EXPORT_NAME`].
    pub fn pick_export_path(&self) -> Option<PathBuf> {
        let mut dialog = FileDialog::new()
            .set_file_name(DEFAULT_EXPORT_NAME)
            .add_filter("PNG Image", &["png"]);
        if let Some(dir) = self.last_export_dir.as_ref().filter(|d| d.is_dir()) {
            dialog = dialog.set_directory(dir);
        }
        dialog.save_file().map(ensure_png_extension)
    }

    /// Ask for a destination and write `bytes` there.
    /// `Ok(None)` means the user cancelled.
    pub fn export(&mut self, bytes: &[u8]) -> Result<Option<PathBuf>, String> {
        let Some(path) = self.pick_export_path() else {
            return Ok(None);
        };
        self.write_export(bytes, path).map(Some)
    }

    fn write_export(&mut self, bytes: &[u8], path: PathBuf) -> Result<PathBuf, String> {
        save_png(bytes, &path)?;
        crate::log_info!("Exported {} ({} bytes, {})", path.display(), bytes.len(), PNG_MIME);
        self.last_export_dir = path.parent().map(Path::to_path_buf);
        Ok(path)
    }
}
