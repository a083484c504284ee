use std::path::PathBuf;

use crate::canvas::DEFAULT_GRID_SIZE;

/// Largest grid edge the settings file may ask for.
pub const MAX_GRID_SIZE: u32 = 64;

/// Application settings that persist across sessions
#[derive(Clone, Debug, PartialEq)]
pub struct AppSettings {
    /// Logical grid edge length in cells
    pub grid_size: u32,
    /// Draw cell boundaries over the grid
    pub show_grid_lines: bool,
    /// Directory the export dialog opens in
    pub last_export_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            show_grid_lines: true,
            last_export_dir: None,
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/pixelgrid/pixelgrid_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\PixelGrid\pixelgrid_settings.cfg
    /// On macOS:   ~/Library/Application Support/PixelGrid/pixelgrid_settings.cfg
    pub(crate) fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            let config_dir = PathBuf::from(appdata).join("PixelGrid");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("pixelgrid_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("PixelGrid");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("pixelgrid_settings.cfg"));
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?
                .join("pixelgrid");
            let _ = std::fs::create_dir_all(&config_dir);
            Some(config_dir.join("pixelgrid_settings.cfg"))
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        if let Err(e) = std::fs::write(&path, self.to_config_string()) {
            crate::log_warn!("Could not save settings to {}: {}", path.display(), e);
        }
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        let Ok(content) = std::fs::read_to_string(&path) else { return Self::default() };
        Self::parse(&content)
    }

    pub fn to_config_string(&self) -> String {
        let export_dir = self
            .last_export_dir
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!(
            "grid_size={}\n\
             show_grid_lines={}\n\
             last_export_dir={}\n",
            self.grid_size, self.show_grid_lines, export_dir,
        )
    }

    /// Parse `key=value` lines.  Unknown keys are skipped and bad values
    /// leave the default in place.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "grid_size" => {
                    if let Some(n) = val.parse::<u32>().ok().filter(|n| (1..=MAX_GRID_SIZE).contains(n)) {
                        s.grid_size = n;
                    }
                }
                "show_grid_lines" => {
                    s.show_grid_lines = val != "false";
                }
                "last_export_dir" => {
                    s.last_export_dir = (!val.is_empty()).then(|| PathBuf::from(val));
                }
                _ => {}
            }
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(AppSettings::parse(""), AppSettings::default());
        assert_eq!(AppSettings::default().grid_size, 16);
    }

    #[test]
    fn config_string_parses_back() {
        let settings = AppSettings {
            grid_size: 32,
            show_grid_lines: false,
            last_export_dir: Some(PathBuf::from("/tmp/sprites")),
        };
        assert_eq!(AppSettings::parse(&settings.to_config_string()), settings);
    }

    #[test]
    fn bad_values_fall_back() {
        let s = AppSettings::parse("grid_size=0\nshow_grid_lines=maybe\nfoo=bar\nnot a pair\n");
        assert_eq!(s.grid_size, DEFAULT_GRID_SIZE);
        assert!(s.show_grid_lines);

        let s = AppSettings::parse("grid_size=65\n");
        assert_eq!(s.grid_size, DEFAULT_GRID_SIZE);
        let s = AppSettings::parse(" grid_size = 8 \n");
        assert_eq!(s.grid_size, 8);
    }

    #[test]
    fn empty_export_dir_is_none() {
        assert_eq!(AppSettings::parse("last_export_dir=\n").last_export_dir, None);
    }
}
