// ============================================================================
// PixelGrid CLI: session overrides and headless export
// ============================================================================
//
// Usage examples:
//   pixelgrid                               (open the editor, 16×16 or the saved size)
//   pixelgrid --grid-size 32                (open the editor with a 32×32 grid)
//   pixelgrid --export-blank blank.png      (write a transparent PNG, no window)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::canvas::CanvasState;
use crate::io::{ensure_png_extension, save_png};
use crate::settings::{AppSettings, MAX_GRID_SIZE};

/// PixelGrid pixel-art editor.
#[derive(Parser, Debug)]
#[command(name = "pixelgrid", about = "Fixed-resolution pixel-art editor with PNG export")]
pub struct CliArgs {
    /// Grid edge length in cells for this session (overrides the saved setting).
    #[arg(short, long, value_name = "CELLS", value_parser = clap::value_parser!(u32).range(1..=MAX_GRID_SIZE as i64))]
    pub grid_size: Option<u32>,

    /// Write a blank (fully transparent) grid as PNG to FILE and exit without
    /// opening a window.
    #[arg(long, value_name = "FILE")]
    pub export_blank: Option<PathBuf>,
}

impl CliArgs {
    /// True when no window should be opened.
    pub fn is_headless(&self) -> bool {
        self.export_blank.is_some()
    }

    /// Grid size for this session.  The saved settings are never touched,
    /// so the override does not outlive the process.
    pub fn session_grid_size(&self, settings: &AppSettings) -> u32 {
        self.grid_size.unwrap_or(settings.grid_size)
    }
}

/// Run the headless path and return an OS exit code.
pub fn run(args: &CliArgs, settings: &AppSettings) -> ExitCode {
    let Some(target) = args.export_blank.clone() else {
        return ExitCode::SUCCESS;
    };
    match export_blank(args.session_grid_size(settings), target) {
        Ok(path) => {
            println!("Wrote {}", path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn export_blank(grid_size: u32, target: PathBuf) -> Result<PathBuf, String> {
    let mut state = CanvasState::new(grid_size);
    state.create_surface();
    let bytes = state
        .export_png()
        .ok_or_else(|| "PNG encoding failed".to_string())?;
    let path = ensure_png_extension(target);
    save_png(&bytes, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_size_override() {
        let args = CliArgs::try_parse_from(["pixelgrid", "--grid-size", "32"]).unwrap();
        assert_eq!(args.session_grid_size(&AppSettings::default()), 32);
        assert!(!args.is_headless());
    }

    #[test]
    fn grid_size_override_is_not_saved() {
        let saved = AppSettings::parse("grid_size=16\nshow_grid_lines=true\nlast_export_dir=\n");
        let args = CliArgs::try_parse_from(["pixelgrid", "--grid-size", "32"]).unwrap();
        assert_eq!(args.session_grid_size(&saved), 32);
        assert!(saved.to_config_string().contains("grid_size=16\n"));
    }

    #[test]
    fn grid_size_out_of_range_is_rejected() {
        assert!(CliArgs::try_parse_from(["pixelgrid", "--grid-size", "0"]).is_err());
        assert!(CliArgs::try_parse_from(["pixelgrid", "--grid-size", "65"]).is_err());
    }

    #[test]
    fn no_args_keep_settings() {
        let args = CliArgs::try_parse_from(["pixelgrid"]).unwrap();
        let saved = AppSettings::parse("grid_size=24\n");
        assert_eq!(args.session_grid_size(&saved), 24);
    }

    #[test]
    fn blank_export_writes_transparent_png() {
        let dir = std::env::temp_dir().join(format!("pixelgrid-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let path = export_blank(8, dir.join("blank")).unwrap();
        assert_eq!(path, dir.join("blank.png"));
        let decoded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (8, 8));
        assert!(decoded.pixels().all(|p| p[3] == 0));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
