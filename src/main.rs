use clap::Parser;
use eframe::egui;
use pixelgrid::app::PixelGridApp;
use pixelgrid::cli::{self, CliArgs};
use pixelgrid::logger;
use pixelgrid::settings::AppSettings;

fn main() -> Result<(), eframe::Error> {
    let args = CliArgs::parse();
    let settings = AppSettings::load();
    let grid_size = args.session_grid_size(&settings);

    // -- Headless mode -----------------------------------------------------
    if args.is_headless() {
        let code = cli::run(&args, &settings);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode ------------------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();
    pixelgrid::log_info!("Grid size {}×{}", grid_size, grid_size);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([480.0, 320.0])
            .with_title("PixelGrid"),
        ..Default::default()
    };

    eframe::run_native(
        "PixelGrid",
        options,
        Box::new(move |cc| Box::new(PixelGridApp::new(cc, settings, grid_size))),
    )
}
