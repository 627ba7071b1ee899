#![allow(clippy::too_many_arguments)]

use std::process::ExitCode;

use clap::Parser;
use eframe::egui;

use pixelize::app::PixelizeApp;
use pixelize::cli::{self, CliArgs};
use pixelize::editor::EditorState;
use pixelize::transform::load_transform;
use pixelize::{log_err, log_info, logger};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Initialize session log (overwrites previous session log)
    logger::init();

    let config = match args.resolve_config() {
        Ok(config) => config,
        Err(e) => return startup_failure(e),
    };

    // -- Validate mode: compile the program and exit ------------------------
    if args.validate {
        return cli::run_validate(&config);
    }

    // Program load and compile happen before the window opens so a bad
    // shader never flashes an empty window.
    let transform = match load_transform(&config) {
        Ok(t) => t,
        Err(e) => return startup_failure(e),
    };

    let editor = EditorState::new(&config, transform);
    let tick = config.tick_duration();
    log_info!("Running at {} steps per second", config.tick_rate);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.width as f32, config.height as f32])
            .with_title("pixelize"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "pixelize",
        options,
        Box::new(move |_cc| Box::new(PixelizeApp::new(editor, tick))),
    );
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => startup_failure(pixelize::error::EditorError::Window(e.to_string())),
    }
}

fn startup_failure(e: pixelize::error::EditorError) -> ExitCode {
    log_err!("{}", e);
    eprintln!("pixelize: {e}");
    if let Some(path) = logger::log_path() {
        eprintln!("pixelize: session log at {}", path.display());
    }
    ExitCode::FAILURE
}
