// ============================================================================
// pixelize CLI - command-line overrides and the headless validate mode
// ============================================================================
//
// Usage examples:
//   pixelize                                   (defaults + ~/.config/pixelize/pixelize.cfg)
//   pixelize --cadence 5 --pixel-size 8
//   pixelize --program shaders/swirl.wgsl --scale 2
//   pixelize --config demo.cfg --cpu
//   pixelize --program broken.wgsl --validate  (compile only, no window)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::config::EditorConfig;
use crate::error::EditorError;
use crate::transform::load_transform;

// ============================================================================
// CLI argument definition (clap Derive)
// ============================================================================

/// Pixel canvas with a recurring GPU feedback transform.
#[derive(Parser, Debug, Default)]
#[command(
    name = "pixelize",
    about = "Paint on a canvas that is periodically re-rendered through a shader",
    long_about = "Paint with the left button, erase with the right, pan with the middle\n\
                  button and zoom with the wheel. Space pauses the feedback pass, C\n\
                  clears the canvas.\n\n\
                  Example:\n  \
                  pixelize --cadence 5 --pixel-size 8\n  \
                  pixelize --program swirl.wgsl --validate"
)]
pub struct CliArgs {
    /// Config file (key=value). Defaults to the per-user pixelize.cfg if present.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Canvas width in pixels.
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height in pixels.
    #[arg(long)]
    pub height: Option<u32>,

    /// Simulation steps per second.
    #[arg(long, value_name = "TPS")]
    pub tick_rate: Option<u32>,

    /// Steps between transform passes.
    #[arg(long, value_name = "STEPS")]
    pub cadence: Option<u32>,

    /// Initial zoom (1-10).
    #[arg(long)]
    pub scale: Option<f32>,

    /// Cell size for the built-in pixelize program.
    #[arg(long, value_name = "PX")]
    pub pixel_size: Option<u32>,

    /// Paint colour as r,g,b,a.
    #[arg(long, value_name = "R,G,B,A")]
    pub paint_color: Option<String>,

    /// Erase / clear colour as r,g,b,a.
    #[arg(long, value_name = "R,G,B,A")]
    pub erase_color: Option<String>,

    /// Transform program: a built-in name or a .wgsl file.
    #[arg(short, long, value_name = "NAME|FILE.wgsl")]
    pub program: Option<String>,

    /// Run the built-in program on the CPU instead of the GPU.
    #[arg(long)]
    pub cpu: bool,

    /// GPU preference: "high performance" or "low power".
    #[arg(long, value_name = "PREFERENCE")]
    pub gpu: Option<String>,

    /// Start with an empty canvas.
    #[arg(long)]
    pub no_demo_block: bool,

    /// Load and compile the program, report the result, and exit.
    #[arg(long)]
    pub validate: bool,
}

impl CliArgs {
    /// Build the effective configuration: file layer, then flags, then validation.
    pub fn resolve_config(&self) -> Result<EditorConfig, EditorError> {
        let mut config = match &self.config {
            Some(path) => EditorConfig::load_file(path)?,
            None => EditorConfig::load_default()?,
        };
        self.apply_overrides(&mut config)?;
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut EditorConfig) -> Result<(), EditorError> {
        if let Some(w) = self.width {
            config.width = w;
        }
        if let Some(h) = self.height {
            config.height = h;
        }
        if let Some(tps) = self.tick_rate {
            config.tick_rate = tps;
        }
        if let Some(c) = self.cadence {
            config.cadence = c;
        }
        if let Some(s) = self.scale {
            config.initial_scale = s;
        }
        if let Some(px) = self.pixel_size {
            config.pixel_size = px;
        }
        if let Some(color) = &self.paint_color {
            config.set("paint_color", color)?;
        }
        if let Some(color) = &self.erase_color {
            config.set("erase_color", color)?;
        }
        if let Some(program) = &self.program {
            config.set("program", program)?;
        }
        if let Some(pref) = &self.gpu {
            config.preferred_gpu = pref.clone();
        }
        if self.cpu {
            config.gpu_acceleration = false;
        }
        if self.no_demo_block {
            config.demo_block = false;
        }
        Ok(())
    }
}

// ============================================================================
// Validate mode
// ============================================================================

/// Compile the configured program without opening a window.
/// `0` = the program loaded, `1` = it did not.
pub fn run_validate(config: &EditorConfig) -> ExitCode {
    match load_transform(config) {
        Ok(transform) => {
            println!(
                "ok: '{}' ({}x{})",
                transform.name(),
                config.width,
                config.height
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::ProgramSource;
    use image::Rgba;

    fn parse(args: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("pixelize").chain(args.iter().copied())).unwrap()
    }

    fn base() -> EditorConfig {
        EditorConfig::default()
    }

    #[test]
    fn flags_override_config_values() {
        let args = parse(&[
            "--width", "640",
            "--cadence", "4",
            "--scale", "2.5",
            "--paint-color", "0,255,0,255",
            "--program", "fx/swirl.wgsl",
            "--cpu",
            "--no-demo-block",
        ]);
        let mut config = base();
        args.apply_overrides(&mut config).unwrap();
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 768);
        assert_eq!(config.cadence, 4);
        assert_eq!(config.initial_scale, 2.5);
        assert_eq!(config.paint_color, Rgba([0, 255, 0, 255]));
        assert_eq!(config.program, ProgramSource::File(PathBuf::from("fx/swirl.wgsl")));
        assert!(!config.gpu_acceleration);
        assert!(!config.demo_block);
    }

    #[test]
    fn no_flags_leave_config_untouched() {
        let mut config = base();
        parse(&[]).apply_overrides(&mut config).unwrap();
        assert_eq!(config, base());
    }

    #[test]
    fn bad_colour_flag_is_an_error() {
        let mut config = base();
        let err = parse(&["--erase-color", "clear"]).apply_overrides(&mut config);
        assert!(matches!(err, Err(EditorError::Config(_))));
    }

    #[test]
    fn explicit_config_file_feeds_resolution() {
        let dir = std::env::temp_dir().join(format!("pixelize-cli-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("demo.cfg");
        std::fs::write(&path, "cadence=7\nwidth=300\n").unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "--width", "400"]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.cadence, 7);
        assert_eq!(config.width, 400);
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn resolution_validates_the_result() {
        let dir = std::env::temp_dir().join(format!("pixelize-cli-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.cfg");
        std::fs::write(&path, "").unwrap();

        let args = parse(&["--config", path.to_str().unwrap(), "--cadence", "0"]);
        assert!(args.resolve_config().is_err());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn validate_mode_reports_unknown_programs() {
        let config = EditorConfig {
            program: ProgramSource::Builtin("nope".into()),
            ..base()
        };
        assert_eq!(run_validate(&config), ExitCode::FAILURE);
    }
}
