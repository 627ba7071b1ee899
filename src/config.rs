// ============================================================================
// CONFIGURATION - startup constants for the editor
// ============================================================================
//
// Values come from three layers, later layers winning:
//   1. built-in defaults (`EditorConfig::default`)
//   2. an optional `key=value` file (`pixelize.cfg`)
//   3. command-line flags (cli.rs)
//
// Everything is read once before the window opens.  Nothing is written back.

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::Rgba;

use crate::error::EditorError;
use crate::transform::ProgramSource;
use crate::log_warn;

pub const DEFAULT_WIDTH: u32 = 1024;
pub const DEFAULT_HEIGHT: u32 = 768;
pub const DEFAULT_TICK_RATE: u32 = 100;
pub const DEFAULT_CADENCE: u32 = 10;
pub const DEFAULT_PIXEL_SIZE: u32 = 4;

const CONFIG_FILE_NAME: &str = "pixelize.cfg";

#[derive(Clone, Debug, PartialEq)]
pub struct EditorConfig {
    /// Canvas width in pixels, shared by both buffers.
    pub width: u32,
    /// Canvas height in pixels, shared by both buffers.
    pub height: u32,
    /// Simulation steps per second.
    pub tick_rate: u32,
    /// Steps between transform passes.
    pub cadence: u32,
    /// Zoom at startup, >= 1.
    pub initial_scale: f32,
    pub paint_color: Rgba<u8>,
    pub erase_color: Rgba<u8>,
    /// Cell edge length for the built-in pixelize program.
    pub pixel_size: u32,
    pub program: ProgramSource,
    pub gpu_acceleration: bool,
    /// "high performance" / "low power".
    pub preferred_gpu: String,
    /// Seed the canvas with a paint-coloured block.
    pub demo_block: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tick_rate: DEFAULT_TICK_RATE,
            cadence: DEFAULT_CADENCE,
            initial_scale: 1.0,
            paint_color: Rgba([255, 0, 0, 255]),
            erase_color: Rgba([0, 0, 0, 0]),
            pixel_size: DEFAULT_PIXEL_SIZE,
            program: ProgramSource::default(),
            gpu_acceleration: true,
            preferred_gpu: "high performance".to_string(),
            demo_block: true,
        }
    }
}

impl EditorConfig {
    /// Default config file location.
    /// On Linux:   ~/.config/pixelize/pixelize.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\pixelize\pixelize.cfg
    /// On macOS:   ~/Library/Application Support/pixelize/pixelize.cfg
    pub fn default_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").ok()?;
            return Some(PathBuf::from(appdata).join("pixelize").join(CONFIG_FILE_NAME));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("pixelize")
                    .join(CONFIG_FILE_NAME),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let base = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
                .ok()?;
            Some(base.join("pixelize").join(CONFIG_FILE_NAME))
        }
    }

    /// Defaults overlaid with the default config file, if there is one.
    pub fn load_default() -> Result<Self, EditorError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Defaults overlaid with `path`.  A missing or unreadable file is an
    /// error here because the caller asked for it explicitly.
    pub fn load_file(path: &Path) -> Result<Self, EditorError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EditorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::default();
        config.apply_str(&content)?;
        Ok(config)
    }

    /// Apply `key=value` lines.  Blank lines and `#` comments are skipped;
    /// unknown keys are logged and ignored so older files keep working.
    pub fn apply_str(&mut self, content: &str) -> Result<(), EditorError> {
        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                return Err(EditorError::Config(format!(
                    "line {}: expected key=value, got '{}'",
                    lineno + 1,
                    line
                )));
            };
            self.set(key.trim(), val.trim())?;
        }
        Ok(())
    }

    /// Set one option from its textual form.
    pub fn set(&mut self, key: &str, val: &str) -> Result<(), EditorError> {
        match key {
            "width" => self.width = parse_num(key, val)?,
            "height" => self.height = parse_num(key, val)?,
            "tick_rate" => self.tick_rate = parse_num(key, val)?,
            "cadence" => self.cadence = parse_num(key, val)?,
            "initial_scale" => self.initial_scale = parse_num(key, val)?,
            "pixel_size" => self.pixel_size = parse_num(key, val)?,
            "paint_color" => self.paint_color = parse_color(key, val)?,
            "erase_color" => self.erase_color = parse_color(key, val)?,
            "program" => self.program = ProgramSource::parse(val),
            "gpu_acceleration" => self.gpu_acceleration = parse_bool(key, val)?,
            "preferred_gpu" => self.preferred_gpu = val.to_string(),
            "demo_block" => self.demo_block = parse_bool(key, val)?,
            _ => log_warn!("Ignoring unknown config key '{}'", key),
        }
        Ok(())
    }

    /// Reject values the editor cannot run with.
    pub fn validate(&self) -> Result<(), EditorError> {
        if self.width == 0 || self.height == 0 {
            return Err(EditorError::Config(format!(
                "canvas must be at least 1x1, got {}x{}",
                self.width, self.height
            )));
        }
        if self.tick_rate == 0 {
            return Err(EditorError::Config("tick_rate must be positive".into()));
        }
        if self.cadence == 0 {
            return Err(EditorError::Config("cadence must be positive".into()));
        }
        if self.pixel_size == 0 {
            return Err(EditorError::Config("pixel_size must be positive".into()));
        }
        if !self.initial_scale.is_finite() || self.initial_scale < 1.0 {
            return Err(EditorError::Config(format!(
                "initial_scale must be >= 1, got {}",
                self.initial_scale
            )));
        }
        Ok(())
    }

    /// Wall-clock length of one simulation step.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.tick_rate.max(1) as u64)
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, val: &str) -> Result<T, EditorError> {
    val.parse()
        .map_err(|_| EditorError::Config(format!("{key}: '{val}' is not a valid number")))
}

fn parse_bool(key: &str, val: &str) -> Result<bool, EditorError> {
    match val.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(EditorError::Config(format!("{key}: '{val}' is not a boolean"))),
    }
}

/// Parse an "r,g,b,a" colour.
pub fn str_to_color(s: &str) -> Option<Rgba<u8>> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        return None;
    }
    let r = parts[0].trim().parse::<u8>().ok()?;
    let g = parts[1].trim().parse::<u8>().ok()?;
    let b = parts[2].trim().parse::<u8>().ok()?;
    let a = parts[3].trim().parse::<u8>().ok()?;
    Some(Rgba([r, g, b, a]))
}

fn parse_color(key: &str, val: &str) -> Result<Rgba<u8>, EditorError> {
    str_to_color(val)
        .ok_or_else(|| EditorError::Config(format!("{key}: expected r,g,b,a but got '{val}'")))
}
