// ============================================================================
// ERRORS - everything that can stop the editor
// ============================================================================
//
// Only startup can fail in normal operation.  Steady-state input is clamped,
// never rejected, so the one runtime variant is a transform pass that the GPU
// could not complete.

use std::fmt;
use std::path::Path;

#[derive(Debug)]
pub enum EditorError {
    /// A configuration value is missing, malformed or out of range.
    Config(String),
    /// The pixel-mapping program could not be found or read.
    ProgramLoad { name: String, reason: String },
    /// The program source was read but failed WGSL validation.
    ShaderCompile { name: String, message: String },
    /// The program needs a GPU and no adapter could be created.
    GpuUnavailable(String),
    /// A transform pass failed mid-run (readback or output shape).
    TransformPass(String),
    /// Window / event loop failure reported by eframe.
    Window(String),
}

impl EditorError {
    pub fn program_file(path: &Path, err: std::io::Error) -> Self {
        EditorError::ProgramLoad {
            name: path.display().to_string(),
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for EditorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorError::Config(msg) => write!(f, "invalid configuration: {msg}"),
            EditorError::ProgramLoad { name, reason } => {
                write!(f, "failed to load transform program '{name}': {reason}")
            }
            EditorError::ShaderCompile { name, message } => {
                write!(f, "failed to compile transform program '{name}': {message}")
            }
            EditorError::GpuUnavailable(why) => write!(f, "no usable GPU adapter: {why}"),
            EditorError::TransformPass(msg) => write!(f, "transform pass failed: {msg}"),
            EditorError::Window(msg) => write!(f, "window error: {msg}"),
        }
    }
}

impl std::error::Error for EditorError {}
