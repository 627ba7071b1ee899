//! pixelize: a pixel canvas whose contents are periodically re-rendered
//! through a GPU pixel-mapping program, feeding each result back as the
//! next input.

#![allow(clippy::too_many_arguments)]

pub mod logger;

pub mod app;
pub mod canvas;
pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod gpu;
pub mod input;
pub mod line;
pub mod transform;
pub mod viewport;
