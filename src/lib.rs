//! PixelGrid: a fixed-resolution pixel-art editor.
//!
//! The window shell lives in [`app`]; everything below it is plain state and
//! can be driven without a window.

pub mod logger;

pub mod app;
pub mod canvas;
pub mod cli;
pub mod components;
pub mod io;
pub mod settings;
