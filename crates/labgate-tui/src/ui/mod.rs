//! Terminal UI: rendering, keyboard input, and styling.

pub mod input;
pub mod render;
pub mod styles;
