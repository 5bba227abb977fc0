//! Terminal UI components.
//!
//! Rendering is a pure function of the [`Model`](crate::app::Model): an
//! editor pane with a line-number gutter, a toast row, a status bar and the
//! prompt/help overlays.

mod overlays;
mod render;
mod status;

pub use render::{line_number_width, render};

#[cfg(test)]
mod tests;
