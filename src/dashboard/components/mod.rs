//! Reusable UI components for the dashboard

pub mod preview_card;
pub mod result_card;
pub mod sketch_pad;

pub use preview_card::{gray_texture, preview_card};
pub use result_card::result_card;
pub use sketch_pad::{pad_caption, SketchPad};
