//! CSV loading and report rendering for the `course-stats` binary.

pub mod loader;
pub mod render;

pub use loader::{load_dataset, read_records};
pub use render::{render_json, render_text, FullReport};
