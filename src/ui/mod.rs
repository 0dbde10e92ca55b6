//! Terminal output for listings, previews and results.

mod render;

pub use render::{render_groups, Palette};
