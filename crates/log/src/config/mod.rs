//! Configuration types
//!
//! - `base`: the top-level [`Config`] and [`Format`]
//! - `display`: writer and display toggles
//! - `presets`: development, production and test setups

mod base;
mod display;
mod presets;

pub use base::{Config, Format};
pub use display::{DisplayConfig, WriterConfig};
