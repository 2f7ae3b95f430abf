//! CLI commands module.

mod config;
mod parse;
mod progress;
mod render;
mod util;

pub use config::ConfigCommand;
pub use parse::ParseCommand;
pub use render::RenderCommand;

pub(crate) use util::*;
