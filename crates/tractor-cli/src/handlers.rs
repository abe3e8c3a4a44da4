//! Command handlers for CLI subcommands
//!
//! Each subcommand lives in its own module; shared file loading and engine
//! construction are in `utils`.

mod check;
mod completions;
mod extract;
mod map;
mod utils;

pub use check::handle_check;
pub use completions::handle_completions;
pub use extract::handle_extract;
pub use map::handle_map;
