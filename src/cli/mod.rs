pub mod commands;
pub mod interrupt;
pub mod scan;

pub use commands::{Cli, Commands};
