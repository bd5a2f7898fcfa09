pub mod target;
pub mod outcome;

pub use target::*;
pub use outcome::*;
