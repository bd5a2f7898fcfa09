pub mod formatter;
pub mod progress;

pub use progress::ScanProgress;
