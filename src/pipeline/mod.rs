pub mod admission;
pub mod checkpoint;
pub mod events;
pub mod extraction;
pub mod scheduler;
pub mod state;

pub use checkpoint::OutcomeCheckpoint;
pub use events::{EventSink, ScanEvent};
pub use extraction::TargetPipeline;
pub use scheduler::{ScanRun, ScanScheduler};
pub use state::{ScanSettings, TargetState};
