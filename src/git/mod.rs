pub mod bootstrap;

pub use bootstrap::ensure_engine;
