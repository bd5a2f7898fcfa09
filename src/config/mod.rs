pub mod parser;
pub mod targets;
pub mod types;

pub use types::*;
pub use parser::{parse_config, parse_config_str};
pub use targets::{build_descriptors, load_target_list, parse_target_list};
