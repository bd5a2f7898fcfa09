pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod git;
pub mod interpreter;
pub mod models;
pub mod pipeline;
pub mod reporting;
pub mod utils;
