pub mod assembly;
pub mod config;
pub mod engine;
