pub mod config;
pub mod constants;
pub mod engine;
pub mod geo;
