pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod roster;
pub mod sources;
pub mod utils;
