pub mod config;
pub mod duration;
pub mod listings;
pub mod models;
