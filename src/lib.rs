pub mod api;
pub mod catalog;
pub mod config;
pub mod database;
pub mod enrollment;
pub mod error;
pub mod logger;
pub mod model;
pub mod player;
pub mod progress;
pub mod session;
