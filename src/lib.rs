pub mod catalog;
pub mod config;
pub mod error;
pub mod navigation;
pub mod player;
pub mod progress;
pub mod session;
pub mod sync;
pub mod utils;
