pub mod app;
pub mod assistant;
pub mod config;
pub mod display;
pub mod format;
pub mod paths;
pub mod session;
