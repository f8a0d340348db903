pub mod advance;
pub mod app;
pub mod audio;
pub mod clock;
pub mod config;
pub mod library;
pub mod model;
pub mod navigation;
pub mod notify;
pub mod player;
pub mod registry;
pub mod session;
pub mod store;
pub mod ui;
