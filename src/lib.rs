pub mod config;
pub mod daemon;
pub mod domains;
pub mod editor;
pub mod embed;
pub mod error;
pub mod interfaces;
pub mod logging;
pub mod providers;
pub mod services;
pub mod time_format;
pub mod ui;

pub type Result<T> = std::result::Result<T, error::BotboardError>;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_SHA: &str = env!("BOTBOARD_GIT_SHA");
