pub mod env;
mod loader;

pub use env::{
    AppConfig, ConfigError, DelayWindow, DirectoryConfig, PacingConfig, ResourceConfig,
    RetryConfig, ScrapeConfig, SessionConfig, UrlConfig, WaitConfig,
};
pub use loader::load_config;
