#[cfg(feature = "cli")]
pub mod cli;
pub mod import_config;

#[cfg(feature = "cli")]
pub use cli::CliConfig;
pub use import_config::ImportConfig;
