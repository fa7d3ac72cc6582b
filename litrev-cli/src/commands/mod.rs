//! CLI command implementations

pub mod review;
pub mod serve;
pub mod settings;

pub use review::ReviewArgs;
pub use serve::ServeArgs;
pub use settings::SettingsArgs;
