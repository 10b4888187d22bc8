pub mod config;
pub mod content;
pub mod keys;
pub mod types;

pub use config::Config;
pub use content::sanitise_content;
pub use keys::*;
pub use types::*;
