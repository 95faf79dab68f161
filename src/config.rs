//! Configuration for the stars-rider crate
#![warn(missing_docs)]
#![warn(unsafe_code)]

use crate::error;

/// Configuration format
pub struct Config {
    /// Version of the configuration root
    pub version: String,

    /// The general settings
    pub settings: config::Config,
}

/// Trait that defines a set of methods that allow loading and
/// unloading configuration data
pub trait Configuration {
    /// Load the configuration data from the default configuration
    /// string
    fn load(settings: config::Config) -> std::result::Result<Config, error::Error>;
}

impl Configuration for Config {
    fn load(settings: config::Config) -> std::result::Result<Config, error::Error> {
        let config = Config {
            version: String::from("0.1.0"),
            settings,
        };

        Ok(config)
    }
}
