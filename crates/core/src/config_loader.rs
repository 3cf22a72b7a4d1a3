use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by merging the TOML file with
    /// `ORCA_`-prefixed environment variables. A missing file yields the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Loads configuration from a specific TOML path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be parsed.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("ORCA_").split("__"))
            .extract()?;

        Ok(config)
    }
}
