use crate::config::{AppConfig, DB_HOST_ENV};
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by layering built-in defaults, the
    /// TOML file at `path`, `COMPASS_`-prefixed environment variables and
    /// finally the database host variable.
    ///
    /// A missing TOML file is not an error; defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or environment values cannot be parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<AppConfig> {
        let config: AppConfig = Self::figment(path).extract()?;
        tracing::debug!(db_host = %config.database.host, "configuration loaded");
        Ok(config)
    }

    /// Builds the provider stack without extracting it.
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("COMPASS_").split("__").ignore(&["DB_HOST"]))
            .merge(
                Env::raw()
                    .only(&[DB_HOST_ENV])
                    .map(|_| "database.host".into()),
            )
    }
}
