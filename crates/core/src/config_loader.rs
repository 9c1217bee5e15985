use crate::config::ScannerConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

/// Loads [`ScannerConfig`] by layering defaults, an optional TOML file, and environment
/// variables, in that order (later layers win).
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads scanner configuration from `config/Scanner.toml` merged with `SCANNER_`-prefixed
    /// environment variables, falling back to [`ScannerConfig::default`] for anything unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file is present but malformed, or if an environment
    /// variable cannot be coerced into its target field type.
    pub fn load() -> Result<ScannerConfig> {
        let config: ScannerConfig = Figment::new()
            .merge(Serialized::defaults(ScannerConfig::default()))
            .merge(Toml::file("config/Scanner.toml"))
            .merge(Env::prefixed("SCANNER_").split("_"))
            .extract()?;

        Ok(config)
    }

    /// Loads configuration with an additional environment-specific TOML overlay, e.g.
    /// `config/Scanner.production.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error under the same conditions as [`ConfigLoader::load`].
    pub fn load_with_profile(profile: &str) -> Result<ScannerConfig> {
        let config: ScannerConfig = Figment::new()
            .merge(Serialized::defaults(ScannerConfig::default()))
            .merge(Toml::file("config/Scanner.toml"))
            .merge(Toml::file(format!("config/Scanner.{profile}.toml")))
            .merge(Env::prefixed("SCANNER_").split("_"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_without_files_falls_back_to_defaults() {
        let config = ConfigLoader::load().expect("defaults alone must be extractable");
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.concurrency.k_max_concurrent, 4);
    }
}
