//! Process-wide configuration.
use std::path::Path;
use std::sync::Arc;

use arc_swap::ArcSwap;
use once_cell::sync::Lazy;

pub use shardroute_config::{Config, Error, General};

static CONFIG: Lazy<ArcSwap<Config>> = Lazy::new(|| ArcSwap::from_pointee(Config::default()));

/// Current configuration.
pub fn config() -> Arc<Config> {
    CONFIG.load().clone()
}

/// Load the configuration file from disk.
pub fn load(path: impl AsRef<Path>) -> Result<Arc<Config>, Error> {
    let config = Config::load(path)?;
    set(config)
}

/// Replace the configuration.
pub fn set(config: Config) -> Result<Arc<Config>, Error> {
    config.check()?;
    let config = Arc::new(config);
    CONFIG.store(config.clone());
    Ok(config)
}
