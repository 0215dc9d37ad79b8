use crate::config::{ClientConfig, ConfigOverrides};
use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: ClientConfig,
}

impl GlobalArgs {
    /// # Errors
    /// Returns an error if the resulting configuration is invalid.
    pub fn new(overrides: ConfigOverrides) -> Result<Self> {
        let config = ClientConfig::load(overrides).context("invalid client configuration")?;
        Ok(Self { config })
    }
}
