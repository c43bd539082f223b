use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::aws::AwsConfig;
use crate::convergence::ConvergenceConfig;
use crate::filter::FilterConfig;
use crate::logging::LoggingConfig;
use crate::validate;

/// `[switchover]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SwitchoverConfig {
    /// Deregister the moved targets from the source group once every
    /// destination has been cut over.
    pub remove_source: bool,
}

// ---------------------------------------------------------------------------
// CutoverConfig
// ---------------------------------------------------------------------------

/// Parsed and validated `tg-switch.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CutoverConfig {
    pub filter: FilterConfig,
    pub convergence: ConvergenceConfig,
    pub switchover: SwitchoverConfig,
    pub aws: AwsConfig,
    pub logging: LoggingConfig,
}

impl CutoverConfig {
    /// Read and parse a `tg-switch.toml` file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.as_ref().display()))?;
        content.parse()
    }

    /// Re-run the file-level checks, e.g. after command-line overrides.
    pub fn validate(&self) -> anyhow::Result<()> {
        validate::validate(self)
    }
}

impl FromStr for CutoverConfig {
    type Err = anyhow::Error;

    fn from_str(toml_str: &str) -> anyhow::Result<Self> {
        let config: CutoverConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
