//! Design configuration.

use arcstr::ArcStr;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::TopologicalIndex;

/// Tunables for a [`Design`](crate::Design).
///
/// Missing keys take their default values, so an empty TOML document is a
/// valid configuration:
///
/// ```
/// use netdb::DesignConfig;
///
/// let config = DesignConfig::from_toml_str("small_gap = 4").unwrap();
/// assert_eq!(config.small_gap, 4);
/// assert_eq!(config.large_gap, 1000);
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    /// Slots per chunk in every arena owned by the design.
    pub chunk_size: usize,
    /// Distance between a pin and its single neighbor in topological order.
    pub small_gap: TopologicalIndex,
    /// Width of the range carved out when labels have to be propagated.
    pub large_gap: TopologicalIndex,
    /// Name of the module created along with the design.
    pub root_module_name: ArcStr,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            chunk_size: arena::DEFAULT_CHUNK_SIZE,
            small_gap: 10,
            large_gap: 1000,
            root_module_name: arcstr::literal!("__root"),
        }
    }
}

impl DesignConfig {
    /// Parses and validates a configuration from a TOML document.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is in range.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be positive".into()));
        }
        if self.small_gap <= 0 {
            return Err(Error::InvalidConfig("small_gap must be positive".into()));
        }
        if self.large_gap < self.small_gap {
            return Err(Error::InvalidConfig(format!(
                "large_gap ({}) must not be smaller than small_gap ({})",
                self.large_gap, self.small_gap
            )));
        }
        Ok(())
    }
}
