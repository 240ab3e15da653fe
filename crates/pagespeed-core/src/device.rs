use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Device strategy a report was measured with.
///
/// Doubles as the `strategy` query value sent to the `PageSpeed` API and as the
/// top-level key of a persisted report store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Mobile,
    Desktop,
}

impl DeviceType {
    /// Both strategies, mobile first. Flattened tables follow this order.
    pub const ALL: [DeviceType; 2] = [DeviceType::Mobile, DeviceType::Desktop];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Desktop => "desktop",
        }
    }
}

impl std::fmt::Display for DeviceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mobile" => Ok(DeviceType::Mobile),
            "desktop" => Ok(DeviceType::Desktop),
            _ => Err(ConfigError::InvalidDeviceType(s.to_string())),
        }
    }
}
