use serde::Deserialize;

use super::capture::CaptureConfig;
use super::fragmentation::FragmentationConfig;
use super::ip_refresh::IpRefreshConfig;
use super::logging::{LoggingConfig, MetricsConfig};
use super::targets::TargetsConfig;

/// Root configuration structure, loaded from a TOML file (§10.1).
///
/// Every section falls back to sensible defaults, so the tool runs with zero
/// configuration (matching the original script's dataclass defaults); only a
/// *present and malformed* file is fatal.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub fragmentation: FragmentationConfig,
    #[serde(default)]
    pub targets: TargetsConfig,
    #[serde(default)]
    pub ip_refresh: IpRefreshConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}
