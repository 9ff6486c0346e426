use std::fs;
use std::path::Path;

use crate::config::{validator, Config};
use crate::error::{Result, TgveilError};

/// Load and validate the configuration file at `p`.
///
/// A missing file is not fatal: the tool falls back to an all-defaults
/// [`Config`]. A file that exists but fails to parse, or fails validation,
/// is fatal — the caller should abort startup before opening the kernel
/// intercept handle.
pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config> {
    let path = p.as_ref();
    if !path.exists() {
        let cfg = Config::default();
        validator::validate(&cfg)?;
        return Ok(cfg);
    }

    let txt = fs::read_to_string(path)
        .map_err(|e| TgveilError::Config(format!("failed to read config file: {e}")))?;
    let cfg: Config = toml::from_str(&txt)
        .map_err(|e| TgveilError::Config(format!("failed to parse config: {e}")))?;

    validator::validate(&cfg)?;
    Ok(cfg)
}
