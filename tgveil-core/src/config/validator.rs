use crate::config::Config;
use crate::error::{Result, TgveilError};

/// Reject configurations that are internally inconsistent.
///
/// Called by [`super::loader::load_from_path`] right after deserialization;
/// never panics, always returns a descriptive [`TgveilError::Config`].
pub fn validate(cfg: &Config) -> Result<()> {
    if cfg.capture.tcp_ports.is_empty() && cfg.capture.udp_ports.is_empty() {
        return Err(TgveilError::Config(
            "capture.tcp_ports and capture.udp_ports cannot both be empty".into(),
        ));
    }
    if cfg.fragmentation.fragment_size == 0 {
        return Err(TgveilError::Config(
            "fragmentation.fragment_size must be > 0".into(),
        ));
    }
    if cfg.fragmentation.min_delay_ms > cfg.fragmentation.max_delay_ms {
        return Err(TgveilError::Config(
            "fragmentation.min_delay_ms cannot exceed max_delay_ms".into(),
        ));
    }
    if cfg.ip_refresh.cache_ttl_hours == 0 {
        return Err(TgveilError::Config(
            "ip_refresh.cache_ttl_hours must be > 0".into(),
        ));
    }
    for (low, high) in &cfg.targets.ranges {
        if crate::classify::ip_to_u32(low).is_none() {
            return Err(TgveilError::Config(format!(
                "targets.ranges: invalid low address {low}"
            )));
        }
        if crate::classify::ip_to_u32(high).is_none() {
            return Err(TgveilError::Config(format!(
                "targets.ranges: invalid high address {high}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn empty_port_lists_rejected() {
        let mut cfg = Config::default();
        cfg.capture.tcp_ports.clear();
        cfg.capture.udp_ports.clear();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn zero_fragment_size_rejected() {
        let mut cfg = Config::default();
        cfg.fragmentation.fragment_size = 0;
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn inverted_delay_bounds_rejected() {
        let mut cfg = Config::default();
        cfg.fragmentation.min_delay_ms = 50.0;
        cfg.fragmentation.max_delay_ms = 5.0;
        assert!(validate(&cfg).is_err());
    }
}
