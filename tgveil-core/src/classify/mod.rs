//! Target Identity Set and classifier (component B, §4.B).
//!
//! Three read-mostly relations — prefix set, range set, SNI pattern set —
//! consulted in SNI-first, range-second, prefix-third order. Refreshed once
//! at startup, never mutated while the intercept loop is running.

use crate::config::TargetsConfig;

/// Built-in data-center/CDN prefixes observed for the target messaging service.
const SEED_PREFIXES: &[&str] = &[
    "149.154.",
    "91.108.",
    "95.161.",
    "45.12.133.",
    "185.215.247.",
    "149.154.167.220",
];

/// Built-in closed IPv4 ranges.
const SEED_RANGES: &[(&str, &str)] = &[
    ("149.154.160.0", "149.154.175.255"),
    ("91.108.4.0", "91.108.19.255"),
    ("185.76.151.0", "185.76.151.255"),
];

/// Built-in case-insensitive SNI brand substrings.
const SEED_SNI_PATTERNS: &[&str] = &[
    "telegram",
    "teleg",
    "tg.dev",
    "t.me",
    "telegra.ph",
    "tdesktop.com",
    "mtproto",
];

/// Parse a dotted-quad IPv4 address into its big-endian 32-bit representation.
///
/// Returns `None` for anything that isn't exactly four octets in `0..=255`.
pub fn ip_to_u32(addr: &str) -> Option<u32> {
    let parsed: std::net::Ipv4Addr = addr.parse().ok()?;
    Some(u32::from_be_bytes(parsed.octets()))
}

#[derive(Debug, Clone)]
pub struct TargetSet {
    prefixes: Vec<String>,
    ranges: Vec<(u32, u32)>,
    sni_patterns: Vec<String>,
}

impl Default for TargetSet {
    fn default() -> Self {
        TargetSet {
            prefixes: SEED_PREFIXES.iter().map(|s| s.to_string()).collect(),
            ranges: SEED_RANGES
                .iter()
                .filter_map(|(lo, hi)| Some((ip_to_u32(lo)?, ip_to_u32(hi)?)))
                .collect(),
            sni_patterns: SEED_SNI_PATTERNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TargetSet {
    /// Union in the operator-supplied additions from the configuration file.
    /// Invalid range endpoints are skipped (the config validator should have
    /// already rejected such a config; this is a defensive no-op, not a
    /// second validation pass).
    pub fn union_config(&mut self, cfg: &TargetsConfig) {
        for prefix in &cfg.prefixes {
            if !self.prefixes.contains(prefix) {
                self.prefixes.push(prefix.clone());
            }
        }
        for (low, high) in &cfg.ranges {
            if let (Some(lo), Some(hi)) = (ip_to_u32(low), ip_to_u32(high)) {
                self.ranges.push((lo, hi));
            }
        }
        for pattern in &cfg.sni_patterns {
            let pattern = pattern.to_lowercase();
            if !self.sni_patterns.contains(&pattern) {
                self.sni_patterns.push(pattern);
            }
        }
    }

    /// Union in prefixes learned from the network refresh collaborator
    /// (§4.B, §10.4). Called at most once, before the intercept loop starts.
    pub fn union_prefixes<I: IntoIterator<Item = String>>(&mut self, prefixes: I) {
        for prefix in prefixes {
            if !self.prefixes.contains(&prefix) {
                self.prefixes.push(prefix);
            }
        }
    }

    pub fn prefix_count(&self) -> usize {
        self.prefixes.len()
    }

    /// Decide whether `dest_addr` (with optional SNI) belongs to the target
    /// service: SNI substring match, then range membership, then prefix
    /// match, in that order (§4.B).
    pub fn is_target(&self, dest_addr: &str, sni: Option<&str>) -> bool {
        if let Some(sni) = sni {
            let lower = sni.to_lowercase();
            if self.sni_patterns.iter().any(|p| lower.contains(p.as_str())) {
                return true;
            }
        }

        if let Some(addr) = ip_to_u32(dest_addr) {
            if self.ranges.iter().any(|(lo, hi)| addr >= *lo && addr <= *hi) {
                return true;
            }
        }

        self.prefixes.iter().any(|p| dest_addr.starts_with(p.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_by_sni_substring() {
        let set = TargetSet::default();
        assert!(set.is_target("8.8.8.8", Some("www.Telegram.org")));
    }

    #[test]
    fn matches_by_range() {
        let set = TargetSet::default();
        assert!(set.is_target("149.154.170.1", None));
    }

    #[test]
    fn matches_by_prefix() {
        let set = TargetSet::default();
        assert!(set.is_target("91.108.5.200", None));
    }

    #[test]
    fn non_target_returns_false() {
        let set = TargetSet::default();
        assert!(!set.is_target("8.8.8.8", Some("example.com")));
    }

    #[test]
    fn union_config_extends_without_duplicating() {
        let mut set = TargetSet::default();
        let before = set.prefix_count();
        let cfg = TargetsConfig {
            prefixes: vec!["149.154.".to_string(), "203.0.113.".to_string()],
            ranges: vec![],
            sni_patterns: vec![],
        };
        set.union_config(&cfg);
        assert_eq!(set.prefix_count(), before + 1);
        assert!(set.is_target("203.0.113.9", None));
    }

    #[test]
    fn union_prefixes_from_refresh_is_additive() {
        let mut set = TargetSet::default();
        assert!(!set.is_target("198.51.100.1", None));
        set.union_prefixes(vec!["198.51.".to_string()]);
        assert!(set.is_target("198.51.100.1", None));
    }

    #[test]
    fn ip_to_u32_rejects_malformed_addresses() {
        assert_eq!(ip_to_u32("not.an.ip"), None);
        assert_eq!(ip_to_u32("1.2.3"), None);
        assert_eq!(ip_to_u32("1.2.3.4.5"), None);
        assert_eq!(ip_to_u32("1.2.3.256"), None);
        assert_eq!(ip_to_u32("10.0.0.1"), Some(u32::from_be_bytes([10, 0, 0, 1])));
    }

    #[test]
    fn classifier_is_monotonic_under_prefix_addition() {
        let mut narrow = TargetSet::default();
        narrow.prefixes.clear();
        narrow.ranges.clear();
        narrow.sni_patterns.clear();
        assert!(!narrow.is_target("203.0.113.9", None));
        narrow.union_prefixes(vec!["203.0.113.".to_string()]);
        assert!(narrow.is_target("203.0.113.9", None));
    }
}
