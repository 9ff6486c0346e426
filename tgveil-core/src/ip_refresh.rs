//! One-shot IP-list refresh collaborator (§4.B, §10.4).
//!
//! Runs to completion before the intercept loop opens its kernel handle.
//! Tries a small on-disk JSON cache first (TTL-bounded), then falls back to
//! the network sources in order, unioning whatever each one returns.
//! Any failure here — cache miss, network error, malformed response — is
//! swallowed: the caller keeps the built-in seed set untouched.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::config::IpRefreshConfig;
use crate::error::{Result, TgveilError};

#[derive(Debug, Serialize, Deserialize)]
struct Cache {
    ips: Vec<String>,
    updated: u64,
}

/// Fetch the current prefix list, consulting the on-disk cache first.
///
/// Returns the learned prefixes (CIDR or bare dotted-quad strings, as
/// published by the upstream source — the caller reduces each to its
/// first two octets, per §4.B). Never returns `Err` to the caller of
/// [`refresh`]; `Err` here only distinguishes cache-vs-network misses for
/// logging.
pub fn refresh(cfg: &IpRefreshConfig) -> Vec<String> {
    if !cfg.enabled {
        return Vec::new();
    }

    let cache_path = cache_path(cfg);
    if let Some(ips) = load_cache_if_fresh(&cache_path, cfg.cache_ttl_hours) {
        return ips;
    }

    match fetch_from_network(cfg) {
        Ok(ips) if !ips.is_empty() => {
            let _ = save_cache(&cache_path, &ips);
            ips
        }
        _ => load_cache_ignoring_ttl(&cache_path).unwrap_or_default(),
    }
}

fn cache_path(cfg: &IpRefreshConfig) -> PathBuf {
    if let Some(path) = &cfg.cache_path {
        return PathBuf::from(path);
    }
    let base = dirs::cache_dir().unwrap_or_else(std::env::temp_dir);
    base.join("tgveil").join("target_ips.json")
}

fn load_cache_if_fresh(path: &Path, ttl_hours: u64) -> Option<Vec<String>> {
    let cache = read_cache(path)?;
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs();
    let age = now.saturating_sub(cache.updated);
    if age < ttl_hours.saturating_mul(3600) {
        Some(cache.ips)
    } else {
        None
    }
}

fn load_cache_ignoring_ttl(path: &Path) -> Option<Vec<String>> {
    read_cache(path).map(|c| c.ips)
}

fn read_cache(path: &Path) -> Option<Cache> {
    let text = fs::read_to_string(path).ok()?;
    serde_json::from_str(&text).ok()
}

fn save_cache(path: &Path, ips: &[String]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(TgveilError::Io)?;
    }
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs();
    let cache = Cache { ips: ips.to_vec(), updated: now };
    let text = serde_json::to_string_pretty(&cache)
        .map_err(|e| TgveilError::Refresh(format!("failed to serialize cache: {e}")))?;
    fs::write(path, text).map_err(TgveilError::Io)
}

fn fetch_from_network(cfg: &IpRefreshConfig) -> Result<Vec<String>> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(cfg.request_timeout_secs))
        .user_agent("tgveil/0.1")
        .build()
        .map_err(|e| TgveilError::Refresh(format!("failed to build HTTP client: {e}")))?;

    let mut prefixes = std::collections::BTreeSet::new();
    for endpoint in &cfg.endpoints {
        if let Ok(found) = fetch_one(&client, endpoint) {
            prefixes.extend(found);
        }
    }

    if prefixes.is_empty() {
        return Err(TgveilError::Refresh(
            "no endpoint returned a usable prefix list".into(),
        ));
    }
    Ok(prefixes.into_iter().collect())
}

fn fetch_one(client: &reqwest::blocking::Client, url: &str) -> Result<Vec<String>> {
    let body: serde_json::Value = client
        .get(url)
        .send()
        .map_err(|e| TgveilError::Refresh(format!("{url}: {e}")))?
        .json()
        .map_err(|e| TgveilError::Refresh(format!("{url}: bad JSON: {e}")))?;

    // BGPView shape: {"data": {"ipv4_prefixes": [{"prefix": "..."}]}}
    if let Some(prefixes) = body
        .get("data")
        .and_then(|d| d.get("ipv4_prefixes"))
        .and_then(|p| p.as_array())
    {
        let ips = prefixes
            .iter()
            .filter_map(|p| p.get("prefix")?.as_str())
            .map(str::to_string)
            .collect();
        return Ok(ips);
    }

    // ipinfo.io shape: {"prefixes": [{"netblock": "..."}]}
    if let Some(prefixes) = body.get("prefixes").and_then(|p| p.as_array()) {
        let ips = prefixes
            .iter()
            .filter_map(|p| p.get("netblock")?.as_str())
            .map(str::to_string)
            .collect();
        return Ok(ips);
    }

    Err(TgveilError::Refresh(format!(
        "{url}: response did not match any known source shape"
    )))
}

/// Reduce a CIDR or bare IPv4 address to its `A.B.` prefix form, as unioned
/// into the classifier's prefix set (§4.B).
pub fn to_two_octet_prefix(addr_or_cidr: &str) -> Option<String> {
    let addr = addr_or_cidr.split('/').next()?;
    let mut parts = addr.splitn(3, '.');
    let a = parts.next()?;
    let b = parts.next()?;
    if a.parse::<u8>().is_err() || b.parse::<u8>().is_err() {
        return None;
    }
    Some(format!("{a}.{b}."))
}
