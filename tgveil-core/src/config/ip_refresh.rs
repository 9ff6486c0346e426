use serde::Deserialize;

/// Configuration for the one-shot IP-list refresh collaborator (§4.B, §10.4).
#[derive(Debug, Deserialize, Clone)]
pub struct IpRefreshConfig {
    /// Disable the network refresh entirely and rely on the built-in seed set
    /// (plus any `[targets]` additions).
    #[serde(default)]
    pub enabled: bool,
    /// Authoritative prefix-list endpoints, tried in order.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<String>,
    /// On-disk JSON cache path. Defaults to the OS cache directory.
    #[serde(default)]
    pub cache_path: Option<String>,
    /// Cache time-to-live, in hours.
    #[serde(default = "default_ttl_hours")]
    pub cache_ttl_hours: u64,
    /// Request timeout for each endpoint, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for IpRefreshConfig {
    fn default() -> Self {
        IpRefreshConfig {
            enabled: true,
            endpoints: default_endpoints(),
            cache_path: None,
            cache_ttl_hours: default_ttl_hours(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoints() -> Vec<String> {
    vec![
        "https://api.bgpview.io/asn/62041/prefixes".to_string(),
        "https://ipinfo.io/AS62041/json".to_string(),
    ]
}

fn default_ttl_hours() -> u64 {
    24
}

fn default_timeout_secs() -> u64 {
    10
}
