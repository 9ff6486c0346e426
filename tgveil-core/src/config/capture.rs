use serde::Deserialize;

/// Destination ports the kernel intercept handle is opened with.
///
/// Mirrors the original tool's `TCP_PORTS`/`UDP_PORTS` lists, composed into a
/// single WinDivert filter expression by [`CaptureConfig::filter_expression`].
#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    #[serde(default = "default_tcp_ports")]
    pub tcp_ports: Vec<u16>,
    #[serde(default = "default_udp_ports")]
    pub udp_ports: Vec<u16>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        CaptureConfig {
            tcp_ports: default_tcp_ports(),
            udp_ports: default_udp_ports(),
        }
    }
}

impl CaptureConfig {
    /// Build the BPF-like filter string passed to the kernel intercept handle.
    ///
    /// e.g. `(tcp.DstPort == 443 or tcp.DstPort == 80) or (udp.DstPort == 3478)`
    pub fn filter_expression(&self) -> String {
        let tcp = self
            .tcp_ports
            .iter()
            .map(|p| format!("tcp.DstPort == {p}"))
            .collect::<Vec<_>>()
            .join(" or ");
        let udp = self
            .udp_ports
            .iter()
            .map(|p| format!("udp.DstPort == {p}"))
            .collect::<Vec<_>>()
            .join(" or ");
        match (tcp.is_empty(), udp.is_empty()) {
            (false, false) => format!("({tcp}) or ({udp})"),
            (false, true) => format!("({tcp})"),
            (true, false) => format!("({udp})"),
            (true, true) => "false".to_string(),
        }
    }
}

fn default_tcp_ports() -> Vec<u16> {
    vec![443, 80, 8080, 8443]
}

fn default_udp_ports() -> Vec<u16> {
    vec![3478, 5349, 9350, 10000, 10001, 10002, 10003]
}
