//! Forged-RST defense (component D, §4.D).
//!
//! DPI middleboxes commonly tear down a classified connection by injecting
//! a spoofed RST. The heuristic here drops any inbound RST whose source
//! port is one of the target service's well-known ports; real RSTs from
//! the peer are rare during an active flow and the cost of dropping one is
//! bounded to a connection retry.

use crate::packet::{Packet, Transport};

const TARGET_SERVICE_PORTS: &[u16] = &[443, 80, 8080, 8443];

/// Returns `true` if `packet` should be dropped rather than re-injected.
pub fn should_drop(packet: &Packet) -> bool {
    !packet.outbound
        && packet.transport() == Transport::Tcp
        && packet.tcp_flags().rst
        && TARGET_SERVICE_PORTS.contains(&packet.src_port())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tcp_packet(outbound: bool, src_port: u16, rst: bool) -> Packet {
        let mut buf = vec![0u8; 40];
        buf[0] = 0x45;
        buf[9] = 6;
        let tcp = &mut buf[20..];
        tcp[0..2].copy_from_slice(&src_port.to_be_bytes());
        tcp[12] = 5 << 4;
        tcp[13] = if rst { 0x04 } else { 0x10 };
        Packet::from_raw(buf, outbound)
    }

    #[test]
    fn drops_inbound_rst_from_target_port() {
        let pkt = tcp_packet(false, 443, true);
        assert!(should_drop(&pkt));
    }

    #[test]
    fn passes_non_rst_packets() {
        let pkt = tcp_packet(false, 443, false);
        assert!(!should_drop(&pkt));
    }

    #[test]
    fn passes_outbound_rst() {
        let pkt = tcp_packet(true, 443, true);
        assert!(!should_drop(&pkt));
    }

    #[test]
    fn passes_inbound_rst_from_unrelated_port() {
        let pkt = tcp_packet(false, 22, true);
        assert!(!should_drop(&pkt));
    }
}
