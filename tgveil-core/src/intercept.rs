//! Intercept loop (component E, §4.E) — the single-threaded dispatch loop
//! that ties the other four components together.
//!
//! Generic over [`KernelHandle`] so the dispatch logic can be exercised
//! without an actual WinDivert driver; [`crate::kernel::WinDivertHandle`] is
//! the real implementation, gated to `cfg(windows)`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::classify::TargetSet;
use crate::config::FragmentationConfig;
use crate::error::Result;
use crate::packet::{Packet, Transport};
use crate::rst_guard;
use crate::splitter::{self, Injector, Strategy};
use crate::stats::Stats;
use crate::tls;

/// A captured packet's kernel-side re-injection context (interface, flow
/// direction, and anything else the driver needs to route it back out).
/// Opaque to everything above this trait; must be cheap to clone, since a
/// split flow re-injects the same captured context twice.
pub trait KernelHandle {
    type Token: Clone;

    /// Block until the next packet is available.
    fn recv(&mut self) -> Result<(Packet, Self::Token)>;

    /// Re-inject (or drop, if the caller never calls this) a packet using
    /// the token it was captured with.
    fn send(&mut self, packet: Packet, token: Self::Token) -> Result<()>;
}

struct HandleInjector<'a, H: KernelHandle> {
    handle: &'a mut H,
    token: H::Token,
}

impl<'a, H: KernelHandle> Injector for HandleInjector<'a, H> {
    fn inject(&mut self, packet: Packet) -> Result<()> {
        self.handle.send(packet, self.token.clone())
    }
}

fn ip_to_string(addr: [u8; 4]) -> String {
    format!("{}.{}.{}.{}", addr[0], addr[1], addr[2], addr[3])
}

/// Run the dispatch loop until `running` is cleared. Blocks on
/// `handle.recv()` and, for split flows, on the splitter's inter-segment
/// sleep — the two suspension points from §5.
pub fn run<H: KernelHandle>(
    handle: &mut H,
    running: &Arc<AtomicBool>,
    targets: &TargetSet,
    frag_cfg: &FragmentationConfig,
    stats: &Stats,
) -> Result<()> {
    while running.load(Ordering::Relaxed) {
        let (packet, token) = handle.recv()?;
        dispatch(packet, token, handle, targets, frag_cfg, stats);
    }
    Ok(())
}

fn dispatch<H: KernelHandle>(
    packet: Packet,
    token: H::Token,
    handle: &mut H,
    targets: &TargetSet,
    frag_cfg: &FragmentationConfig,
    stats: &Stats,
) {
    stats.record_total();

    match packet.transport() {
        Transport::Tcp => dispatch_tcp(packet, token, handle, targets, frag_cfg, stats),
        Transport::Udp => {
            stats.record_udp_seen();
            if let Err(e) = handle.send(packet, token) {
                stats.record_error();
                tracing::warn!(error = %e, "re-injection of UDP packet failed");
            }
        }
        Transport::Other => {
            if let Err(e) = handle.send(packet, token) {
                stats.record_error();
                tracing::warn!(error = %e, "re-injection of non-IP/unrecognized packet failed");
            }
        }
    }
}

fn dispatch_tcp<H: KernelHandle>(
    packet: Packet,
    token: H::Token,
    handle: &mut H,
    targets: &TargetSet,
    frag_cfg: &FragmentationConfig,
    stats: &Stats,
) {
    if rst_guard::should_drop(&packet) {
        stats.record_rst_blocked();
        return;
    }

    let payload = packet.tcp_payload();
    if payload.is_empty() {
        if let Err(e) = handle.send(packet, token) {
            stats.record_error();
            tracing::warn!(error = %e, "re-injection of empty-payload TCP packet failed");
        }
        return;
    }

    let mut sni = None;
    if tls::is_client_hello(payload) {
        stats.record_tls_record_seen();
        sni = tls::parse_sni(payload);
        if let Some(name) = &sni {
            if name.to_lowercase().contains("telegram") {
                stats.record_target_flagged();
            }
        }
    }

    let dst = ip_to_string(packet.dst_ip());
    if targets.is_target(&dst, sni.as_deref()) {
        let strategy = if frag_cfg.adaptive {
            Strategy::Adaptive
        } else {
            Strategy::Fixed { k: frag_cfg.fragment_size, d_ms: frag_cfg.delay_ms }
        };
        let mut injector = HandleInjector { handle, token };
        if let Err(e) = splitter::split_and_inject(packet, strategy, frag_cfg, &mut injector, stats) {
            stats.record_error();
            tracing::warn!(error = %e, "segment split failed, original packet re-injected unchanged");
        }
    } else if let Err(e) = handle.send(packet, token) {
        stats.record_error();
        tracing::warn!(error = %e, "re-injection of non-target packet failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TgveilError;

    struct MockHandle {
        inbox: Vec<(Packet, bool)>,
        outbox: Vec<Packet>,
    }

    impl KernelHandle for MockHandle {
        type Token = bool;

        fn recv(&mut self) -> Result<(Packet, bool)> {
            self.inbox
                .pop()
                .ok_or_else(|| TgveilError::Driver("no more packets".into()))
        }

        fn send(&mut self, packet: Packet, _token: bool) -> Result<()> {
            self.outbox.push(packet);
            Ok(())
        }
    }

    fn tcp_packet(dst: [u8; 4], payload: &[u8]) -> Packet {
        let mut buf = vec![0u8; 40];
        buf[0] = 0x45;
        buf[9] = 6;
        buf[12..16].copy_from_slice(&[10, 0, 0, 1]);
        buf[16..20].copy_from_slice(&dst);
        buf[20 + 12] = 5 << 4;
        buf[20 + 13] = 0x18; // ACK + PSH
        let mut pkt = Packet::from_raw(buf, true);
        pkt.set_tcp_payload(payload);
        pkt
    }

    #[test]
    fn non_target_tcp_is_passed_through_unchanged() {
        let targets = TargetSet::default();
        let stats = Stats::default();
        let pkt = tcp_packet([8, 8, 8, 8], b"plain http body, not a target");
        let mut handle = MockHandle { inbox: vec![(pkt, true)], outbox: vec![] };
        dispatch(
            handle.inbox.pop().unwrap().0,
            true,
            &mut handle,
            &targets,
            &FragmentationConfig::default(),
            &stats,
        );
        assert_eq!(handle.outbox.len(), 1);
        assert_eq!(stats.snapshot().total, 1);
    }

    #[test]
    fn target_flow_triggers_split() {
        let targets = TargetSet::default();
        let stats = Stats::default();
        let long_payload: Vec<u8> = (0u8..=255).cycle().take(2000).collect();
        let pkt = tcp_packet([149, 154, 167, 1], &long_payload);
        let mut handle = MockHandle { inbox: vec![], outbox: vec![] };
        dispatch(pkt, true, &mut handle, &targets, &FragmentationConfig::default(), &stats);
        assert_eq!(handle.outbox.len(), 2, "target flow must split into two segments");
        assert_eq!(stats.snapshot().fragmented, 1);
    }
}
