//! Adaptive TCP segment splitting (component C, §4.C) — the core of the
//! bypass technique. Rewrites one payload-bearing TCP segment into two,
//! with a brief pause in between, so that a DPI middlebox inspecting a
//! single segment cannot see the SNI contiguously.

use std::thread;
use std::time::Duration;

use crate::config::FragmentationConfig;
use crate::error::{Result, TgveilError};
use crate::packet::Packet;
use crate::stats::Stats;

/// How to pick `(k, d)` for a given payload.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    /// Fixed first-fragment size and delay, e.g. from `--fragment-size`/`--delay`.
    Fixed { k: usize, d_ms: f64 },
    /// Size-bucketed selection per §4.C's table.
    Adaptive,
}

/// Size-bucketed `(k, d)` table from §4.C.
fn adaptive_params(payload_len: usize) -> (usize, f64) {
    if payload_len < 1024 {
        (1, 10.0)
    } else if payload_len < 50 * 1024 {
        (8, 5.0)
    } else if payload_len < 500 * 1024 {
        (100, 2.0)
    } else {
        (500, 1.0)
    }
}

fn resolve(strategy: Strategy, payload_len: usize, cfg: &FragmentationConfig) -> (usize, f64) {
    match strategy {
        Strategy::Fixed { k, d_ms } => (k, cfg.clamp_delay(d_ms)),
        Strategy::Adaptive => {
            let (k, d) = adaptive_params(payload_len);
            (k, cfg.clamp_delay(d))
        }
    }
}

/// Anything that can re-inject a rewritten packet into the network stack.
/// The intercept loop implements this over the kernel handle; tests use an
/// in-memory `Vec<Packet>`.
pub trait Injector {
    fn inject(&mut self, packet: Packet) -> Result<()>;
}

/// Split `packet`'s payload according to `strategy` and re-inject both
/// halves through `injector`. On success the splitter has fully consumed
/// `packet` (re-injected as two segments); on failure it makes a best-effort
/// attempt to re-inject the packet unchanged and returns `Err`.
pub fn split_and_inject<I: Injector>(
    mut packet: Packet,
    strategy: Strategy,
    cfg: &FragmentationConfig,
    injector: &mut I,
    stats: &Stats,
) -> Result<()> {
    let payload = packet.tcp_payload().to_vec();
    let (k, d_ms) = resolve(strategy, payload.len(), cfg);

    if payload.len() <= k {
        stats.record_passed();
        return injector.inject(packet);
    }

    match try_split(&mut packet, &payload, k, d_ms, injector) {
        Ok(()) => {
            stats.record_fragmented(payload.len());
            Ok(())
        }
        Err(e) => {
            stats.record_split_error();
            let mut fallback = packet;
            fallback.set_tcp_payload(&payload);
            fallback.recompute_checksums();
            if injector.inject(fallback).is_err() {
                stats.record_error();
            }
            Err(e)
        }
    }
}

fn try_split<I: Injector>(
    packet: &mut Packet,
    payload: &[u8],
    k: usize,
    d_ms: f64,
    injector: &mut I,
) -> Result<()> {
    let seq0 = packet.seq();
    let original_psh = packet.tcp_flags().psh;
    let (head, tail) = payload.split_at(k);

    let mut segment1 = packet.clone();
    segment1.set_tcp_payload(head);
    segment1.set_psh(false);
    segment1.recompute_checksums();
    injector.inject(segment1)?;

    if d_ms > 0.0 {
        thread::sleep(Duration::from_secs_f64(d_ms / 1000.0));
    }

    let mut segment2 = packet.clone();
    segment2.set_seq(seq0.wrapping_add(k as u32));
    segment2.set_tcp_payload(tail);
    segment2.set_psh(original_psh);
    segment2.recompute_checksums();
    injector.inject(segment2)?;

    Ok(())
}
