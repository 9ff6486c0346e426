//! Real [`crate::intercept::KernelHandle`] implementation, backed by the
//! `windivert` crate's network-layer binding to the WinDivert driver.

use windivert::layer::NetworkLayer;
use windivert::prelude::*;

use crate::error::{Result, TgveilError};
use crate::intercept::KernelHandle;
use crate::packet::Packet;

/// Maximum frame size WinDivert will hand us for a single network-layer
/// capture (matches the driver's own internal limit).
const RECV_BUFFER_SIZE: usize = 65535;

pub struct WinDivertHandle {
    inner: WinDivert<NetworkLayer>,
}

impl WinDivertHandle {
    /// Open the kernel intercept handle with `filter` (§6's filter grammar).
    /// Fatal on failure — the caller should abort startup (§4.E, §7).
    pub fn open(filter: &str) -> Result<Self> {
        let inner = WinDivert::<NetworkLayer>::network(filter, 0, WinDivertFlags::new())
            .map_err(|e| TgveilError::Driver(format!("failed to open WinDivert handle: {e}")))?;
        Ok(WinDivertHandle { inner })
    }
}

impl KernelHandle for WinDivertHandle {
    type Token = WinDivertAddress<NetworkLayer>;

    fn recv(&mut self) -> Result<(Packet, Self::Token)> {
        let mut buffer = vec![0u8; RECV_BUFFER_SIZE];
        let captured = self
            .inner
            .recv(Some(&mut buffer))
            .map_err(|e| TgveilError::Driver(format!("recv failed: {e}")))?;

        let outbound = captured.address.outbound();
        let packet = Packet::from_raw(captured.data.into_owned(), outbound);
        Ok((packet, captured.address))
    }

    fn send(&mut self, packet: Packet, token: Self::Token) -> Result<()> {
        let outgoing = WinDivertPacket {
            data: packet.into_bytes().into(),
            address: token,
        };
        self.inner
            .send(&outgoing)
            .map_err(|e| TgveilError::Driver(format!("send failed: {e}")))?;
        Ok(())
    }
}
