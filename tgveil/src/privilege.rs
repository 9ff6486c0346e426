//! Process-privilege check (§6): the kernel intercept handle can only be
//! opened by an elevated process. This lives in the binary crate, not the
//! core library — it is an OS-facing precondition, not part of the data
//! plane.

use tgveil_core::{Result, TgveilError};

#[cfg(windows)]
pub fn require_elevated() -> Result<()> {
    if is_elevated() {
        Ok(())
    } else {
        Err(TgveilError::Driver(
            "this process must run elevated (Administrator) to open the WinDivert handle".into(),
        ))
    }
}

#[cfg(windows)]
fn is_elevated() -> bool {
    // IsUserAnAdmin is the same check the original tool's ctypes binding used.
    #[allow(unsafe_code)]
    unsafe {
        windows_sys::Win32::UI::Shell::IsUserAnAdmin() != 0
    }
}

#[cfg(not(windows))]
pub fn require_elevated() -> Result<()> {
    Err(TgveilError::Driver(
        "tgveil requires Windows and the WinDivert driver; this platform is unsupported".into(),
    ))
}
