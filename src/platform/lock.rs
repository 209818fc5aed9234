use tracing::debug;

/// Reports whether the interactive desktop is locked.
pub trait LockProbe: Send + Sync {
    fn is_locked(&self) -> bool;
}

/// Probes the input desktop. When it cannot be opened the workstation is
/// considered locked.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopLockProbe;

#[cfg(windows)]
impl LockProbe for DesktopLockProbe {
    fn is_locked(&self) -> bool {
        use windows_sys::Win32::System::StationsAndDesktops::{
            CloseDesktop, DESKTOP_SWITCHDESKTOP, OpenInputDesktop,
        };

        // SAFETY: plain Win32 calls; the handle is closed before returning.
        let desktop = unsafe { OpenInputDesktop(0, 0, DESKTOP_SWITCHDESKTOP) };
        if desktop.is_null() {
            debug!(
                error = %std::io::Error::last_os_error(),
                "input desktop unavailable; treating workstation as locked"
            );
            return true;
        }
        unsafe {
            CloseDesktop(desktop);
        }
        false
    }
}

#[cfg(not(windows))]
impl LockProbe for DesktopLockProbe {
    fn is_locked(&self) -> bool {
        debug!("desktop lock detection unsupported on this platform");
        false
    }
}
