//! Detects a restarted Windows shell so a lost tray icon can be rebuilt.

use std::iter;
use std::ptr;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;
use windows_sys::Win32::UI::WindowsAndMessaging::FindWindowW;

const TASKBAR_CLASS: &str = "Shell_TrayWnd";

/// Remembers which taskbar window the tray icon was registered with.
#[derive(Debug, Default)]
pub struct ShellWatch {
    recorded: AtomicUsize,
}

impl ShellWatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle of the running taskbar, if any.
    pub fn current() -> Option<usize> {
        let class: Vec<u16> = TASKBAR_CLASS
            .encode_utf16()
            .chain(iter::once(0))
            .collect();
        // SAFETY: `class` is NUL-terminated and outlives the call.
        let hwnd = unsafe { FindWindowW(class.as_ptr(), ptr::null()) };
        if hwnd.is_null() {
            None
        } else {
            Some(hwnd as usize)
        }
    }

    /// Record the taskbar the icon was just added to.
    pub fn record(&self) {
        let handle = Self::current().unwrap_or(0);
        debug!(handle, "recorded taskbar window");
        self.recorded.store(handle, Ordering::SeqCst);
    }

    /// Forget the recorded taskbar so the next check fails.
    pub fn invalidate(&self) {
        self.recorded.store(0, Ordering::SeqCst);
    }

    /// False when the shell is gone or has been replaced since `record`.
    pub fn is_same_shell(&self) -> bool {
        let recorded = self.recorded.load(Ordering::SeqCst);
        recorded != 0 && Self::current() == Some(recorded)
    }
}
