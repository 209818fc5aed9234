use std::iter;
use std::ptr;

use anyhow::{Result, bail};
use windows_sys::Win32::Foundation::{CloseHandle, ERROR_ALREADY_EXISTS, GetLastError, HANDLE};
use windows_sys::Win32::System::Threading::CreateMutexW;

/// Named mutex held for the lifetime of the process.
#[derive(Debug)]
pub struct InstanceGuard {
    handle: HANDLE,
}

impl InstanceGuard {
    /// Returns `None` when another process already holds `name`.
    pub fn acquire(name: &str) -> Result<Option<Self>> {
        let wide: Vec<u16> = name.encode_utf16().chain(iter::once(0)).collect();
        // SAFETY: `wide` is NUL-terminated; the returned handle is owned by the guard.
        let (handle, last_error) = unsafe {
            let handle = CreateMutexW(ptr::null(), 0, wide.as_ptr());
            (handle, GetLastError())
        };
        if handle.is_null() {
            bail!(
                "failed to create instance mutex {name}: {}",
                std::io::Error::from_raw_os_error(last_error as i32)
            );
        }
        if last_error == ERROR_ALREADY_EXISTS {
            // SAFETY: `handle` is a valid mutex handle that nothing else owns.
            unsafe {
                CloseHandle(handle);
            }
            return Ok(None);
        }
        Ok(Some(Self { handle }))
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        // SAFETY: the guard owns `handle` and closes it exactly once.
        unsafe {
            CloseHandle(self.handle);
        }
    }
}
