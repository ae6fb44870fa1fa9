//! Windows memory reader implementation

#![cfg(target_os = "windows")]

use super::MemoryReader;
use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::Threading::GetExitCodeProcess;

// STILL_ACTIVE is 259 (STATUS_PENDING)
const STILL_ACTIVE: u32 = 259;

/// Windows-specific memory reader using ReadProcessMemory
///
/// Owns the process handle and closes it on drop.
pub struct WindowsMemoryReader {
    handle: HANDLE,
}

impl WindowsMemoryReader {
    /// Take ownership of an opened process handle
    pub fn new(handle: HANDLE) -> Self {
        Self { handle }
    }

    /// Get the underlying handle
    pub fn handle(&self) -> HANDLE {
        self.handle
    }
}

impl MemoryReader for WindowsMemoryReader {
    fn read_bytes(&self, address: usize, size: usize) -> Option<Vec<u8>> {
        let mut buffer = vec![0u8; size];
        let mut bytes_read = 0;

        let result = unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const _,
                buffer.as_mut_ptr() as *mut _,
                size,
                Some(&mut bytes_read),
            )
        };

        if result.is_ok() && bytes_read == size {
            Some(buffer)
        } else {
            None
        }
    }

    fn is_valid(&self) -> bool {
        if self.handle.is_invalid() {
            return false;
        }
        let mut exit_code = 0u32;
        unsafe { GetExitCodeProcess(self.handle, &mut exit_code).is_ok() && exit_code == STILL_ACTIVE }
    }
}

impl Drop for WindowsMemoryReader {
    fn drop(&mut self) {
        if !self.handle.is_invalid() {
            unsafe {
                let _ = CloseHandle(self.handle);
            }
        }
    }
}

// HANDLE is not Send/Sync by default; the handle is only used for reads,
// which ReadProcessMemory allows from any thread.
unsafe impl Send for WindowsMemoryReader {}
unsafe impl Sync for WindowsMemoryReader {}
