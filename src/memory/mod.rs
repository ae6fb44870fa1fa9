//! Cross-platform memory operations
//!
//! This module provides platform-agnostic abstractions for memory reading,
//! with implementations for Windows and Linux, plus the pieces that turn a
//! freshly attached process into a set of named, typed addresses.

#[cfg(target_os = "windows")]
mod windows;

#[cfg(target_os = "linux")]
mod linux;

mod pattern;
mod pointer;
mod process;
mod resolver;
mod traits;

pub use pattern::{extract_relative_address, parse_pattern, scan_pattern};
pub use pointer::Pointer;
pub use process::{find_process, find_process_by_names, is_process_running, ProcessInfo};
pub use resolver::{AddressResolver, NamedPointers, ResolutionTask, StaticAddressResolver};
pub use traits::{MockMemoryReader, MockProcessFinder, ProcessFinder, SystemProcessFinder};

#[cfg(target_os = "windows")]
pub use windows::WindowsMemoryReader;

#[cfg(target_os = "linux")]
pub use linux::LinuxMemoryReader;

use std::sync::Arc;

/// Managed strings longer than this are treated as garbage reads
pub const MAX_STRING_CHARS: usize = 1024;

/// Offset of the `length` field inside a managed string object
pub const STRING_LENGTH_OFFSET: usize = 0x10;

/// Offset of the first UTF-16 code unit inside a managed string object
pub const STRING_CHARS_OFFSET: usize = 0x14;

/// Platform-agnostic memory reading trait
pub trait MemoryReader: Send + Sync {
    /// Read raw bytes from memory
    fn read_bytes(&self, address: usize, size: usize) -> Option<Vec<u8>>;

    /// Check if the reader is still valid (process still running)
    fn is_valid(&self) -> bool {
        true
    }

    /// Read a u8 value
    fn read_u8(&self, address: usize) -> Option<u8> {
        self.read_bytes(address, 1).map(|b| b[0])
    }

    /// Read an i32 value (little-endian)
    fn read_i32(&self, address: usize) -> Option<i32> {
        self.read_bytes(address, 4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a u32 value (little-endian)
    fn read_u32(&self, address: usize) -> Option<u32> {
        self.read_bytes(address, 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read an i64 value (little-endian)
    fn read_i64(&self, address: usize) -> Option<i64> {
        self.read_bytes(address, 8).map(|b| {
            i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })
    }

    /// Read a u64 value (little-endian)
    fn read_u64(&self, address: usize) -> Option<u64> {
        self.read_bytes(address, 8).map(|b| {
            u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
        })
    }

    /// Read a f32 value
    fn read_f32(&self, address: usize) -> Option<f32> {
        self.read_bytes(address, 4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a 64-bit pointer
    fn read_ptr(&self, address: usize) -> Option<usize> {
        self.read_u64(address).map(|v| v as usize)
    }

    /// Read a boolean (non-zero = true)
    fn read_bool(&self, address: usize) -> Option<bool> {
        self.read_u8(address).map(|v| v != 0)
    }

    /// Read a managed (length-prefixed UTF-16) string object
    fn read_managed_string(&self, object: usize) -> Option<String> {
        if object == 0 {
            return None;
        }
        let len = self.read_i32(object + STRING_LENGTH_OFFSET)?;
        if len < 0 || len as usize > MAX_STRING_CHARS {
            return None;
        }
        if len == 0 {
            return Some(String::new());
        }
        let bytes = self.read_bytes(object + STRING_CHARS_OFFSET, len as usize * 2)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        Some(String::from_utf16_lossy(&units))
    }
}

/// A fixed-size value that can be decoded from little-endian process memory
pub trait Readable: Sized {
    /// Number of bytes occupied in the target process
    const SIZE: usize;

    /// Decode from exactly `SIZE` bytes
    fn from_le_slice(bytes: &[u8]) -> Self;
}

/// Read any [`Readable`] value at an absolute address
pub fn read_value<T: Readable>(reader: &dyn MemoryReader, address: usize) -> Option<T> {
    let bytes = reader.read_bytes(address, T::SIZE)?;
    if bytes.len() < T::SIZE {
        return None;
    }
    Some(T::from_le_slice(&bytes))
}

/// Decode the `index`th little-endian f32 of a byte slice
pub(crate) fn f32_at(bytes: &[u8], index: usize) -> f32 {
    let o = index * 4;
    f32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]])
}

impl Readable for bool {
    const SIZE: usize = 1;
    fn from_le_slice(bytes: &[u8]) -> Self {
        bytes[0] != 0
    }
}

impl Readable for i32 {
    const SIZE: usize = 4;
    fn from_le_slice(bytes: &[u8]) -> Self {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

impl Readable for f32 {
    const SIZE: usize = 4;
    fn from_le_slice(bytes: &[u8]) -> Self {
        f32_at(bytes, 0)
    }
}

impl Readable for usize {
    const SIZE: usize = 8;
    fn from_le_slice(bytes: &[u8]) -> Self {
        u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ]) as usize
    }
}

/// Context for a connected process
#[derive(Clone)]
pub struct ProcessContext {
    /// Memory reader for this process (shared with the game model and resolver thread)
    pub reader: Arc<dyn MemoryReader>,
    /// Process name as reported by the OS
    pub name: String,
    /// Base address of the main module
    pub base_address: usize,
    /// Size of the main module
    pub module_size: usize,
    /// Process ID
    pub process_id: u32,
    /// Whether this is a 64-bit process
    pub is_64_bit: bool,
}

impl ProcessContext {
    /// Create a new process context from discovered process info
    pub fn new(reader: Arc<dyn MemoryReader>, info: &ProcessInfo) -> Self {
        Self {
            reader,
            name: info.name.clone(),
            base_address: info.base_address,
            module_size: info.module_size,
            process_id: info.pid,
            is_64_bit: info.is_64_bit,
        }
    }

    /// Get a clone of the reader Arc
    pub fn reader(&self) -> Arc<dyn MemoryReader> {
        self.reader.clone()
    }

    /// Whether the process is still alive
    pub fn is_alive(&self) -> bool {
        self.reader.is_valid()
    }

    /// Scan for a pattern in the main module
    pub fn scan_pattern(&self, pattern: &[Option<u8>]) -> Option<usize> {
        scan_pattern(&*self.reader, self.base_address, self.module_size, pattern)
    }
}

impl std::fmt::Debug for ProcessContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessContext")
            .field("name", &self.name)
            .field("process_id", &self.process_id)
            .field("base_address", &format_args!("0x{:X}", self.base_address))
            .field("module_size", &format_args!("0x{:X}", self.module_size))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_managed_string() {
        let reader = MockMemoryReader::new();
        reader.write_managed_string(0x5000, "lvl_HallOfDoors");

        assert_eq!(
            reader.read_managed_string(0x5000),
            Some("lvl_HallOfDoors".to_string())
        );
    }

    #[test]
    fn test_read_managed_string_empty_and_null() {
        let reader = MockMemoryReader::new();
        reader.write_managed_string(0x5000, "");

        assert_eq!(reader.read_managed_string(0x5000), Some(String::new()));
        assert_eq!(reader.read_managed_string(0), None);
    }

    #[test]
    fn test_read_managed_string_rejects_garbage_length() {
        let reader = MockMemoryReader::new();
        reader.write_i32(0x5000 + STRING_LENGTH_OFFSET, -4);
        assert_eq!(reader.read_managed_string(0x5000), None);

        reader.write_i32(0x6000 + STRING_LENGTH_OFFSET, 1_000_000);
        assert_eq!(reader.read_managed_string(0x6000), None);
    }

    #[test]
    fn test_read_value_types() {
        let reader = MockMemoryReader::new();
        reader.write_f32(0x1000, 1.5);
        reader.write_i32(0x1010, -7);
        reader.write_ptr(0x1020, 0x7FF0_0000_1234);
        reader.write_u8(0x1030, 1);

        assert_eq!(read_value::<f32>(&reader, 0x1000), Some(1.5));
        assert_eq!(read_value::<i32>(&reader, 0x1010), Some(-7));
        assert_eq!(read_value::<usize>(&reader, 0x1020), Some(0x7FF0_0000_1234));
        assert_eq!(read_value::<bool>(&reader, 0x1030), Some(true));
        assert_eq!(read_value::<i32>(&reader, 0x9999), None);
    }
}
