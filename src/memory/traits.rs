//! Traits for finding and attaching to processes
//!
//! These traits allow for dependency injection, enabling mock implementations
//! for testing without requiring actual running processes.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use super::{MemoryReader, ProcessContext, ProcessInfo, STRING_CHARS_OFFSET, STRING_LENGTH_OFFSET};
use crate::error::{AutosplitterError, Result};

/// Trait for finding and attaching to processes
pub trait ProcessFinder: Send + Sync {
    /// Find a process by name from a list of target names
    fn find_process(&self, target_names: &[&str]) -> Option<ProcessInfo>;

    /// Open a process and create a memory reader
    fn open_process(&self, info: &ProcessInfo) -> Option<Arc<dyn MemoryReader>>;

    /// Find and open the first matching process
    fn attach(&self, target_names: &[&str]) -> Result<ProcessContext> {
        let info = self.find_process(target_names).ok_or_else(|| {
            AutosplitterError::ProcessNotFound(target_names.iter().map(|s| s.to_string()).collect())
        })?;
        let reader = self
            .open_process(&info)
            .ok_or(AutosplitterError::ProcessOpenFailed { pid: info.pid })?;
        Ok(ProcessContext::new(reader, &info))
    }
}

/// Process finder backed by the operating system
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessFinder;

impl ProcessFinder for SystemProcessFinder {
    fn find_process(&self, target_names: &[&str]) -> Option<ProcessInfo> {
        super::find_process_by_names(target_names)
    }

    #[cfg(target_os = "linux")]
    fn open_process(&self, info: &ProcessInfo) -> Option<Arc<dyn MemoryReader>> {
        Some(Arc::new(super::LinuxMemoryReader::new(info.pid as i32)))
    }

    #[cfg(target_os = "windows")]
    fn open_process(&self, info: &ProcessInfo) -> Option<Arc<dyn MemoryReader>> {
        use windows::Win32::System::Threading::{
            OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
        };

        let handle =
            unsafe { OpenProcess(PROCESS_VM_READ | PROCESS_QUERY_INFORMATION, false, info.pid) }.ok()?;
        Some(Arc::new(super::WindowsMemoryReader::new(handle)))
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux")))]
    fn open_process(&self, _info: &ProcessInfo) -> Option<Arc<dyn MemoryReader>> {
        None
    }
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

#[derive(Default)]
struct MockMemory {
    bytes: RwLock<BTreeMap<usize, u8>>,
    reads: AtomicUsize,
    valid: AtomicBool,
}

/// Mock memory reader backed by a sparse byte map
///
/// Clones share the same memory, so a test can keep one handle to mutate
/// "game memory" while the autosplitter reads through another. Every
/// `read_bytes` call is counted.
#[derive(Clone)]
pub struct MockMemoryReader {
    inner: Arc<MockMemory>,
}

impl Default for MockMemoryReader {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMemoryReader {
    /// Create a new, empty mock memory reader
    pub fn new() -> Self {
        let inner = MockMemory::default();
        inner.valid.store(true, Ordering::SeqCst);
        Self { inner: Arc::new(inner) }
    }

    /// Write bytes to mock memory
    pub fn write_bytes(&self, address: usize, data: &[u8]) {
        let mut bytes = self.inner.bytes.write();
        for (i, b) in data.iter().enumerate() {
            bytes.insert(address + i, *b);
        }
    }

    /// Unmap a range of mock memory
    pub fn unmap(&self, address: usize, len: usize) {
        let mut bytes = self.inner.bytes.write();
        for a in address..address + len {
            bytes.remove(&a);
        }
    }

    /// Write a u8 to mock memory
    pub fn write_u8(&self, address: usize, value: u8) {
        self.write_bytes(address, &[value]);
    }

    /// Write a bool to mock memory
    pub fn write_bool(&self, address: usize, value: bool) {
        self.write_u8(address, value as u8);
    }

    /// Write an i32 to mock memory
    pub fn write_i32(&self, address: usize, value: i32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a u32 to mock memory
    pub fn write_u32(&self, address: usize, value: u32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write an f32 to mock memory
    pub fn write_f32(&self, address: usize, value: f32) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a u64 to mock memory
    pub fn write_u64(&self, address: usize, value: u64) {
        self.write_bytes(address, &value.to_le_bytes());
    }

    /// Write a pointer to mock memory
    pub fn write_ptr(&self, address: usize, value: usize) {
        self.write_u64(address, value as u64);
    }

    /// Write a managed string object (length + UTF-16 chars) at `object`
    pub fn write_managed_string(&self, object: usize, value: &str) {
        let units: Vec<u16> = value.encode_utf16().collect();
        self.write_i32(object + STRING_LENGTH_OFFSET, units.len() as i32);
        let bytes: Vec<u8> = units.iter().flat_map(|u| u.to_le_bytes()).collect();
        self.write_bytes(object + STRING_CHARS_OFFSET, &bytes);
    }

    /// Number of `read_bytes` calls served so far
    pub fn reads(&self) -> usize {
        self.inner.reads.load(Ordering::SeqCst)
    }

    /// Reset the read counter
    pub fn reset_reads(&self) {
        self.inner.reads.store(0, Ordering::SeqCst);
    }

    /// Invalidate the process (simulate process exit)
    pub fn invalidate(&self) {
        self.inner.valid.store(false, Ordering::SeqCst);
    }
}

impl MemoryReader for MockMemoryReader {
    fn read_bytes(&self, address: usize, size: usize) -> Option<Vec<u8>> {
        self.inner.reads.fetch_add(1, Ordering::SeqCst);

        if !self.is_valid() {
            return None;
        }

        let bytes = self.inner.bytes.read();
        (address..address.checked_add(size)?)
            .map(|a| bytes.get(&a).copied())
            .collect()
    }

    fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::SeqCst)
    }
}

/// Mock process finder for testing
#[derive(Default)]
pub struct MockProcessFinder {
    processes: RwLock<Vec<ProcessInfo>>,
    readers: RwLock<HashMap<u32, MockMemoryReader>>,
}

impl MockProcessFinder {
    /// Create a new mock process finder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mock process with a memory reader
    pub fn add_process(&self, info: ProcessInfo, reader: MockMemoryReader) {
        self.readers.write().insert(info.pid, reader);
        self.processes.write().push(info);
    }

    /// Remove a mock process (the process "exits")
    pub fn remove_process(&self, pid: u32) {
        self.processes.write().retain(|p| p.pid != pid);
        if let Some(reader) = self.readers.write().remove(&pid) {
            reader.invalidate();
        }
    }
}

impl ProcessFinder for MockProcessFinder {
    fn find_process(&self, target_names: &[&str]) -> Option<ProcessInfo> {
        self.processes
            .read()
            .iter()
            .find(|p| target_names.iter().any(|t| super::process::name_matches(&p.name, t)))
            .cloned()
    }

    fn open_process(&self, info: &ProcessInfo) -> Option<Arc<dyn MemoryReader>> {
        self.readers
            .read()
            .get(&info.pid)
            .cloned()
            .map(|r| Arc::new(r) as Arc<dyn MemoryReader>)
    }
}
