//! Pointer chain resolution
//!
//! A `Pointer` is a base address plus a list of offsets. When resolving, each
//! offset EXCEPT the last is dereferenced; the last offset is just added to
//! get the final address of the field.

use super::{read_value, MemoryReader, Readable};

/// A pointer with offset chain for resolving nested memory addresses
///
/// - All offsets EXCEPT the last are dereferenced (follow the pointer)
/// - The last offset is just added to the current address
/// - A pointer with no offsets resolves to its base
#[derive(Debug, Clone, PartialEq)]
pub struct Pointer {
    /// Base address (absolute)
    pub base: i64,
    /// Chain of offsets to follow
    pub offsets: Vec<i64>,
    /// Whether this is a 64-bit process (affects pointer size when dereferencing)
    pub is_64_bit: bool,
}

impl Default for Pointer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pointer {
    /// Create a new uninitialized pointer
    pub fn new() -> Self {
        Self {
            base: 0,
            offsets: Vec::new(),
            is_64_bit: true,
        }
    }

    /// Create a pointer with specific values
    pub fn with_values(base: i64, offsets: Vec<i64>, is_64_bit: bool) -> Self {
        Self { base, offsets, is_64_bit }
    }

    /// Pointer to an absolute address, no dereferencing
    pub fn absolute(address: usize) -> Self {
        Self::with_values(address as i64, Vec::new(), true)
    }

    /// Append offsets to create a new pointer
    pub fn append(&self, offsets: &[i64]) -> Self {
        let mut copy = self.clone();
        copy.offsets.extend_from_slice(offsets);
        copy
    }

    /// Whether the pointer was never initialized
    pub fn is_unset(&self) -> bool {
        self.base == 0
    }

    /// Resolve the pointer chain to the final field address
    ///
    /// Returns `None` if any intermediate read fails or yields null.
    pub fn resolve(&self, reader: &dyn MemoryReader) -> Option<usize> {
        if self.base == 0 {
            return None;
        }

        let mut ptr = self.base;
        for (i, &offset) in self.offsets.iter().enumerate() {
            let address = ptr.checked_add(offset)?;

            if i + 1 < self.offsets.len() {
                ptr = if self.is_64_bit {
                    reader.read_i64(address as usize)?
                } else {
                    reader.read_i32(address as usize)? as u32 as i64
                };

                if ptr == 0 {
                    return None;
                }
            } else {
                ptr = address;
            }
        }

        Some(ptr as usize)
    }

    /// Read a typed value at the end of the chain
    pub fn read<T: Readable>(&self, reader: &dyn MemoryReader) -> Option<T> {
        let address = self.resolve(reader)?;
        read_value(reader, address)
    }

    /// Read a managed string whose object reference is stored at the end of the chain
    pub fn read_string(&self, reader: &dyn MemoryReader) -> Option<String> {
        let address = self.resolve(reader)?;
        let object = reader.read_ptr(address)?;
        reader.read_managed_string(object)
    }

    /// Check if the pointer resolves to null
    pub fn is_null_ptr(&self, reader: &dyn MemoryReader) -> bool {
        self.resolve(reader).is_none()
    }
}
