//! Pattern scanning utilities for memory signature matching

/// Parse a pattern string into bytes with wildcards
///
/// Pattern format: "48 8B 05 ?? ?? ?? ?? 48 85 C0"
/// - Regular bytes are hex values (e.g., "48", "8B")
/// - Wildcards are "??" or "?" for any byte
///
/// Returns `None` if any token is neither a hex byte nor a wildcard.
pub fn parse_pattern(pattern: &str) -> Option<Vec<Option<u8>>> {
    pattern
        .split_whitespace()
        .map(|s| {
            if s == "??" || s == "?" {
                Some(None)
            } else {
                u8::from_str_radix(s, 16).ok().map(Some)
            }
        })
        .collect()
}

/// Scan memory for a pattern
///
/// Returns the address of the first match, or None if not found
pub fn scan_pattern(
    reader: &dyn super::MemoryReader,
    base: usize,
    size: usize,
    pattern: &[Option<u8>],
) -> Option<usize> {
    if pattern.is_empty() || pattern.len() > size {
        return None;
    }

    let data = reader.read_bytes(base, size)?;

    data.windows(pattern.len())
        .position(|window| {
            window
                .iter()
                .zip(pattern)
                .all(|(byte, expected)| expected.map_or(true, |e| e == *byte))
        })
        .map(|i| base + i)
}

/// Extract a relative address from a pattern match
///
/// Many patterns contain RIP-relative addresses. This reads the i32 displacement
/// and returns `instruction_address + instruction_length + displacement`.
pub fn extract_relative_address(
    reader: &dyn super::MemoryReader,
    instruction_address: usize,
    offset_position: usize,
    instruction_length: usize,
) -> Option<usize> {
    let relative_offset = reader.read_i32(instruction_address + offset_position)?;

    let absolute = (instruction_address as i64) + (instruction_length as i64) + (relative_offset as i64);
    Some(absolute as usize)
}
