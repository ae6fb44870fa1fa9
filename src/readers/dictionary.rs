//! Change tracking for remote key/value tables
//!
//! The game keeps its progression flags in managed `Dictionary<string, T>`
//! objects. Every mutation bumps the dictionary's `version` field, so a
//! local mirror only has to rescan the backing entry array when that
//! counter moves.
//!
//! Layout of the dictionary object (64-bit Mono):
//!
//! ```text
//! +0x18  entries    -> Entry[] (array header 0x20, stride 0x18)
//! +0x40  count      i32
//! +0x44  version    i32
//!
//! Entry:
//! +0x08  key        -> managed string
//! +0x10  value      T
//! ```

use std::collections::HashMap;
use std::fmt;

use crate::memory::{read_value, MemoryReader, Readable};

/// Entry counts above this are treated as a torn or garbage read
pub const MAX_TABLE_ENTRIES: i32 = 1 << 16;

/// Field offsets of a managed dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictionaryLayout {
    pub entries_offset: usize,
    pub count_offset: usize,
    pub version_offset: usize,
    /// Offset of element 0 inside the entries array object
    pub array_data_offset: usize,
    pub entry_size: usize,
    pub key_offset: usize,
    pub value_offset: usize,
}

impl Default for DictionaryLayout {
    fn default() -> Self {
        Self {
            entries_offset: 0x18,
            count_offset: 0x40,
            version_offset: 0x44,
            array_data_offset: 0x20,
            entry_size: 0x18,
            key_offset: 0x08,
            value_offset: 0x10,
        }
    }
}

/// How an observed entry differs from the local mirror
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableChange {
    Added,
    Changed,
}

/// Local mirror of a remote dictionary that reports new and changed entries
///
/// Keys accumulate until [`clear`](Self::clear). A key that is already cached
/// with the same value is never reported again, even if the remote table
/// dropped and re-inserted it.
#[derive(Debug, Clone)]
pub struct ChangeTrackingTable<V> {
    cache: HashMap<String, V>,
    version: i32,
    layout: DictionaryLayout,
}

impl<V> Default for ChangeTrackingTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ChangeTrackingTable<V> {
    /// Create an empty table with the default Mono layout
    pub fn new() -> Self {
        Self::with_layout(DictionaryLayout::default())
    }

    /// Create an empty table with a custom layout
    pub fn with_layout(layout: DictionaryLayout) -> Self {
        Self {
            cache: HashMap::new(),
            version: 0,
            layout,
        }
    }

    /// Forget every cached key and the last seen version
    pub fn clear(&mut self) {
        self.cache.clear();
        self.version = 0;
    }

    /// Last fully scanned version
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Number of cached keys
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Cached value for `key`
    pub fn get(&self, key: &str) -> Option<&V> {
        self.cache.get(key)
    }
}

impl<V: Readable + Clone + PartialEq + fmt::Debug> ChangeTrackingTable<V> {
    /// Merge one entry into the mirror and report how it differs
    pub fn observe(&mut self, key: &str, value: V) -> Option<TableChange> {
        match self.cache.get_mut(key) {
            None => {
                log::debug!("Table add {}: {:?}", key, value);
                self.cache.insert(key.to_string(), value);
                Some(TableChange::Added)
            }
            Some(cached) if *cached != value => {
                log::debug!("Table change {}: {:?} -> {:?}", key, cached, value);
                *cached = value;
                Some(TableChange::Changed)
            }
            Some(_) => None,
        }
    }

    /// Diff the remote table at `table` against the mirror
    ///
    /// Returns an iterator over new or changed `(key, value)` pairs in
    /// backing-array order. When the remote version equals the last committed
    /// one, only the version is read. Otherwise every entry is read up front:
    /// if any read fails the result is empty and both the version and the cache
    /// are left as they were, so the next poll retries. A successful scan
    /// commits the version immediately and merges entries into the cache as the
    /// iterator visits them. Entries left unvisited stay uncached and show up
    /// again after the next version bump.
    pub fn poll<'a>(&'a mut self, reader: &dyn MemoryReader, table: usize) -> TableChanges<'a, V> {
        let entries = self.scan(reader, table).unwrap_or_default();
        TableChanges {
            table: self,
            entries: entries.into_iter(),
        }
    }

    /// Read the remote table when its version moved, committing the version
    fn scan(&mut self, reader: &dyn MemoryReader, table: usize) -> Option<Vec<(String, V)>> {
        if table == 0 {
            return None;
        }

        let layout = self.layout;
        let version = reader.read_i32(table + layout.version_offset)?;
        if version == self.version {
            return None;
        }

        let count = reader.read_i32(table + layout.count_offset);
        let entries = reader.read_ptr(table + layout.entries_offset);
        let scanned = match (entries, count) {
            (Some(_), Some(0)) => Some(Vec::new()),
            (Some(entries), Some(count)) if entries != 0 && (0..=MAX_TABLE_ENTRIES).contains(&count) => {
                (0..count as usize)
                    .filter_map(|index| match read_entry::<V>(reader, &layout, entries, index) {
                        EntryRead::Entry(key, value) => Some(Some((key, value))),
                        EntryRead::Empty => None,
                        EntryRead::Failed => Some(None),
                    })
                    .collect::<Option<Vec<_>>>()
            }
            _ => None,
        };

        match scanned {
            Some(entries) => {
                self.version = version;
                Some(entries)
            }
            None => {
                log::debug!("Unreadable table at 0x{:X}, retrying next poll", table);
                None
            }
        }
    }
}

enum EntryRead<V> {
    Entry(String, V),
    Empty,
    Failed,
}

fn read_entry<V: Readable>(
    reader: &dyn MemoryReader,
    layout: &DictionaryLayout,
    entries: usize,
    index: usize,
) -> EntryRead<V> {
    let entry = entries + layout.array_data_offset + layout.entry_size * index;

    let Some(key_object) = reader.read_ptr(entry + layout.key_offset) else {
        return EntryRead::Failed;
    };
    if key_object == 0 {
        return EntryRead::Empty;
    }

    let key = reader.read_managed_string(key_object);
    let value = read_value::<V>(reader, entry + layout.value_offset);
    match (key, value) {
        (Some(key), Some(value)) => EntryRead::Entry(key, value),
        _ => EntryRead::Failed,
    }
}

/// Diff produced by [`ChangeTrackingTable::poll`]
pub struct TableChanges<'a, V> {
    table: &'a mut ChangeTrackingTable<V>,
    entries: std::vec::IntoIter<(String, V)>,
}

impl<V: Readable + Clone + PartialEq + fmt::Debug> Iterator for TableChanges<'_, V> {
    type Item = (String, V);

    fn next(&mut self) -> Option<Self::Item> {
        for (key, value) in self.entries.by_ref() {
            if self.table.observe(&key, value.clone()).is_some() {
                return Some((key, value));
            }
        }
        None
    }
}
