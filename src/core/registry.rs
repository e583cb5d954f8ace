//! Entry registry
//!
//! Insertion-ordered list of the entries in the image. Order drives the
//! display order and the per-type order of the sequence index.

use crate::entry::Entry;
use crate::layout::{RECORD_SIZE, TABLE_SIZE};
use serde::{Deserialize, Serialize};

/// Direction for [`EntryRegistry::move_adjacent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

/// Ordered collection of entries with unique file names
#[derive(Debug, Clone, Default)]
pub struct EntryRegistry {
    entries: Vec<Entry>,
}

impl EntryRegistry {
    pub fn new() -> Self {
        EntryRegistry::default()
    }

    /// Largest record count the two-block table can hold
    ///
    /// `count * RECORD_SIZE` must stay below the table size.
    pub const fn max_records() -> usize {
        (TABLE_SIZE - 1) / RECORD_SIZE
    }

    /// True if `count` records fit into one table slot
    pub fn fits(count: usize) -> bool {
        count * RECORD_SIZE < TABLE_SIZE
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.position(file_name).is_some()
    }

    pub fn position(&self, file_name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.file_name() == file_name)
    }

    pub fn get(&self, file_name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.file_name() == file_name)
    }

    pub fn get_mut(&mut self, file_name: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|e| e.file_name() == file_name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Entry] {
        &self.entries
    }

    pub fn file_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.file_name().to_string()).collect()
    }

    /// Append at the end; uniqueness is the caller's check
    pub(crate) fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Remove every entry whose file name is in `file_names`
    ///
    /// Returns the removed entries in registry order.
    pub(crate) fn remove_all<S: AsRef<str>>(&mut self, file_names: &[S]) -> Vec<Entry> {
        let (removed, kept): (Vec<Entry>, Vec<Entry>) =
            std::mem::take(&mut self.entries).into_iter().partition(|e| {
                file_names.iter().any(|n| n.as_ref() == e.file_name())
            });
        self.entries = kept;
        removed
    }

    /// Empty the registry, handing back the entries in order
    pub(crate) fn take_all(&mut self) -> Vec<Entry> {
        std::mem::take(&mut self.entries)
    }

    /// Swap the entry with its neighbour in `direction`
    ///
    /// No-op at either end or for an unknown name. Returns true if the
    /// order changed.
    pub fn move_adjacent(&mut self, file_name: &str, direction: Direction) -> bool {
        let Some(index) = self.position(file_name) else {
            return false;
        };
        match direction {
            Direction::Up if index > 0 => {
                self.entries.swap(index, index - 1);
                true
            }
            Direction::Down if index + 1 < self.entries.len() => {
                self.entries.swap(index, index + 1);
                true
            }
            _ => false,
        }
    }

    /// Table bytes after the private header: records back to back
    pub fn serialized_records(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.entries.len() * RECORD_SIZE);
        for entry in &self.entries {
            bytes.extend_from_slice(entry.record());
        }
        bytes
    }
}

impl<'a> IntoIterator for &'a EntryRegistry {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(names: &[&str]) -> EntryRegistry {
        let mut reg = EntryRegistry::new();
        for name in names {
            reg.push(Entry::new(name, vec![0u8; 16]).unwrap());
        }
        reg
    }

    #[test]
    fn test_capacity_limit() {
        assert_eq!(EntryRegistry::max_records(), 255);
        assert!(EntryRegistry::fits(255));
        assert!(!EntryRegistry::fits(256));
    }

    #[test]
    fn test_move_adjacent() {
        let mut reg = registry(&["A", "B", "C"]);
        assert!(reg.move_adjacent("B", Direction::Up));
        assert_eq!(reg.file_names(), ["B", "A", "C"]);
        assert!(reg.move_adjacent("A", Direction::Down));
        assert_eq!(reg.file_names(), ["B", "C", "A"]);
    }

    #[test]
    fn test_move_at_boundaries_is_noop() {
        let mut reg = registry(&["A", "B"]);
        assert!(!reg.move_adjacent("A", Direction::Up));
        assert!(!reg.move_adjacent("B", Direction::Down));
        assert!(!reg.move_adjacent("Z", Direction::Up));
        assert_eq!(reg.file_names(), ["A", "B"]);
    }

    #[test]
    fn test_remove_all_keeps_order() {
        let mut reg = registry(&["A", "B", "C", "D"]);
        let removed = reg.remove_all(&["D", "B", "X"]);
        let removed: Vec<_> = removed.iter().map(|e| e.file_name()).collect();
        assert_eq!(removed, ["B", "D"]);
        assert_eq!(reg.file_names(), ["A", "C"]);
    }

    #[test]
    fn test_serialized_records() {
        let reg = registry(&["A", "B"]);
        let bytes = reg.serialized_records();
        assert_eq!(bytes.len(), 2 * RECORD_SIZE);
        assert_eq!(bytes[8], b'A');
        assert_eq!(bytes[RECORD_SIZE + 8], b'B');
    }
}
