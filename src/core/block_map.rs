//! Block allocation map
//!
//! One slot per data-region address holding the file name of the entry
//! whose chain owns it. Address 0 is the aliased half of the last file
//! table and is never handed out.

use crate::layout::RESERVED_ADDRESS;
use tracing::debug;

/// Owner label of the reserved block
pub const RESERVED_OWNER: &str = "RESERVED (part of file table)";

/// Ownership map of the data region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMap {
    /// Owning file name per address, `None` = free
    owners: Vec<Option<String>>,
}

impl BlockMap {
    /// Create a map for `len` data addresses with only block 0 reserved
    pub fn new(len: usize) -> Self {
        let mut owners = vec![None; len];
        if let Some(slot) = owners.get_mut(RESERVED_ADDRESS) {
            *slot = Some(RESERVED_OWNER.to_string());
        }
        BlockMap { owners }
    }

    /// Number of addresses, reserved block included
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Addresses usable for payload
    pub fn capacity(&self) -> usize {
        self.owners.len().saturating_sub(1)
    }

    /// Owned addresses, not counting the reserved block
    pub fn used(&self) -> usize {
        self.owners
            .iter()
            .enumerate()
            .filter(|(addr, owner)| *addr != RESERVED_ADDRESS && owner.is_some())
            .count()
    }

    pub fn free(&self) -> usize {
        self.capacity().saturating_sub(self.used())
    }

    /// Owner of `address`, if any
    pub fn owner(&self, address: usize) -> Option<&str> {
        self.owners.get(address).and_then(|o| o.as_deref())
    }

    pub fn is_free(&self, address: usize) -> bool {
        address != RESERVED_ADDRESS && matches!(self.owners.get(address), Some(None))
    }

    /// Mark `address` as owned by `file_name`
    ///
    /// Returns `false` if the address is out of range or reserved.
    pub fn claim(&mut self, address: usize, file_name: &str) -> bool {
        if address == RESERVED_ADDRESS {
            return false;
        }
        match self.owners.get_mut(address) {
            Some(slot) => {
                *slot = Some(file_name.to_string());
                true
            }
            None => false,
        }
    }

    /// Mark `address` as free
    pub fn release(&mut self, address: usize) {
        if address == RESERVED_ADDRESS {
            return;
        }
        if let Some(slot) = self.owners.get_mut(address) {
            *slot = None;
        }
    }

    /// Free every address owned by `file_name`
    ///
    /// Scans the whole map rather than walking a chain, so stale claims
    /// left behind by a corrupt chain are released too. Returns the number
    /// of addresses freed.
    pub fn release_owner(&mut self, file_name: &str) -> usize {
        let mut freed = 0;
        for slot in self.owners.iter_mut().skip(RESERVED_ADDRESS + 1) {
            if slot.as_deref() == Some(file_name) {
                *slot = None;
                freed += 1;
            }
        }
        debug!("Released {} blocks of {}", freed, file_name);
        freed
    }

    /// Free everything except the reserved block
    pub fn clear(&mut self) {
        for slot in self.owners.iter_mut().skip(RESERVED_ADDRESS + 1) {
            *slot = None;
        }
    }

    /// First free address, scanning upward from 1
    pub fn free_address(&self) -> Option<usize> {
        self.owners
            .iter()
            .enumerate()
            .skip(RESERVED_ADDRESS + 1)
            .find(|(_, owner)| owner.is_none())
            .map(|(addr, _)| addr)
    }

    /// First `count` free addresses in ascending order, without claiming them
    ///
    /// Returns `None` if fewer than `count` are free.
    pub fn free_addresses(&self, count: usize) -> Option<Vec<usize>> {
        let found: Vec<usize> = self
            .owners
            .iter()
            .enumerate()
            .skip(RESERVED_ADDRESS + 1)
            .filter(|(_, owner)| owner.is_none())
            .map(|(addr, _)| addr)
            .take(count)
            .collect();
        (found.len() == count).then_some(found)
    }

    /// Addresses owned by `file_name`, ascending
    pub fn addresses_of(&self, file_name: &str) -> Vec<usize> {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, owner)| owner.as_deref() == Some(file_name))
            .map(|(addr, _)| addr)
            .collect()
    }

    /// `(address, owner)` pairs, for diagnostics
    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<&str>)> {
        self.owners
            .iter()
            .enumerate()
            .map(|(addr, owner)| (addr, owner.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_reserves_block_zero() {
        let map = BlockMap::new(101);
        assert_eq!(map.len(), 101);
        assert_eq!(map.capacity(), 100);
        assert_eq!(map.used(), 0);
        assert_eq!(map.owner(0), Some(RESERVED_OWNER));
        assert!(!map.is_free(0));
    }

    #[test]
    fn test_first_fit() {
        let mut map = BlockMap::new(10);
        assert_eq!(map.free_address(), Some(1));
        map.claim(1, "A.ZDL");
        map.claim(2, "A.ZDL");
        map.claim(4, "B.ZDL");
        assert_eq!(map.free_address(), Some(3));
        assert_eq!(map.free_addresses(3), Some(vec![3, 5, 6]));
        assert_eq!(map.free_addresses(7), None);
    }

    #[test]
    fn test_full_map() {
        let mut map = BlockMap::new(3);
        map.claim(1, "A");
        map.claim(2, "A");
        assert_eq!(map.free_address(), None);
        assert_eq!(map.free(), 0);
    }

    #[test]
    fn test_claim_rejects_reserved_and_out_of_range() {
        let mut map = BlockMap::new(4);
        assert!(!map.claim(0, "A"));
        assert!(!map.claim(4, "A"));
        assert_eq!(map.owner(0), Some(RESERVED_OWNER));
        map.release(0);
        assert_eq!(map.owner(0), Some(RESERVED_OWNER));
    }

    #[test]
    fn test_release_owner_scans_everything() {
        let mut map = BlockMap::new(10);
        for addr in [2, 5, 9] {
            map.claim(addr, "A.ZDL");
        }
        map.claim(3, "B.ZDL");
        assert_eq!(map.release_owner("A.ZDL"), 3);
        assert_eq!(map.used(), 1);
        assert_eq!(map.addresses_of("B.ZDL"), vec![3]);
    }

    #[test]
    fn test_clear_keeps_reserved() {
        let mut map = BlockMap::new(5);
        map.claim(1, "A");
        map.claim(4, "B");
        map.clear();
        assert_eq!(map.used(), 0);
        assert_eq!(map.owner(0), Some(RESERVED_OWNER));
    }
}
