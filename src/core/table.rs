//! File table slots
//!
//! The system region carries four redundant copies of the file table. Each
//! slot starts with an 8-byte private header followed by 32-byte records.
//! Reads come from one authoritative slot; writes go to every valid slot.

use crate::error::{FirmwareError, Result};
use crate::layout::{
    table_slot_position, EMPTY_BYTE, RECORD_SIZE, TABLE_HEADER_SIZE, TABLE_SIZE, TABLE_SLOT_COUNT,
};
use crate::registry::EntryRegistry;
use tracing::{debug, info};

/// Header byte that must hold [`SIGNATURE`]
const SIGNATURE_OFFSET: usize = 1;
const SIGNATURE: u8 = 0xA5;

/// Header byte that must be `0xFF` in any valid slot
const FILLER_OFFSET: usize = 5;

/// Header byte that is `0xFF` in the primary slot
const PRIMARY_MARKER_OFFSET: usize = 4;
const PRIMARY_MARKER: u8 = 0xFF;

/// One of the four table positions in the system region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSlot {
    /// Slot number, 0..4
    pub index: usize,

    /// Byte offset inside the system region
    pub position: usize,

    /// Header carries the primary marker
    pub primary: bool,
}

impl TableSlot {
    /// Inspect slot `index`; `None` if its header does not validate
    pub fn probe(system: &[u8], index: usize) -> Option<Self> {
        let position = table_slot_position(index);
        if !is_valid_position(system, position) {
            return None;
        }
        Some(TableSlot {
            index,
            position,
            primary: system[position + PRIMARY_MARKER_OFFSET] == PRIMARY_MARKER,
        })
    }

    /// All slots whose header validates, in slot order
    pub fn valid_slots(system: &[u8]) -> Vec<TableSlot> {
        (0..TABLE_SLOT_COUNT)
            .filter_map(|i| Self::probe(system, i))
            .collect()
    }

    /// Choose the authoritative slot
    ///
    /// The last valid slot carrying the primary marker wins. Without one,
    /// the last valid slot is used.
    pub fn locate(system: &[u8]) -> Result<TableSlot> {
        let slots = Self::valid_slots(system);
        let chosen = slots
            .iter()
            .rev()
            .find(|s| s.primary)
            .or_else(|| slots.last())
            .copied()
            .ok_or(FirmwareError::TableNotFound)?;
        info!(
            "File table slot {} at position {} ({})",
            chosen.index,
            chosen.position,
            if chosen.primary { "primary" } else { "fallback" }
        );
        Ok(chosen)
    }

    /// Whole records of this slot, empty ones included
    pub fn records<'a>(&self, system: &'a [u8]) -> impl Iterator<Item = &'a [u8]> {
        let start = (self.position + TABLE_HEADER_SIZE).min(system.len());
        let end = (self.position + TABLE_SIZE).min(system.len());
        system[start..end].chunks_exact(RECORD_SIZE)
    }
}

/// Header check shared by the locator and the rebuilder
pub fn is_valid_position(system: &[u8], position: usize) -> bool {
    let header = match system.get(position..position + TABLE_HEADER_SIZE) {
        Some(h) => h,
        None => return false,
    };
    header[SIGNATURE_OFFSET] == SIGNATURE && header[FILLER_OFFSET] == EMPTY_BYTE
}

/// Serialize the registry into every valid slot
///
/// Records are packed right after the private header and the rest of the
/// slot is filled with `0xFF`. The private headers are left untouched.
/// Returns the number of slots written.
pub fn rebuild(system: &mut [u8], registry: &EntryRegistry) -> Result<usize> {
    let records = registry.serialized_records();
    let body_len = TABLE_SIZE - TABLE_HEADER_SIZE;
    if records.len() > body_len {
        return Err(FirmwareError::TooManyFiles {
            count: registry.len(),
            limit: EntryRegistry::max_records(),
        });
    }

    let mut body = vec![EMPTY_BYTE; body_len];
    body[..records.len()].copy_from_slice(&records);

    let mut written = 0;
    for slot in TableSlot::valid_slots(system) {
        let start = slot.position + TABLE_HEADER_SIZE;
        let end = slot.position + TABLE_SIZE;
        let target = system.get_mut(start..end).ok_or(FirmwareError::Truncated {
            needed: end,
            actual: 0,
        })?;
        target.copy_from_slice(&body);
        debug!("Rewrote file table slot {} at {}", slot.index, slot.position);
        written += 1;
    }

    info!(
        "Rebuilt {} file table slots with {} records",
        written,
        registry.len()
    );
    Ok(written)
}
