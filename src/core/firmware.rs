//! Firmware editing session
//!
//! [`Firmware`] owns the loaded image, the entry registry and the block map
//! and keeps the three consistent across every edit. All operations are
//! synchronous; callers that share a session across threads must serialize
//! access themselves.

use crate::block_map::BlockMap;
use crate::chain;
use crate::config::EditorConfig;
use crate::entry::Entry;
use crate::error::{FirmwareError, Result};
use crate::image::Image;
use crate::io;
use crate::layout::{required_blocks, NO_ADDRESS};
use crate::registry::{Direction, EntryRegistry};
use crate::sequence::{self, SEQUENCE_FILE_NAME};
use crate::series::PedalSeries;
use crate::table::{self, TableSlot};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// One row of the entry listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryInfo {
    pub file_name: String,
    pub name: Option<String>,
    pub type_label: String,
    pub size: usize,
    pub blocks_used: usize,
    pub address: Option<u16>,
}

impl From<&Entry> for EntryInfo {
    fn from(entry: &Entry) -> Self {
        EntryInfo {
            file_name: entry.file_name().to_string(),
            name: entry.name().map(str::to_string),
            type_label: entry.type_label(),
            size: entry.size(),
            blocks_used: entry.blocks_used(),
            address: entry.has_address().then(|| entry.address()),
        }
    }
}

/// An opened firmware image and its editable state
#[derive(Debug, Clone)]
pub struct Firmware {
    image: Image,
    table: TableSlot,
    registry: EntryRegistry,
    blocks: BlockMap,
    config: EditorConfig,
}

impl Firmware {
    /// Open a host file from disk
    pub fn open<P: AsRef<Path>>(path: P, config: EditorConfig) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening firmware file {:?}", path);
        Self::from_bytes(io::read_host(path)?, config)
    }

    /// Load a host file already in memory
    ///
    /// Fails only if the BIN or every file table slot is missing. Entries
    /// with broken chains are logged and left out.
    pub fn from_bytes(host: Vec<u8>, config: EditorConfig) -> Result<Self> {
        let image = Image::load(host)?;
        let table = TableSlot::locate(image.system())?;
        let blocks = BlockMap::new(image.data_block_count());

        let mut firmware = Firmware {
            image,
            table,
            registry: EntryRegistry::new(),
            blocks,
            config,
        };
        firmware.reconstruct();

        info!(
            "Loaded {} entries, {} of {} blocks used",
            firmware.registry.len(),
            firmware.used_blocks(),
            firmware.total_blocks()
        );
        Ok(firmware)
    }

    /// Rebuild the registry and block map from the authoritative table
    fn reconstruct(&mut self) {
        let records: Vec<Entry> = self
            .table
            .records(self.image.system())
            .filter_map(Entry::from_record)
            .collect();

        for mut entry in records {
            let file_name = entry.file_name().to_string();
            if self.config.exclude_sequence_files && sequence::is_reserved(&file_name) {
                debug!("Skipping reserved file {}", file_name);
                continue;
            }
            if self.registry.contains(&file_name) {
                warn!("Duplicate table record for {}, keeping the first", file_name);
                continue;
            }

            match chain::read_chain(
                &self.image,
                &mut self.blocks,
                &file_name,
                entry.address(),
                entry.size(),
            ) {
                Ok(content) => {
                    entry.set_content(content);
                    debug!(
                        "{}: {} bytes in {} blocks from {}",
                        file_name,
                        entry.size(),
                        entry.blocks_used(),
                        entry.address()
                    );
                    self.registry.push(entry);
                }
                Err(e) => {
                    error!("Dropping {}: {}", file_name, e);
                    self.blocks.release_owner(&file_name);
                }
            }
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut EditorConfig {
        &mut self.config
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    /// The slot entries were read from
    pub fn table_slot(&self) -> TableSlot {
        self.table
    }

    pub fn pedal_series(&self) -> Option<PedalSeries> {
        self.image.pedal_series()
    }

    pub fn block_map(&self) -> &BlockMap {
        &self.blocks
    }

    /// Data blocks currently owned by entries
    pub fn used_blocks(&self) -> usize {
        self.blocks.used()
    }

    /// Data blocks available to entries in total
    pub fn total_blocks(&self) -> usize {
        self.image.total_blocks()
    }

    pub fn free_blocks(&self) -> usize {
        self.total_blocks().saturating_sub(self.used_blocks())
    }

    /// First unowned block address
    pub fn free_block_address(&self) -> Option<usize> {
        self.blocks.free_address()
    }

    pub fn entries(&self) -> &[Entry] {
        self.registry.as_slice()
    }

    pub fn entry(&self, file_name: &str) -> Option<&Entry> {
        self.registry.get(file_name)
    }

    pub fn file_names(&self) -> Vec<String> {
        self.registry.file_names()
    }

    pub fn entry_infos(&self) -> Vec<EntryInfo> {
        self.registry.iter().map(EntryInfo::from).collect()
    }

    /// Payload of `file_name`
    pub fn extract(&self, file_name: &str) -> Result<&[u8]> {
        self.registry
            .get(file_name)
            .map(Entry::content)
            .ok_or_else(|| FirmwareError::EntryNotFound(file_name.to_string()))
    }

    /// Write the payload of `file_name` to `path`
    pub fn extract_to<P: AsRef<Path>>(&self, file_name: &str, path: P) -> Result<()> {
        let content = self.extract(file_name)?;
        std::fs::write(path.as_ref(), content)?;
        info!("Extracted {} to {:?}", file_name, path.as_ref());
        Ok(())
    }

    /// Add `entry` at the end of the registry and write its chain
    ///
    /// On any error the session is left exactly as it was. The sequence
    /// index is regenerated afterwards and the file tables are rebuilt when
    /// `rebuild_tables` is set.
    pub fn inject(&mut self, entry: Entry, rebuild_tables: bool) -> Result<()> {
        self.place(entry)?;
        self.refresh_sequence()?;
        if rebuild_tables {
            self.rebuild_tables()?;
        }
        Ok(())
    }

    /// Allocate, write and register one entry
    fn place(&mut self, mut entry: Entry) -> Result<()> {
        let required = entry.blocks_used();
        info!(
            "Injecting file: {} ({} blocks)",
            entry.file_name(),
            required
        );

        let used = self.used_blocks();
        let total = self.total_blocks();
        if used + required > total {
            error!("Injection of {} failed: not enough free blocks", entry.file_name());
            return Err(FirmwareError::NotEnoughFreeBlocks {
                required,
                free: total.saturating_sub(used),
            });
        }

        if self.registry.contains(entry.file_name()) {
            error!("Injection failed: {} is already present", entry.file_name());
            return Err(FirmwareError::AlreadyPresent(entry.file_name().to_string()));
        }

        // Count includes the entry being added
        let count = self.registry.len() + 1;
        if !EntryRegistry::fits(count) {
            error!("Too many files: table will not fit into 2 blocks");
            return Err(FirmwareError::TooManyFiles {
                count,
                limit: EntryRegistry::max_records(),
            });
        }

        if let Some(series) = self.image.pedal_series() {
            remap_type(series, &mut entry);
        }

        let addresses = self
            .blocks
            .free_addresses(required)
            .ok_or(FirmwareError::FreeBlockNotFound)?;
        chain::write_chain(&mut self.image, &addresses, entry.content())?;

        entry.set_address(addresses.first().map_or(NO_ADDRESS, |&a| a as u16));
        for &address in &addresses {
            self.blocks.claim(address, entry.file_name());
        }
        debug!("{} placed at {:?}", entry.file_name(), addresses);
        self.registry.push(entry);
        Ok(())
    }

    /// Drop entries by file name and free their blocks
    ///
    /// Unknown names are ignored. Blocks are released by scanning the whole
    /// map, not by walking the chain. Returns the removed entries.
    pub fn remove<S: AsRef<str>>(&mut self, file_names: &[S]) -> Result<Vec<Entry>> {
        let removed = self.registry.remove_all(file_names);
        for file_name in file_names {
            self.blocks.release_owner(file_name.as_ref());
        }
        info!("Removed {} entries", removed.len());
        self.refresh_sequence()?;
        self.rebuild_tables()?;
        Ok(removed)
    }

    /// Swap `file_name` with its neighbour
    ///
    /// Returns false at either end of the list.
    pub fn move_entry(&mut self, file_name: &str, direction: Direction) -> Result<bool> {
        if !self.registry.contains(file_name) {
            return Err(FirmwareError::EntryNotFound(file_name.to_string()));
        }
        let moved = self.registry.move_adjacent(file_name, direction);
        if moved {
            debug!("Moved {} {:?}", file_name, direction);
            self.refresh_sequence()?;
            self.rebuild_tables()?;
        }
        Ok(moved)
    }

    /// Write the registry into every valid file table slot
    pub fn rebuild_tables(&mut self) -> Result<usize> {
        table::rebuild(self.image.system_mut(), &self.registry)
    }

    /// Regenerate the sequence index in place
    ///
    /// The new content is padded to the entry's current size and written
    /// over its existing chain. Returns false when there is nothing to do:
    /// sequence files are excluded, the index is absent, or the lines no
    /// longer fit (logged as a warning).
    pub fn refresh_sequence(&mut self) -> Result<bool> {
        if self.config.exclude_sequence_files {
            return Ok(false);
        }
        let Some(current) = self.registry.get(SEQUENCE_FILE_NAME) else {
            return Ok(false);
        };

        let size = current.size();
        let address = current.address();
        let content = match sequence::render(self.registry.as_slice(), size) {
            Some(content) => content,
            None => {
                warn!(
                    "{} does not fit its {} bytes, leaving it unchanged",
                    SEQUENCE_FILE_NAME, size
                );
                return Ok(false);
            }
        };
        if content == current.content() {
            return Ok(false);
        }

        let addresses = chain::chain_addresses(&self.image, address, required_blocks(size))?;
        chain::write_chain(&mut self.image, &addresses, &content)?;
        if let Some(entry) = self.registry.get_mut(SEQUENCE_FILE_NAME) {
            entry.set_content(content);
        }
        debug!("Regenerated {}", SEQUENCE_FILE_NAME);
        Ok(true)
    }

    /// Re-lay all chains contiguously from block 1 in registry order
    ///
    /// If any entry cannot be placed again the session is restored to its
    /// layout before the call.
    pub fn defragment(&mut self) -> Result<()> {
        info!("Firmware defragmentation...");
        let image = self.image.clone();
        let blocks = self.blocks.clone();
        let registry = self.registry.clone();

        let entries = self.registry.take_all();
        self.image.clear_data();
        self.blocks.clear();
        if let Err(e) = entries.into_iter().try_for_each(|entry| self.place(entry)) {
            error!("Defragmentation failed, previous layout restored: {}", e);
            self.image = image;
            self.blocks = blocks;
            self.registry = registry;
            return Err(e);
        }
        self.refresh_sequence()?;
        self.rebuild_tables()?;
        Ok(())
    }

    /// Host file bytes with the edited regions spliced in
    pub fn to_host_bytes(&self) -> Vec<u8> {
        self.image.to_host_bytes()
    }

    /// Finalize and write the whole host file to `path`
    ///
    /// Defragments first when configured, otherwise only rebuilds the
    /// tables. A failed write leaves the file at `path` untouched and keeps
    /// the in-memory edits.
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        info!("Saving modified firmware file: {:?}", path);
        if self.config.enable_defragmentation {
            self.defragment()?;
        } else {
            self.rebuild_tables()?;
        }
        io::write_host(path, &self.to_host_bytes())?;
        info!("Saved {:?}", path);
        Ok(())
    }
}

/// Legacy bass drive types for series that only know the older ones
///
/// Only effect payloads carry a meaningful type byte.
fn remap_type(series: PedalSeries, entry: &mut Entry) {
    if !entry.file_name().to_ascii_uppercase().ends_with(".ZDL") {
        return;
    }
    if let Some(new_type) = entry.type_byte().and_then(|t| series.type_remap(t)) {
        debug!(
            "{}: type {:02x} -> {:02x} for {}",
            entry.file_name(),
            entry.type_byte().unwrap_or_default(),
            new_type,
            series
        );
        entry.set_type_byte(new_type);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{
        table_slot_position, BIN_BLOCK_COUNT_OFFSET, BIN_MAGIC, BLOCK_SIZE, EMPTY_BYTE,
        USABLE_BLOCK_SIZE,
    };

    /// Bare BIN with one valid primary table slot and no records
    fn empty_host(block_count: u16) -> Vec<u8> {
        let mut host = vec![EMPTY_BYTE; usize::from(block_count) * BLOCK_SIZE];
        host[..BIN_MAGIC.len()].copy_from_slice(&BIN_MAGIC);
        host[BIN_BLOCK_COUNT_OFFSET..BIN_BLOCK_COUNT_OFFSET + 2]
            .copy_from_slice(&block_count.to_le_bytes());
        let slot = table_slot_position(0);
        host[slot + 1] = 0xA5;
        host
    }

    #[test]
    fn test_empty_host_loads() {
        let firmware = Firmware::from_bytes(empty_host(16), EditorConfig::default()).unwrap();
        assert!(firmware.entries().is_empty());
        assert_eq!(firmware.total_blocks(), 5);
        assert!(firmware.table_slot().primary);
    }

    #[test]
    fn test_failed_defragment_restores_layout() {
        let mut firmware = Firmware::from_bytes(empty_host(16), EditorConfig::default()).unwrap();
        firmware
            .inject(Entry::new("A.RAW", vec![1u8; 100]).unwrap(), true)
            .unwrap();
        firmware
            .inject(Entry::new("B.RAW", vec![2u8; 100]).unwrap(), true)
            .unwrap();
        // Registered without blocks, so it cannot be placed again
        firmware
            .registry
            .push(Entry::new("BIG.RAW", vec![3u8; 5 * USABLE_BLOCK_SIZE]).unwrap());

        let host = firmware.to_host_bytes();
        let blocks = firmware.block_map().clone();
        let err = firmware.defragment().unwrap_err();
        assert!(matches!(err, FirmwareError::NotEnoughFreeBlocks { .. }));

        assert_eq!(firmware.file_names(), ["A.RAW", "B.RAW", "BIG.RAW"]);
        assert_eq!(firmware.block_map(), &blocks);
        assert_eq!(firmware.to_host_bytes(), host);
        assert_eq!(firmware.extract("A.RAW").unwrap(), vec![1u8; 100].as_slice());
    }
}
